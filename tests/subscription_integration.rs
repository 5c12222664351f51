// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriber sessions served over an in-memory connection.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use blhub::error::TransportError;
use blhub::manager::{HubConfig, ReconciliationEngine};
use blhub::subscription::{SERVER_NAME, SubscriberConnection, serve};
use common::{FakeNetwork, FakePlug, addr};
use serde_json::Value;
use tokio::sync::mpsc;

struct ChannelConnection {
    incoming: mpsc::UnboundedReceiver<String>,
    outgoing: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

impl SubscriberConnection for ChannelConnection {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.outgoing.send(text).map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<String> {
        self.incoming.recv().await
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct Client {
    to_server: mpsc::UnboundedSender<String>,
    from_server: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

impl Client {
    fn say(&self, text: &str) {
        self.to_server.send(text.to_string()).unwrap();
    }

    async fn next(&mut self) -> Value {
        let text = tokio::time::timeout(Duration::from_secs(5), self.from_server.recv())
            .await
            .expect("message in time")
            .expect("connection open");
        serde_json::from_str(&text).unwrap()
    }

    fn nothing_pending(&mut self) -> bool {
        self.from_server.try_recv().is_err()
    }
}

fn connect() -> (ChannelConnection, Client) {
    let (to_server, incoming) = mpsc::unbounded_channel();
    let (outgoing, from_server) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));
    (
        ChannelConnection {
            incoming,
            outgoing,
            closed: Arc::clone(&closed),
        },
        Client {
            to_server,
            from_server,
            closed,
        },
    )
}

async fn hub_with_one_plug() -> ReconciliationEngine<FakeNetwork> {
    let network = FakeNetwork::new().with_plug(FakePlug::new("x", addr(10), "sp3s").powered(true, 250));
    let engine = ReconciliationEngine::new(
        HubConfig::new().with_name("house").with_address(addr(10)),
        network,
    )
    .unwrap();
    engine.run_cycle().await;
    engine
}

#[tokio::test(start_paused = true)]
async fn greeting_lists_live_devices() {
    let engine = hub_with_one_plug().await;
    let (connection, mut client) = connect();
    let server = tokio::spawn({
        let engine = engine.clone();
        async move { serve(&engine, connection).await }
    });

    let hello = client.next().await;
    assert_eq!(hello["status"], "hello");
    assert_eq!(hello["name"], "house");
    assert_eq!(hello["serverName"], SERVER_NAME);
    assert!(hello["now"].is_i64());

    let reachable = client.next().await;
    assert_eq!(reachable["status"], "reachable");
    assert_eq!(reachable["device"]["uid"], "x");
    assert_eq!(reachable["device"]["devClass"], "sp3s");
    assert_eq!(reachable["device"]["udata"]["energy"], 2.5);

    client.say(r#"{"command":"disconnect"}"#);
    assert_eq!(client.next().await["status"], "disconnect");
    server.await.unwrap().unwrap();
    assert!(client.closed.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn commands_are_answered() {
    let engine = hub_with_one_plug().await;
    let (connection, mut client) = connect();
    let server = tokio::spawn({
        let engine = engine.clone();
        async move { serve(&engine, connection).await }
    });
    client.next().await;
    client.next().await;

    client.say(r#"{"command":"ping"}"#);
    assert_eq!(client.next().await["status"], "pong");

    client.say(r#"{"command":"status"}"#);
    let replay = client.next().await;
    assert_eq!(replay["status"], "reachable");
    assert_eq!(replay["device"]["uid"], "x");

    client.say(r#"{"status":"pong"}"#);
    client.say(r#"{"command":"reboot"}"#);
    let error = client.next().await;
    assert_eq!(error["status"], "error");
    assert_eq!(error["message"], "Unknown command");

    client.say("not json");
    let error = client.next().await;
    assert_eq!(error["message"], "Malformed message");

    drop(client.to_server);
    server.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn malformed_handshake_closes_the_connection() {
    let engine = hub_with_one_plug().await;
    let (connection, mut client) = connect();
    let server = tokio::spawn({
        let engine = engine.clone();
        async move { serve(&engine, connection).await }
    });
    client.next().await;
    client.next().await;

    client.say(r#"{"command":"ping","status":"ok"}"#);
    server.await.unwrap().unwrap();

    assert!(client.closed.load(Ordering::SeqCst));
    assert!(client.nothing_pending());
}

#[tokio::test(start_paused = true)]
async fn notifications_are_forwarded() {
    let engine = hub_with_one_plug().await;
    let (connection, mut client) = connect();
    let server = tokio::spawn({
        let engine = engine.clone();
        async move { serve(&engine, connection).await }
    });
    client.next().await;
    client.next().await;

    engine
        .switch_power(&blhub::Uid::from("x"), false)
        .await
        .unwrap();

    let update = client.next().await;
    assert_eq!(update["status"], "update");
    assert_eq!(update["device"]["uid"], "x");
    assert_eq!(update["device"]["udata"]["power"], false);
    assert!(update["device"]["udata"]["lastSeen"].is_i64());

    client.say(r#"{"command":"disconnect"}"#);
    assert_eq!(client.next().await["status"], "disconnect");
    server.await.unwrap().unwrap();
}

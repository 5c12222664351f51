// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriber sessions.

use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::RecvError;

use crate::device::PublicDevice;
use crate::error::TransportError;
use crate::manager::ReconciliationEngine;
use crate::protocol::Transport;

use super::message::{ClientCommand, ClientFrame, ServerMessage};
use super::session_id::SessionId;

/// Error text for an unrecognized command.
pub const UNKNOWN_COMMAND: &str = "Unknown command";

/// Error text for a frame that is not a valid client message.
pub const MALFORMED_MESSAGE: &str = "Malformed message";

/// A persistent, message-oriented connection to one subscriber.
///
/// Implemented by the host for its transport (a WebSocket, for instance).
pub trait SubscriberConnection: Send {
    /// Sends one text frame.
    fn send(&mut self, text: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next text frame, or `None` once the peer has closed.
    fn recv(&mut self) -> impl Future<Output = Option<String>> + Send;

    /// Closes the connection.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// What the pump must do after a client frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Send a message.
    Send(ServerMessage),
    /// Close the connection.
    Close,
}

/// Protocol state of one subscriber, independent of any transport.
///
/// # Examples
///
/// ```
/// use blhub::subscription::{Reply, ServerMessage, Session};
///
/// let mut session = Session::new("hall");
/// let greeting = session.open(chrono::Utc::now(), Vec::new());
/// assert!(matches!(greeting[0], ServerMessage::Hello { .. }));
///
/// let replies = session.handle_frame(chrono::Utc::now(), r#"{"command":"ping"}"#, Vec::new);
/// assert!(matches!(replies[..], [Reply::Send(ServerMessage::Pong { .. })]));
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    name: String,
    frames: u64,
}

impl Session {
    /// Creates a session for a hub named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            name: name.into(),
            frames: 0,
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the greeting: `hello`, then one `reachable` per live device.
    #[must_use]
    pub fn open(&self, now: DateTime<Utc>, devices: Vec<PublicDevice>) -> Vec<ServerMessage> {
        std::iter::once(ServerMessage::hello(now, self.name.clone()))
            .chain(reachable_all(now, devices))
            .collect()
    }

    /// Handles one client frame.
    ///
    /// `devices` is only called for a `status` command. A malformed first
    /// frame closes the session; later ones are answered with an error.
    pub fn handle_frame<F>(&mut self, now: DateTime<Utc>, text: &str, devices: F) -> Vec<Reply>
    where
        F: FnOnce() -> Vec<PublicDevice>,
    {
        self.frames += 1;
        match ClientFrame::parse(text) {
            ClientFrame::Echo => Vec::new(),
            ClientFrame::Malformed if self.frames == 1 => {
                tracing::debug!(session = %self.id, "Malformed handshake frame");
                vec![Reply::Close]
            }
            ClientFrame::Malformed => {
                vec![Reply::Send(ServerMessage::error(now, MALFORMED_MESSAGE))]
            }
            ClientFrame::Command(ClientCommand::Ping) => {
                vec![Reply::Send(ServerMessage::pong(now))]
            }
            ClientFrame::Command(ClientCommand::Status) => {
                reachable_all(now, devices()).map(Reply::Send).collect()
            }
            ClientFrame::Command(ClientCommand::Disconnect) => {
                vec![Reply::Send(ServerMessage::disconnect(now)), Reply::Close]
            }
            ClientFrame::Command(ClientCommand::Unknown(command)) => {
                tracing::debug!(session = %self.id, command = %command, "Unknown command");
                vec![Reply::Send(ServerMessage::error(now, UNKNOWN_COMMAND))]
            }
        }
    }
}

fn reachable_all(
    now: DateTime<Utc>,
    devices: Vec<PublicDevice>,
) -> impl Iterator<Item = ServerMessage> {
    devices
        .into_iter()
        .map(move |device| ServerMessage::reachable(now, device))
}

/// Serves one subscriber until either side closes.
///
/// Sends the greeting, then forwards every notification of `engine` while
/// answering client frames. A subscriber that falls behind skips the lost
/// notifications and continues.
///
/// # Errors
///
/// Returns the connection error if a send fails.
pub async fn serve<T, C>(engine: &ReconciliationEngine<T>, mut connection: C) -> Result<(), TransportError>
where
    T: Transport,
    C: SubscriberConnection,
{
    // subscribe before the greeting so nothing falls in between
    let mut events = engine.subscribe();
    let mut session = Session::new(engine.name());
    tracing::debug!(session = %session.id(), "Subscriber connected");

    for message in session.open(Utc::now(), engine.devices()) {
        send(&mut connection, &message).await?;
    }

    loop {
        tokio::select! {
            frame = connection.recv() => {
                let Some(text) = frame else {
                    break;
                };
                for reply in session.handle_frame(Utc::now(), &text, || engine.devices()) {
                    match reply {
                        Reply::Send(message) => send(&mut connection, &message).await?,
                        Reply::Close => {
                            connection.close().await;
                            tracing::debug!(session = %session.id(), "Subscriber session closed");
                            return Ok(());
                        }
                    }
                }
            }
            event = events.recv() => match event {
                Ok(notification) => {
                    send(&mut connection, &ServerMessage::from(notification)).await?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(session = %session.id(), skipped, "Subscriber lagging, events dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    tracing::debug!(session = %session.id(), "Subscriber disconnected");
    Ok(())
}

async fn send<C: SubscriberConnection>(
    connection: &mut C,
    message: &ServerMessage,
) -> Result<(), TransportError> {
    let text = message
        .to_json()
        .map_err(|e| TransportError::Malformed(e.to_string()))?;
    connection.send(text).await
}

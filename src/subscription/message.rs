// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriber wire messages.
//!
//! Server messages are JSON objects tagged by `status` and stamped with
//! `now` (epoch milliseconds). Client frames carry a `command`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::device::PublicDevice;
use crate::event::{DeviceEvent, Notification};
use crate::state::DataDelta;
use crate::types::Uid;

/// Server name reported in `hello`.
pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");

/// Server version reported in `hello`.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A server to client message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// First message of every session.
    Hello {
        /// Send time.
        #[serde(with = "chrono::serde::ts_milliseconds")]
        now: DateTime<Utc>,
        /// Controller name from the hub configuration.
        name: String,
        /// Server software name.
        server_name: &'static str,
        /// Server software version.
        server_version: &'static str,
    },
    /// A device is live.
    Reachable {
        /// Send time.
        #[serde(with = "chrono::serde::ts_milliseconds")]
        now: DateTime<Utc>,
        /// Full exported record.
        device: PublicDevice,
    },
    /// A device went away.
    Unreachable {
        /// Send time.
        #[serde(with = "chrono::serde::ts_milliseconds")]
        now: DateTime<Utc>,
        /// The device.
        device: DeviceRef,
    },
    /// A live device changed.
    Update {
        /// Send time.
        #[serde(with = "chrono::serde::ts_milliseconds")]
        now: DateTime<Utc>,
        /// The device and its partial `udata`.
        device: DeviceUpdate,
    },
    /// Answer to `ping`.
    Pong {
        /// Send time.
        #[serde(with = "chrono::serde::ts_milliseconds")]
        now: DateTime<Utc>,
    },
    /// A client frame was rejected.
    Error {
        /// Send time.
        #[serde(with = "chrono::serde::ts_milliseconds")]
        now: DateTime<Utc>,
        /// Human-readable reason.
        message: String,
    },
    /// The server is about to close the session.
    Disconnect {
        /// Send time.
        #[serde(with = "chrono::serde::ts_milliseconds")]
        now: DateTime<Utc>,
    },
}

/// `device` body of an `unreachable` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRef {
    /// The device.
    pub uid: Uid,
}

/// `device` body of an `update` message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceUpdate {
    /// The device.
    pub uid: Uid,
    /// `lastSeen` plus the fields that changed.
    pub udata: DataDelta,
}

impl ServerMessage {
    /// Creates the `hello` greeting for a hub named `name`.
    #[must_use]
    pub fn hello(now: DateTime<Utc>, name: impl Into<String>) -> Self {
        Self::Hello {
            now,
            name: name.into(),
            server_name: SERVER_NAME,
            server_version: SERVER_VERSION,
        }
    }

    /// Creates a `reachable` message.
    #[must_use]
    pub fn reachable(now: DateTime<Utc>, device: PublicDevice) -> Self {
        Self::Reachable { now, device }
    }

    /// Creates a `pong`.
    #[must_use]
    pub fn pong(now: DateTime<Utc>) -> Self {
        Self::Pong { now }
    }

    /// Creates an `error` message.
    #[must_use]
    pub fn error(now: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self::Error {
            now,
            message: message.into(),
        }
    }

    /// Creates a `disconnect` message.
    #[must_use]
    pub fn disconnect(now: DateTime<Utc>) -> Self {
        Self::Disconnect { now }
    }

    /// Serializes the message to a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; cannot happen for well-formed records.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<Notification> for ServerMessage {
    fn from(notification: Notification) -> Self {
        let now = notification.now;
        match notification.event {
            DeviceEvent::Reachable { device } => Self::Reachable { now, device },
            DeviceEvent::Unreachable { uid } => Self::Unreachable {
                now,
                device: DeviceRef { uid },
            },
            DeviceEvent::Update { uid, udata } => Self::Update {
                now,
                device: DeviceUpdate { uid, udata },
            },
        }
    }
}

/// A command sent by a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Liveness check, answered with `pong`.
    Ping,
    /// Replay of every live device as `reachable`.
    Status,
    /// Orderly close.
    Disconnect,
    /// Anything else; answered with an error.
    Unknown(String),
}

impl From<&str> for ClientCommand {
    fn from(command: &str) -> Self {
        match command {
            "ping" => Self::Ping,
            "status" => Self::Status,
            "disconnect" => Self::Disconnect,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// A classified client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    /// A frame carrying `command`.
    Command(ClientCommand),
    /// A frame carrying `status`, such as an echoed server message.
    Echo,
    /// Not a JSON object with exactly one of `command` or `status` as a string.
    Malformed,
}

impl ClientFrame {
    /// Classifies a text frame.
    ///
    /// # Examples
    ///
    /// ```
    /// use blhub::subscription::{ClientCommand, ClientFrame};
    ///
    /// assert_eq!(
    ///     ClientFrame::parse(r#"{"command":"ping"}"#),
    ///     ClientFrame::Command(ClientCommand::Ping)
    /// );
    /// assert_eq!(ClientFrame::parse(r#"{"status":"pong"}"#), ClientFrame::Echo);
    /// assert_eq!(ClientFrame::parse("[]"), ClientFrame::Malformed);
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(text) else {
            return Self::Malformed;
        };
        match (
            fields.get("command").and_then(Value::as_str),
            fields.get("status").and_then(Value::as_str),
        ) {
            (Some(command), None) => Self::Command(command.into()),
            (None, Some(_)) => Self::Echo,
            _ => Self::Malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn hello_uses_camel_case_fields() {
        let json = serde_json::to_value(ServerMessage::hello(at(5), "hall")).unwrap();
        assert_eq!(json["status"], "hello");
        assert_eq!(json["now"], 5);
        assert_eq!(json["name"], "hall");
        assert_eq!(json["serverName"], SERVER_NAME);
        assert_eq!(json["serverVersion"], SERVER_VERSION);
    }

    #[test]
    fn simple_messages_serialize() {
        assert_eq!(
            serde_json::to_value(ServerMessage::pong(at(1))).unwrap(),
            serde_json::json!({ "status": "pong", "now": 1 })
        );
        assert_eq!(
            serde_json::to_value(ServerMessage::error(at(2), "Unknown command")).unwrap(),
            serde_json::json!({ "status": "error", "now": 2, "message": "Unknown command" })
        );
        assert_eq!(
            ServerMessage::disconnect(at(3)).to_json().unwrap(),
            r#"{"status":"disconnect","now":3}"#
        );
    }

    #[test]
    fn commands_are_recognized() {
        assert_eq!(
            ClientFrame::parse(r#"{"command":"status"}"#),
            ClientFrame::Command(ClientCommand::Status)
        );
        assert_eq!(
            ClientFrame::parse(r#"{"command":"disconnect","extra":1}"#),
            ClientFrame::Command(ClientCommand::Disconnect)
        );
        assert_eq!(
            ClientFrame::parse(r#"{"command":"reboot"}"#),
            ClientFrame::Command(ClientCommand::Unknown("reboot".to_string()))
        );
    }

    #[test]
    fn frames_need_exactly_one_string_discriminator() {
        assert_eq!(
            ClientFrame::parse(r#"{"command":"ping","status":"ok"}"#),
            ClientFrame::Malformed
        );
        assert_eq!(ClientFrame::parse(r#"{"command":7}"#), ClientFrame::Malformed);
        assert_eq!(ClientFrame::parse("{}"), ClientFrame::Malformed);
        assert_eq!(ClientFrame::parse("not json"), ClientFrame::Malformed);
        // a non-string status does not count
        assert_eq!(
            ClientFrame::parse(r#"{"command":"ping","status":1}"#),
            ClientFrame::Command(ClientCommand::Ping)
        );
    }
}

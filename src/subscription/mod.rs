// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriber protocol.
//!
//! Subscribers hold a persistent connection and receive JSON envelopes:
//!
//! - `hello` when the session opens, followed by one `reachable` per live
//!   device
//! - every engine notification (`reachable`, `unreachable`, `update`)
//! - `pong`, `error` and `disconnect` in answer to client commands
//!
//! Clients send `{"command": "ping" | "status" | "disconnect"}`.
//!
//! The protocol logic lives in [`Session`], which does no I/O. [`serve`]
//! pumps a [`Session`] over any [`SubscriberConnection`].

mod message;
mod session;
mod session_id;

pub use message::{
    ClientCommand, ClientFrame, DeviceRef, DeviceUpdate, SERVER_NAME, SERVER_VERSION,
    ServerMessage,
};
pub use session::{
    MALFORMED_MESSAGE, Reply, Session, SubscriberConnection, UNKNOWN_COMMAND, serve,
};
pub use session_id::SessionId;

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Probe and command encoding.
//!
//! Every request is a command code plus a 16-byte payload whose first byte
//! is the query parameter tag. Decoding of the answers lives in
//! [`crate::response`].
//!
//! # Available Commands
//!
//! | Command | Code | Tag | Purpose |
//! |---------|------|-----|---------|
//! | [`PowerCommand::Query`] | `0x6a` | 1 | Read relay state |
//! | [`PowerCommand::Set`] (standard) | `0x6a` | 2 | Switch relay |
//! | [`PowerCommand::Set`] (legacy) | `0x66` | - | Switch `sp1` relay |
//! | [`EnergyCommand`] | `0x6a` | 8 | Read power draw |
//!
//! # Examples
//!
//! ```
//! use blhub::command::{Command, PowerCommand};
//!
//! let query = PowerCommand::Query;
//! assert_eq!(query.command_code(), 0x6a);
//! assert_eq!(query.payload()[0], 1);
//! ```

mod energy;
mod power;

pub use energy::EnergyCommand;
pub use power::PowerCommand;

pub(crate) use energy::ENERGY_QUERY_TAG;
pub(crate) use power::POWER_QUERY_TAG;

/// Command code of standard requests.
pub const REQUEST_COMMAND: u16 = 0x6a;

/// Command code of the first-generation power switch.
pub const LEGACY_POWER_COMMAND: u16 = 0x66;

/// Length of every request payload.
pub const PAYLOAD_LEN: usize = 16;

/// A request that can be sent through a [`DeviceHandle`](crate::protocol::DeviceHandle).
pub trait Command {
    /// Returns the request command code.
    fn command_code(&self) -> u16;

    /// Returns the encoded request payload.
    fn payload(&self) -> [u8; PAYLOAD_LEN];
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power query and switch commands.

use crate::capabilities::PowerSetFormat;
use crate::command::{Command, LEGACY_POWER_COMMAND, PAYLOAD_LEN, REQUEST_COMMAND};

/// Query parameter tag of a relay state query.
pub(crate) const POWER_QUERY_TAG: u8 = 1;

/// Query parameter tag of a standard relay switch.
const POWER_SET_TAG: u8 = 2;

/// Command to read or switch a relay.
///
/// # Examples
///
/// ```
/// use blhub::PowerSetFormat;
/// use blhub::command::{Command, PowerCommand};
///
/// let on = PowerCommand::set(true, PowerSetFormat::Standard);
/// assert_eq!(on.command_code(), 0x6a);
/// assert_eq!(on.payload()[..5], [2, 0, 0, 0, 1]);
///
/// let legacy_off = PowerCommand::set(false, PowerSetFormat::Legacy);
/// assert_eq!(legacy_off.command_code(), 0x66);
/// assert_eq!(legacy_off.payload()[..4], [0, 4, 4, 4]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerCommand {
    /// Query the relay state.
    Query,
    /// Switch the relay.
    Set {
        /// Desired relay state.
        on: bool,
        /// Encoding required by the device class.
        format: PowerSetFormat,
    },
}

impl PowerCommand {
    /// Creates a switch command.
    #[must_use]
    pub const fn set(on: bool, format: PowerSetFormat) -> Self {
        Self::Set { on, format }
    }
}

impl Command for PowerCommand {
    fn command_code(&self) -> u16 {
        match self {
            Self::Query
            | Self::Set {
                format: PowerSetFormat::Standard,
                ..
            } => REQUEST_COMMAND,
            Self::Set {
                format: PowerSetFormat::Legacy,
                ..
            } => LEGACY_POWER_COMMAND,
        }
    }

    fn payload(&self) -> [u8; PAYLOAD_LEN] {
        let mut p = [0u8; PAYLOAD_LEN];
        match *self {
            Self::Query => p[0] = POWER_QUERY_TAG,
            Self::Set {
                on,
                format: PowerSetFormat::Standard,
            } => {
                p[0] = POWER_SET_TAG;
                p[4] = u8::from(on);
            }
            Self::Set {
                on,
                format: PowerSetFormat::Legacy,
            } => {
                p[0] = u8::from(on);
                p[1] = 4;
                p[2] = 4;
                p[3] = 4;
            }
        }
        p
    }
}

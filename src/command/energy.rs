// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Energy reading command.

use crate::command::{Command, PAYLOAD_LEN, REQUEST_COMMAND};

/// Query parameter tag of an energy reading.
pub(crate) const ENERGY_QUERY_TAG: u8 = 8;

/// Command to read the current power draw of a metering plug.
///
/// # Examples
///
/// ```
/// use blhub::command::{Command, EnergyCommand};
///
/// assert_eq!(EnergyCommand.command_code(), 0x6a);
/// assert_eq!(EnergyCommand.payload()[0], 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnergyCommand;

impl Command for EnergyCommand {
    fn command_code(&self) -> u16 {
        REQUEST_COMMAND
    }

    fn payload(&self) -> [u8; PAYLOAD_LEN] {
        [ENERGY_QUERY_TAG, 0, 254, 1, 5, 1, 0, 0, 0, 45, 0, 0, 0, 0, 0, 0]
    }
}

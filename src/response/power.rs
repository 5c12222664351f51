// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power state response parsing.

use crate::command::POWER_QUERY_TAG;
use crate::error::ProtocolError;
use crate::protocol::{CallResponse, CallStatus};

use super::validate;

/// Answer to a [`PowerCommand::Query`](crate::command::PowerCommand::Query).
///
/// # Examples
///
/// ```
/// use blhub::protocol::CallResponse;
/// use blhub::response::PowerResponse;
///
/// let mut payload = vec![0u8; 16];
/// payload[0] = 1;
/// payload[4] = 1;
/// let response = PowerResponse::decode(&CallResponse::ok(0x3ee, payload)).unwrap();
/// assert!(response.is_on());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerResponse {
    on: bool,
}

impl PowerResponse {
    /// Decodes a relay state answer.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if the response does not answer a power
    /// query.
    pub fn decode(response: &CallResponse) -> Result<Self, ProtocolError> {
        let payload = validate(response, POWER_QUERY_TAG)?;
        Ok(Self {
            on: payload[4] != 0,
        })
    }

    /// Returns `true` if the relay is closed.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.on
    }
}

/// Acknowledgement of a [`PowerCommand::Set`](crate::command::PowerCommand::Set).
///
/// Switch answers carry no state worth decoding; only the status flag is
/// checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchAck;

impl SwitchAck {
    /// Checks that the device accepted a switch command.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ErrorStatus`] if the device rejected it.
    pub fn decode(response: &CallResponse) -> Result<Self, ProtocolError> {
        match response.status {
            CallStatus::Ok => Ok(Self),
            CallStatus::Error => Err(ProtocolError::ErrorStatus),
        }
    }
}

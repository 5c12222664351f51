// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding and validation of probe responses.
//!
//! A probe response is accepted only if the device reports success, the
//! response command code is [`RESPONSE_COMMAND`], the payload holds at least
//! [`MIN_PAYLOAD_LEN`] bytes and its first byte echoes the query parameter
//! tag. Anything else is a [`ProtocolError`].

mod energy;
mod power;

pub use energy::EnergyResponse;
pub use power::{PowerResponse, SwitchAck};

use crate::error::ProtocolError;
use crate::protocol::{CallResponse, CallStatus};

/// Command code of probe responses.
pub const RESPONSE_COMMAND: u16 = 0x3ee;

/// Minimum payload length of a probe response.
pub const MIN_PAYLOAD_LEN: usize = 16;

/// Validates the common response envelope and returns its payload.
fn validate(response: &CallResponse, tag: u8) -> Result<&[u8], ProtocolError> {
    if response.status != CallStatus::Ok {
        return Err(ProtocolError::ErrorStatus);
    }
    if response.command != RESPONSE_COMMAND {
        return Err(ProtocolError::UnexpectedCommand {
            expected: RESPONSE_COMMAND,
            actual: response.command,
        });
    }
    let payload = response.payload.as_slice();
    if payload.len() < MIN_PAYLOAD_LEN {
        return Err(ProtocolError::Truncated {
            len: payload.len(),
            min: MIN_PAYLOAD_LEN,
        });
    }
    if payload[0] != tag {
        return Err(ProtocolError::UnexpectedParameter {
            expected: tag,
            actual: payload[0],
        });
    }
    Ok(payload)
}

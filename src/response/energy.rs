// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Energy reading response parsing.

use crate::command::ENERGY_QUERY_TAG;
use crate::error::ProtocolError;
use crate::protocol::CallResponse;

use super::validate;

/// Answer to an [`EnergyCommand`](crate::command::EnergyCommand).
///
/// The reading is stored as three BCD bytes at payload offsets 5, 6 and 7,
/// most significant byte last, in hundredths of a watt.
///
/// # Examples
///
/// ```
/// use blhub::protocol::CallResponse;
/// use blhub::response::EnergyResponse;
///
/// let mut payload = vec![0u8; 16];
/// payload[0] = 8;
/// payload[5] = 0x50;
/// payload[6] = 0x02;
/// let response = EnergyResponse::decode(&CallResponse::ok(0x3ee, payload)).unwrap();
/// assert!((response.watts() - 2.5).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyResponse {
    watts: f64,
}

impl EnergyResponse {
    /// Decodes an energy reading.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] if the response does not answer an energy
    /// query or the reading is not six decimal digits.
    pub fn decode(response: &CallResponse) -> Result<Self, ProtocolError> {
        let payload = validate(response, ENERGY_QUERY_TAG)?;
        let digits = format!("{:02x}{:02x}{:02x}", payload[7], payload[6], payload[5]);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::EnergyFormat(digits));
        }
        let hundredths: u32 = digits
            .parse()
            .map_err(|_| ProtocolError::EnergyFormat(digits.clone()))?;
        Ok(Self {
            watts: f64::from(hundredths) / 100.0,
        })
    }

    /// Returns the current power draw in watts.
    #[must_use]
    pub const fn watts(&self) -> f64 {
        self.watts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::RESPONSE_COMMAND;

    fn reading(b5: u8, b6: u8, b7: u8) -> CallResponse {
        let mut p = vec![0u8; 16];
        p[0] = ENERGY_QUERY_TAG;
        p[5] = b5;
        p[6] = b6;
        p[7] = b7;
        CallResponse::ok(RESPONSE_COMMAND, p)
    }

    #[test]
    fn offset_seven_is_most_significant() {
        let watts = EnergyResponse::decode(&reading(0x05, 0x01, 0x00))
            .unwrap()
            .watts();
        assert!((watts - 1.05).abs() < 1e-9);
    }

    #[test]
    fn decodes_large_reading() {
        let watts = EnergyResponse::decode(&reading(0x56, 0x34, 0x12))
            .unwrap()
            .watts();
        assert!((watts - 1234.56).abs() < 1e-9);
    }

    #[test]
    fn zero_reading() {
        let watts = EnergyResponse::decode(&reading(0, 0, 0)).unwrap().watts();
        assert!(watts.abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_hex_digits() {
        assert_eq!(
            EnergyResponse::decode(&reading(0x0a, 0x00, 0x00)),
            Err(ProtocolError::EnergyFormat("00000a".to_string()))
        );
    }

    #[test]
    fn rejects_power_answer() {
        let mut p = vec![0u8; 16];
        p[0] = 1;
        let response = CallResponse::ok(RESPONSE_COMMAND, p);
        assert!(matches!(
            EnergyResponse::decode(&response),
            Err(ProtocolError::UnexpectedParameter {
                expected: 8,
                actual: 1
            })
        ));
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hardware address type.

use std::fmt;

use serde::{Serialize, Serializer};

/// Physical hardware address of a device, as reported by the transport.
///
/// Displays and serializes as lowercase colon-separated hex.
///
/// # Examples
///
/// ```
/// use blhub::types::MacAddress;
///
/// let mac = MacAddress::new(vec![0x34, 0xea, 0x34, 0x0b, 0xc2, 0xf1]);
/// assert_eq!(mac.to_string(), "34:ea:34:0b:c2:f1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(Vec<u8>);

impl MacAddress {
    /// Creates a hardware address from its bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes.to_vec())
    }
}

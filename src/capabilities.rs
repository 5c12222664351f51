// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device classes and the capabilities they imply.
//!
//! The device class reported by the transport selects which probes and
//! commands are valid for a device:
//!
//! | Class | Power get | Power set | Energy get |
//! |-------|-----------|-----------|------------|
//! | `sp1` | no | yes | no |
//! | `sp2`, `sp3` | yes | yes | no |
//! | `sp3s` | yes | yes | yes, while powered on |
//! | other | no | no | no |

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Command encoding used to switch a device's power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerSetFormat {
    /// First-generation plugs (`sp1`).
    Legacy,
    /// All later plugs (`sp2`, `sp3`, `sp3s`).
    Standard,
}

/// Capabilities of a device class.
///
/// # Examples
///
/// ```
/// use blhub::{Capabilities, DeviceClass};
///
/// let caps = DeviceClass::Sp3s.capabilities();
/// assert!(caps.power_get);
/// assert!(caps.energy);
///
/// let legacy = DeviceClass::Sp1.capabilities();
/// assert!(!legacy.power_get);
/// assert!(legacy.power_set.is_some());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Supports querying the relay state.
    pub power_get: bool,

    /// Supports switching the relay, with the command encoding to use.
    pub power_set: Option<PowerSetFormat>,

    /// Supports energy readings.
    pub energy: bool,
}

impl Capabilities {
    /// A device the hub can only track for reachability.
    pub const NONE: Self = Self {
        power_get: false,
        power_set: None,
        energy: false,
    };

    const SP1: Self = Self {
        power_get: false,
        power_set: Some(PowerSetFormat::Legacy),
        energy: false,
    };

    const SWITCH: Self = Self {
        power_get: true,
        power_set: Some(PowerSetFormat::Standard),
        energy: false,
    };

    const METERED_SWITCH: Self = Self {
        power_get: true,
        power_set: Some(PowerSetFormat::Standard),
        energy: true,
    };
}

/// Device family tag reported by the transport.
///
/// Unrecognized tags are kept verbatim in [`DeviceClass::Other`] so they can
/// be exported unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// First-generation smart plug, switch only.
    Sp1,
    /// Smart plug with state query.
    Sp2,
    /// Smart plug with state query and night light.
    Sp3,
    /// Smart plug with state query and energy metering.
    Sp3s,
    /// Any other device family.
    Other(String),
}

impl DeviceClass {
    /// Returns the capability set of this class.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        match self {
            Self::Sp1 => Capabilities::SP1,
            Self::Sp2 | Self::Sp3 => Capabilities::SWITCH,
            Self::Sp3s => Capabilities::METERED_SWITCH,
            Self::Other(_) => Capabilities::NONE,
        }
    }

    /// Returns the class tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sp1 => "sp1",
            Self::Sp2 => "sp2",
            Self::Sp3 => "sp3",
            Self::Sp3s => "sp3s",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for DeviceClass {
    fn from(tag: &str) -> Self {
        match tag {
            "sp1" => Self::Sp1,
            "sp2" => Self::Sp2,
            "sp3" => Self::Sp3,
            "sp3s" => Self::Sp3s,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for DeviceClass {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeviceClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

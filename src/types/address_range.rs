// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inclusive IPv4 address ranges used to seed the address registry.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

/// Inclusive range of IPv4 addresses, written `start-end` or as a single
/// address.
///
/// The range may run downwards (`end < start`); addresses are then produced in
/// descending order. A range may span at most [`AddressRange::MAX_SPAN`]
/// steps.
///
/// # Examples
///
/// ```
/// use blhub::types::AddressRange;
///
/// let range: AddressRange = "192.168.1.10-192.168.1.12".parse().unwrap();
/// let addrs: Vec<_> = range.addresses().map(|a| a.to_string()).collect();
/// assert_eq!(addrs, ["192.168.1.10", "192.168.1.11", "192.168.1.12"]);
///
/// // Oversized ranges are rejected
/// assert!("10.0.0.0-10.0.1.0".parse::<AddressRange>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    start: Ipv4Addr,
    end: Ipv4Addr,
}

impl AddressRange {
    /// Maximum distance between the first and the last address of a range.
    pub const MAX_SPAN: u32 = 100;

    /// Creates a range, rejecting spans wider than [`Self::MAX_SPAN`].
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidRange`] if the range is too large.
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Result<Self, ValueError> {
        let span = u32::from(start).abs_diff(u32::from(end));
        if span > Self::MAX_SPAN {
            return Err(ValueError::InvalidRange(format!(
                "{start}-{end} spans {span} addresses, at most {} allowed",
                Self::MAX_SPAN
            )));
        }
        Ok(Self { start, end })
    }

    /// Creates a range holding exactly one address.
    #[must_use]
    pub const fn single(addr: Ipv4Addr) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Returns the first address of the range.
    #[must_use]
    pub const fn start(&self) -> Ipv4Addr {
        self.start
    }

    /// Returns the last address of the range.
    #[must_use]
    pub const fn end(&self) -> Ipv4Addr {
        self.end
    }

    /// Iterates over every address from `start` to `end` inclusive.
    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + use<> {
        let start = u32::from(self.start);
        let end = u32::from(self.end);
        let (low, high, descending) = if start <= end {
            (start, end, false)
        } else {
            (end, start, true)
        };
        let ascending = (low..=high).map(Ipv4Addr::from);
        let mut addrs: Vec<Ipv4Addr> = ascending.collect();
        if descending {
            addrs.reverse();
        }
        addrs.into_iter()
    }
}

fn parse_addr(s: &str) -> Result<Ipv4Addr, ValueError> {
    s.trim()
        .parse()
        .map_err(|_| ValueError::InvalidAddress(s.to_string()))
}

impl FromStr for AddressRange {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');
        let first = parts.next().unwrap_or_default();
        match (parts.next(), parts.next()) {
            (None, _) => Ok(Self::single(parse_addr(first)?)),
            (Some(second), None) => Self::new(parse_addr(first)?, parse_addr(second)?),
            (Some(_), Some(_)) => Err(ValueError::InvalidRange(s.to_string())),
        }
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

impl Serialize for AddressRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AddressRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_address() {
        let range: AddressRange = "10.0.0.7".parse().unwrap();
        assert_eq!(range.addresses().collect::<Vec<_>>(), [Ipv4Addr::new(10, 0, 0, 7)]);
        assert_eq!(range.to_string(), "10.0.0.7");
    }

    #[test]
    fn descending_range() {
        let range: AddressRange = "10.0.0.3-10.0.0.1".parse().unwrap();
        let addrs: Vec<_> = range.addresses().collect();
        assert_eq!(
            addrs,
            [
                Ipv4Addr::new(10, 0, 0, 3),
                Ipv4Addr::new(10, 0, 0, 2),
                Ipv4Addr::new(10, 0, 0, 1),
            ]
        );
    }

    #[test]
    fn range_crosses_octet_boundary() {
        let range: AddressRange = "10.0.0.254-10.0.1.1".parse().unwrap();
        assert_eq!(range.addresses().count(), 4);
        assert_eq!(range.addresses().last(), Some(Ipv4Addr::new(10, 0, 1, 1)));
    }

    #[test]
    fn maximum_span_is_accepted() {
        let range: AddressRange = "10.0.0.0-10.0.0.100".parse().unwrap();
        assert_eq!(range.addresses().count(), 101);
        assert!("10.0.0.0-10.0.0.101".parse::<AddressRange>().is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            "10.0.0.x".parse::<AddressRange>(),
            Err(ValueError::InvalidAddress(_))
        ));
        assert!(matches!(
            "10.0.0.1-10.0.0.2-10.0.0.3".parse::<AddressRange>(),
            Err(ValueError::InvalidRange(_))
        ));
        assert!("".parse::<AddressRange>().is_err());
    }

    #[test]
    fn deserializes_from_string() {
        let range: AddressRange = serde_json::from_str("\"10.0.0.1-10.0.0.2\"").unwrap();
        assert_eq!(range.start(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(range.end(), Ipv4Addr::new(10, 0, 0, 2));
    }
}

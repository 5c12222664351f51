// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub configuration.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ValueError;
use crate::types::AddressRange;

/// Bounds shared by both timing options, in milliseconds.
const MIN_MILLIS: u64 = 1;
const MAX_MILLIS: u64 = 60_000;

/// Configuration of a [`ReconciliationEngine`](super::ReconciliationEngine).
///
/// Field names deserialize in kebab-case (`device-timeout`,
/// `update-interval`, `address-ranges`, ...), so the same struct loads from
/// any serde format a host prefers.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use blhub::manager::HubConfig;
///
/// let config = HubConfig::new()
///     .with_name("living room")
///     .with_device_timeout(Duration::from_millis(500))
///     .with_address_range("192.168.1.20-192.168.1.29".parse().unwrap())
///     .with_broadcast_source("192.168.1.2");
///
/// config.validate().unwrap();
/// assert_eq!(config.seed_addresses().len(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct HubConfig {
    /// Controller name reported to subscribers.
    pub name: String,
    /// Timeout of every device call, in milliseconds.
    #[serde(rename = "device-timeout")]
    pub device_timeout_ms: u64,
    /// Pause between reconciliation cycles, in milliseconds.
    #[serde(rename = "update-interval")]
    pub update_interval_ms: u64,
    /// Explicit candidate addresses.
    pub addresses: Vec<Ipv4Addr>,
    /// Candidate address ranges.
    pub address_ranges: Vec<AddressRange>,
    /// Local address or interface name used for discovery broadcasts.
    ///
    /// Discovery scanning is disabled when unset.
    #[serde(rename = "broadcast")]
    pub broadcast_source: Option<String>,
    /// Attempts made by a power switch before giving up.
    pub power_attempts: u32,
}

impl HubConfig {
    /// Default device call timeout.
    pub const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_millis(1000);
    /// Default pause between cycles.
    pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(10_000);
    /// Default power switch attempts.
    pub const DEFAULT_POWER_ATTEMPTS: u32 = 10;

    /// Creates a configuration with default values and no addresses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the controller name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the device call timeout.
    #[must_use]
    pub fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout_ms = saturating_millis(timeout);
        self
    }

    /// Sets the pause between cycles.
    #[must_use]
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval_ms = saturating_millis(interval);
        self
    }

    /// Adds a candidate address.
    #[must_use]
    pub fn with_address(mut self, address: Ipv4Addr) -> Self {
        self.addresses.push(address);
        self
    }

    /// Adds a candidate address range.
    #[must_use]
    pub fn with_address_range(mut self, range: AddressRange) -> Self {
        self.address_ranges.push(range);
        self
    }

    /// Enables discovery broadcasts from the given source.
    #[must_use]
    pub fn with_broadcast_source(mut self, source: impl Into<String>) -> Self {
        self.broadcast_source = Some(source.into());
        self
    }

    /// Sets the number of power switch attempts.
    #[must_use]
    pub fn with_power_attempts(mut self, attempts: u32) -> Self {
        self.power_attempts = attempts;
        self
    }

    /// Returns the device call timeout.
    #[must_use]
    pub fn device_timeout(&self) -> Duration {
        Duration::from_millis(self.device_timeout_ms)
    }

    /// Returns the pause between cycles.
    #[must_use]
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    /// Checks every option against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::OutOfRange`] for a timing option outside
    /// `1..=60000` ms or a zero attempt count.
    pub fn validate(&self) -> Result<(), ValueError> {
        check_millis("device-timeout", self.device_timeout_ms)?;
        check_millis("update-interval", self.update_interval_ms)?;
        if self.power_attempts == 0 {
            return Err(ValueError::OutOfRange {
                field: "power-attempts",
                min: 1,
                max: u64::from(u32::MAX),
                actual: 0,
            });
        }
        Ok(())
    }

    /// Returns every configured candidate address, deduplicated and sorted.
    #[must_use]
    pub fn seed_addresses(&self) -> Vec<Ipv4Addr> {
        let mut seeds: BTreeSet<Ipv4Addr> = self.addresses.iter().copied().collect();
        for range in &self.address_ranges {
            seeds.extend(range.addresses());
        }
        seeds.into_iter().collect()
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            device_timeout_ms: saturating_millis(Self::DEFAULT_DEVICE_TIMEOUT),
            update_interval_ms: saturating_millis(Self::DEFAULT_UPDATE_INTERVAL),
            addresses: Vec::new(),
            address_ranges: Vec::new(),
            broadcast_source: None,
            power_attempts: Self::DEFAULT_POWER_ATTEMPTS,
        }
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn check_millis(field: &'static str, actual: u64) -> Result<(), ValueError> {
    if (MIN_MILLIS..=MAX_MILLIS).contains(&actual) {
        Ok(())
    } else {
        Err(ValueError::OutOfRange {
            field,
            min: MIN_MILLIS,
            max: MAX_MILLIS,
            actual,
        })
    }
}

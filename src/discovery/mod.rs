// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast discovery of devices at unknown addresses.
//!
//! The scanner periodically asks the transport to broadcast a discovery
//! probe from a configured source. Every address that answers and is not
//! yet in the Address Registry is added as an unbound candidate; the next
//! reconciliation cycle probes it.
//!
//! Scans start fast and slow down, following a [`BackoffSchedule`]:
//!
//! | scans so far | next scan after |
//! |---|---|
//! | 1 to 9 | 1 s |
//! | 10 to 99 | 10 s |
//! | 100 and more | 60 s |
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use blhub::discovery::BackoffSchedule;
//!
//! let mut schedule = BackoffSchedule::new();
//! assert_eq!(schedule.next_delay(), Duration::from_secs(1));
//! ```

use std::net::Ipv4Addr;
use std::time::Duration;

use crate::protocol::{DeviceHandle, Transport};

const FAST_DELAY: Duration = Duration::from_secs(1);
const MEDIUM_DELAY: Duration = Duration::from_secs(10);
const SLOW_DELAY: Duration = Duration::from_secs(60);

const FAST_SCANS: u32 = 10;
const MEDIUM_SCANS: u32 = 100;

/// Delay between discovery scans.
#[derive(Debug, Clone, Default)]
pub struct BackoffSchedule {
    scans: u32,
}

impl BackoffSchedule {
    /// Creates a schedule for a scanner that has not scanned yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one scan and returns the delay before the next one.
    pub fn next_delay(&mut self) -> Duration {
        self.scans = self.scans.saturating_add(1);
        if self.scans < FAST_SCANS {
            FAST_DELAY
        } else if self.scans < MEDIUM_SCANS {
            MEDIUM_DELAY
        } else {
            SLOW_DELAY
        }
    }

    /// Returns the number of scans counted so far.
    #[must_use]
    pub fn scans(&self) -> u32 {
        self.scans
    }
}

/// Periodic broadcast scanner.
#[derive(Debug, Clone)]
pub struct DiscoveryScanner {
    source: String,
    timeout: Duration,
    schedule: BackoffSchedule,
}

impl DiscoveryScanner {
    /// Creates a scanner broadcasting from `source`.
    #[must_use]
    pub fn new(source: impl Into<String>, timeout: Duration) -> Self {
        Self {
            source: source.into(),
            timeout,
            schedule: BackoffSchedule::new(),
        }
    }

    /// Broadcasts one discovery probe and returns the answering addresses.
    ///
    /// Handles returned by the transport are released immediately; the
    /// reconciliation loop opens its own. A failed broadcast yields no
    /// addresses.
    pub async fn scan<T: Transport>(&self, transport: &T) -> Vec<Ipv4Addr> {
        tracing::debug!(source = %self.source, "Broadcasting discovery probe");
        match transport.discover(self.timeout, &self.source).await {
            Ok(handles) => handles
                .into_iter()
                .map(|handle| {
                    let address = handle.info().address;
                    tracing::trace!(
                        address = %address,
                        class = %handle.info().dev_class,
                        "Discovery answer"
                    );
                    handle.close();
                    address
                })
                .collect(),
            Err(e) => {
                tracing::warn!(source = %self.source, error = %e, "Discovery broadcast failed");
                Vec::new()
            }
        }
    }

    /// Counts a finished scan and returns the delay before the next one.
    pub fn next_delay(&mut self) -> Duration {
        self.schedule.next_delay()
    }
}

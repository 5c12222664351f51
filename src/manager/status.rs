// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::device::PublicDevice;
use crate::types::Uid;

/// Reachability of every requested device at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    /// Report time.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Status per uid.
    pub devices: BTreeMap<Uid, DeviceStatus>,
}

impl StatusReport {
    pub(crate) fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            devices: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, uid: Uid, status: DeviceStatus) {
        self.devices.insert(uid, status);
    }

    /// Returns the status of `uid`, if it is part of the report.
    #[must_use]
    pub fn get(&self, uid: &Uid) -> Option<&DeviceStatus> {
        self.devices.get(uid)
    }
}

/// Status of a single device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Live in the Directory.
    Reachable {
        /// Exported record.
        device: Box<PublicDevice>,
    },
    /// Contacted before but not live.
    Unreachable {
        /// Last successful contact.
        #[serde(rename = "lastSeen", with = "chrono::serde::ts_milliseconds")]
        last_seen: DateTime<Utc>,
    },
    /// Never contacted.
    Unknown,
}

impl DeviceStatus {
    pub(crate) fn reachable(device: PublicDevice) -> Self {
        Self::Reachable {
            device: Box::new(device),
        }
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Probe observations and the deltas they produce.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of one successful probe sequence against a device.
///
/// A field is `None` when the device class does not support that reading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Observation {
    /// Relay state, if the class supports power queries.
    pub power: Option<bool>,
    /// Power draw, if the class supports energy readings.
    pub energy: Option<f64>,
}

impl Observation {
    /// A contact that produced no readings.
    #[must_use]
    pub const fn reachable_only() -> Self {
        Self {
            power: None,
            energy: None,
        }
    }

    /// A relay state reading.
    #[must_use]
    pub const fn power(on: bool) -> Self {
        Self {
            power: Some(on),
            energy: None,
        }
    }

    /// A relay state plus energy reading.
    #[must_use]
    pub const fn metered(on: bool, watts: f64) -> Self {
        Self {
            power: Some(on),
            energy: Some(watts),
        }
    }
}

/// Partial `udata` carried by an `update` notification.
///
/// `lastSeen` is always present; the other fields only when they changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataDelta {
    /// Time of the contact that produced the change.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_seen: DateTime<Utc>,

    /// New relay state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<bool>,

    /// New power draw in watts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
}

impl DataDelta {
    /// Creates a delta with no changed fields.
    #[must_use]
    pub const fn new(last_seen: DateTime<Utc>) -> Self {
        Self {
            last_seen,
            power: None,
            energy: None,
        }
    }

    /// Returns `true` if no reported field changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.power.is_none() && self.energy.is_none()
    }
}

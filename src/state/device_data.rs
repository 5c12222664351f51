// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device sub-state tracking.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{DataDelta, Observation};

/// Observed sub-state of a device.
///
/// `power` and `energy` stay `None` until a probe reports them; classes
/// without the matching capability never set them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceData {
    /// Time of the last successful contact.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_seen: Option<DateTime<Utc>>,

    /// Relay state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<bool>,

    /// Current power draw in watts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
}

impl DeviceData {
    /// Creates an empty state for a device that was never contacted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful contact at `now`.
    ///
    /// Returns the fields that changed, or `None` if only `lastSeen` moved.
    /// Readings are compared exactly.
    #[allow(clippy::float_cmp)]
    pub fn apply(&mut self, now: DateTime<Utc>, observation: &Observation) -> Option<DataDelta> {
        self.last_seen = Some(now);
        let mut delta = DataDelta::new(now);

        if let Some(power) = observation.power
            && self.power != Some(power)
        {
            self.power = Some(power);
            delta.power = Some(power);
        }

        if let Some(energy) = observation.energy
            && self.energy != Some(energy)
        {
            self.energy = Some(energy);
            delta.energy = Some(energy);
        }

        (!delta.is_empty()).then_some(delta)
    }

    /// Records an acknowledged power switch at `now`.
    ///
    /// The returned delta always carries both `lastSeen` and `power`.
    pub fn record_switch(&mut self, now: DateTime<Utc>, power: bool) -> DataDelta {
        self.last_seen = Some(now);
        self.power = Some(power);
        DataDelta {
            last_seen: now,
            power: Some(power),
            energy: None,
        }
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observed device sub-state.
//!
//! [`DeviceData`] is the mutable part of a device record (`udata` on the
//! wire). Each successful probe produces an [`Observation`]; applying it
//! refreshes `lastSeen` and yields a [`DataDelta`] when a reported field
//! actually changed.
//!
//! # Examples
//!
//! ```
//! use blhub::state::{DeviceData, Observation};
//!
//! let mut data = DeviceData::new();
//! let now = chrono::Utc::now();
//!
//! let delta = data.apply(now, &Observation::power(true));
//! assert!(delta.is_some());
//!
//! // Same reading again: lastSeen moves, nothing to report
//! assert!(data.apply(now, &Observation::power(true)).is_none());
//! ```

mod data_change;
mod device_data;

pub use data_change::{DataDelta, Observation};
pub use device_data::DeviceData;

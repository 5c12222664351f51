// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change notifications.
//!
//! The reconciliation engine publishes a [`DeviceEvent`] for every
//! reachability transition and every observed state change. The
//! [`EventBus`] stamps each one into a [`Notification`] and fans it out to
//! all subscribers.
//!
//! # Examples
//!
//! ```
//! use blhub::event::{DeviceEvent, EventBus};
//! use blhub::types::Uid;
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(DeviceEvent::unreachable(Uid::from("34ea34b4c2f1")));
//! assert!(rx.try_recv().is_ok());
//! ```

mod device_event;
mod event_bus;

pub use device_event::{DeviceEvent, Notification};
pub use event_bus::EventBus;

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::device::PublicDevice;
use crate::state::DataDelta;
use crate::subscription::ServerMessage;
use crate::types::Uid;

/// Reachability and state transitions emitted by the reconciliation engine.
///
/// Events for one uid are published in the order they happened. Events for
/// different devices carry no relative ordering.
///
/// # Examples
///
/// ```
/// use blhub::event::DeviceEvent;
/// use blhub::types::Uid;
///
/// let event = DeviceEvent::unreachable(Uid::from("34ea34b4c2f1"));
/// assert_eq!(event.kind(), "unreachable");
/// assert_eq!(event.uid().as_str(), "34ea34b4c2f1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// A device entered the Directory.
    Reachable {
        /// Full exported record.
        device: PublicDevice,
    },

    /// A device left the Directory.
    Unreachable {
        /// The device that left.
        uid: Uid,
    },

    /// Observed sub-state of a live device changed.
    Update {
        /// The device that changed.
        uid: Uid,
        /// `lastSeen` plus the fields that changed.
        udata: DataDelta,
    },
}

impl DeviceEvent {
    /// Creates a `reachable` event.
    #[must_use]
    pub fn reachable(device: PublicDevice) -> Self {
        Self::Reachable { device }
    }

    /// Creates an `unreachable` event.
    #[must_use]
    pub fn unreachable(uid: Uid) -> Self {
        Self::Unreachable { uid }
    }

    /// Creates an `update` event.
    #[must_use]
    pub fn update(uid: Uid, udata: DataDelta) -> Self {
        Self::Update { uid, udata }
    }

    /// Returns the uid this event is about.
    #[must_use]
    pub fn uid(&self) -> &Uid {
        match self {
            Self::Reachable { device } => &device.uid,
            Self::Unreachable { uid } | Self::Update { uid, .. } => uid,
        }
    }

    /// Returns the wire name of the event.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Reachable { .. } => "reachable",
            Self::Unreachable { .. } => "unreachable",
            Self::Update { .. } => "update",
        }
    }
}

/// A [`DeviceEvent`] stamped with its publication time.
///
/// Serializes as the subscriber envelope
/// `{"status": kind, "now": ms, "device": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "ServerMessage")]
pub struct Notification {
    /// Publication time.
    pub now: DateTime<Utc>,
    /// The transition.
    pub event: DeviceEvent,
}

impl Notification {
    /// Stamps an event with the current time.
    #[must_use]
    pub fn now(event: DeviceEvent) -> Self {
        Self {
            now: Utc::now(),
            event,
        }
    }
}

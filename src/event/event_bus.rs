// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting device notifications.

use tokio::sync::broadcast;

use super::{DeviceEvent, Notification};

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fans notifications out to every current subscriber.
///
/// Backed by tokio's broadcast channel. A subscriber that drops its
/// receiver is skipped silently. A subscriber that falls more than the
/// capacity behind loses the oldest notifications and receives
/// `RecvError::Lagged` once.
///
/// # Examples
///
/// ```
/// use blhub::event::{DeviceEvent, EventBus};
/// use blhub::types::Uid;
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DeviceEvent::unreachable(Uid::from("34ea34b4c2f1")));
///
/// let notification = rx.try_recv().unwrap();
/// assert_eq!(notification.event.kind(), "unreachable");
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Notification>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of notifications buffered per subscriber
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to notifications published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Stamps an event with the current time and publishes it.
    ///
    /// Without subscribers the notification is discarded.
    pub fn publish(&self, event: DeviceEvent) {
        let _ = self.publish_counted(event);
    }

    /// Publishes an event and returns the number of receivers that got it.
    #[must_use]
    pub fn publish_counted(&self, event: DeviceEvent) -> usize {
        tracing::debug!(uid = %event.uid(), kind = event.kind(), "Publishing device event");
        self.sender.send(Notification::now(event)).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

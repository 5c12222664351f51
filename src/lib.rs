// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `blhub` - live status of a fleet of Broadlink smart plugs.
//!
//! The hub turns a set of candidate IPv4 addresses into a directory of live
//! devices, keeps it fresh while plugs lose power, drop off the network or
//! change address, probes each plug's relay state and power draw, and
//! republishes every change to subscribers.
//!
//! # Supported Devices
//!
//! | class | power get | power set | energy |
//! |---|---|---|---|
//! | `sp1` | no | yes | no |
//! | `sp2`, `sp3` | yes | yes | no |
//! | `sp3s` | yes | yes | yes, while on |
//!
//! # Architecture
//!
//! - [`protocol`]: the seam with the Device Transport, which performs UDP
//!   discovery and encrypted calls. Hosts implement [`protocol::Transport`].
//! - [`command`] and [`response`]: encoding of probe requests and
//!   validation and decoding of their answers.
//! - [`manager`]: the [`ReconciliationEngine`] owning the Address Registry,
//!   the Device Directory and the Seen Ledger, and running single-flight
//!   reconciliation cycles.
//! - [`discovery`]: periodic broadcast scanning for new addresses.
//! - [`event`]: change notifications fanned out on an [`event::EventBus`].
//! - [`subscription`]: the JSON subscriber protocol.
//! - [`home_assistant`]: configuration export.
//!
//! # Quick Start
//!
//! ```ignore
//! use blhub::manager::{HubConfig, ReconciliationEngine};
//!
//! #[tokio::main]
//! async fn main() -> blhub::Result<()> {
//!     let config = HubConfig::new()
//!         .with_name("house")
//!         .with_address_range("192.168.1.20-192.168.1.40".parse()?)
//!         .with_broadcast_source("192.168.1.2");
//!
//!     // `UdpTransport` stands for the host's Device Transport.
//!     let hub = ReconciliationEngine::new(config, UdpTransport::new())?.spawn();
//!
//!     let mut events = hub.subscribe();
//!     while let Ok(notification) = events.recv().await {
//!         println!("{}", serde_json::to_string(&notification).unwrap_or_default());
//!     }
//!
//!     hub.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The crate logs through [`tracing`] and never installs a subscriber.

mod capabilities;
pub mod command;
pub mod device;
pub mod discovery;
pub mod error;
pub mod event;
pub mod home_assistant;
pub mod manager;
pub mod protocol;
pub mod response;
pub mod state;
pub mod subscription;
pub mod types;

pub use capabilities::{Capabilities, DeviceClass, PowerSetFormat};
pub use command::{Command, EnergyCommand, PowerCommand};
pub use device::{Device, PublicDevice};
pub use error::{DeviceError, Error, ProtocolError, Result, TransportError, ValueError};
pub use event::{DeviceEvent, EventBus, Notification};
pub use manager::{EngineHandle, HubConfig, ReconciliationEngine};
pub use protocol::{CallResponse, CallStatus, DeviceHandle, DeviceInfo, Transport};
pub use response::{EnergyResponse, PowerResponse, SwitchAck};
pub use state::{DataDelta, DeviceData, Observation};
pub use types::{AddressRange, MacAddress, Uid};

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device reconciliation.
//!
//! The [`ReconciliationEngine`] owns three pieces of state:
//!
//! - the [`AddressRegistry`]: every candidate address and the uid bound there
//! - the [`DeviceDirectory`]: live devices with their transport handles
//! - the [`SeenLedger`]: when each uid was last contacted, kept after it
//!   goes away
//!
//! Each cycle refreshes every bound device and probes every free address
//! concurrently, with a short random jitter before each task. A device that
//! fails any probe is torn down at once, announced `unreachable`, and its
//! address is probed again before the cycle ends. A new device is only
//! announced `reachable` once all its probes succeeded.
//!
//! Cycles never overlap. [`ReconciliationEngine::trigger_reconciliation`]
//! starts one at once when idle; while one runs, any number of triggers
//! coalesce into a single rerun.
//!
//! # Examples
//!
//! ```ignore
//! use blhub::manager::{HubConfig, ReconciliationEngine};
//!
//! let engine = ReconciliationEngine::new(HubConfig::new(), transport)?;
//! engine.add_address("192.168.1.20".parse()?);
//! let report = engine.run_cycle().await;
//! println!("{} device(s) admitted", report.admitted);
//! ```

mod config;
mod directory;
mod engine;
mod reconcile;
mod registry;
mod single_flight;
mod status;

pub use config::HubConfig;
pub use directory::{DeviceDirectory, SeenLedger};
pub use engine::{EngineHandle, ReconciliationEngine};
pub use reconcile::CycleReport;
pub use registry::AddressRegistry;
pub use single_flight::{FlightState, SingleFlight, Trigger};
pub use status::{DeviceStatus, StatusReport};

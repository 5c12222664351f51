// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciliation engine.

use std::net::Ipv4Addr;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use rand::Rng;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::device::{Device, PublicDevice};
use crate::discovery::DiscoveryScanner;
use crate::error::{Error, Result};
use crate::event::{DeviceEvent, EventBus, Notification};
use crate::protocol::Transport;
use crate::types::Uid;

use super::config::HubConfig;
use super::reconcile::{Cycle, CycleReport, HubState};
use super::registry::AddressRegistry;
use super::single_flight::{FlightState, SingleFlight, Trigger};
use super::status::StatusReport;

/// Bounds of the pause before a coalesced rerun, in milliseconds.
const RERUN_DELAY_MS: (u64, u64) = (100, 200);

/// Upper bound of the pause between power switch attempts, in milliseconds.
const SWITCH_BACKOFF_MS: u64 = 500;

struct Shared<T: Transport> {
    config: HubConfig,
    transport: T,
    state: RwLock<HubState<T::Handle>>,
    events: EventBus,
    flight: SingleFlight,
    cycles: AtomicU64,
}

/// Keeps a directory of live devices in sync with the network.
///
/// The engine owns the Address Registry, the Device Directory and the Seen
/// Ledger. Cycles run one at a time; see [`ReconciliationEngine::spawn`].
/// Cloning is cheap and every clone drives the same state.
///
/// # Examples
///
/// ```ignore
/// use blhub::manager::{HubConfig, ReconciliationEngine};
///
/// let config = HubConfig::new()
///     .with_address_range("192.168.1.20-192.168.1.40".parse()?)
///     .with_broadcast_source("192.168.1.2");
/// let engine = ReconciliationEngine::new(config, transport)?;
/// let hub = engine.spawn();
///
/// let mut events = hub.subscribe();
/// while let Ok(notification) = events.recv().await {
///     println!("{}", serde_json::to_string(&notification)?);
/// }
/// ```
pub struct ReconciliationEngine<T: Transport> {
    shared: Arc<Shared<T>>,
}

impl<T: Transport> Clone for ReconciliationEngine<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Transport> std::fmt::Debug for ReconciliationEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("name", &self.shared.config.name)
            .field("flight", &self.shared.flight.state())
            .field("cycles", &self.cycles_completed())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> ReconciliationEngine<T> {
    /// Creates an engine with empty state and the configured candidates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Value`] if the configuration is out of range.
    pub fn new(config: HubConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let registry: AddressRegistry = config.seed_addresses().into_iter().collect();
        tracing::debug!(
            name = %config.name,
            addresses = registry.len(),
            "Creating reconciliation engine"
        );
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                transport,
                state: RwLock::new(HubState::new(registry)),
                events: EventBus::new(),
                flight: SingleFlight::new(),
                cycles: AtomicU64::new(0),
            }),
        })
    }

    /// Starts the reconciliation loop and, if configured, the discovery
    /// scanner. The first cycle starts at once.
    #[must_use]
    pub fn spawn(&self) -> EngineHandle<T> {
        let mut tasks = vec![tokio::spawn(self.clone().drive())];
        if let Some(source) = &self.shared.config.broadcast_source {
            let scanner = DiscoveryScanner::new(source.clone(), self.shared.config.device_timeout());
            tasks.push(tokio::spawn(self.clone().scan(scanner)));
        }
        EngineHandle {
            engine: self.clone(),
            tasks,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &HubConfig {
        &self.shared.config
    }

    /// Returns the controller name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// Subscribes to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.shared.events.subscribe()
    }

    /// Returns the event bus notifications are published on.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    /// Requests a cycle as soon as possible.
    ///
    /// While a cycle runs, any number of requests result in exactly one
    /// more cycle after it.
    pub fn trigger_reconciliation(&self) -> Trigger {
        let trigger = self.shared.flight.trigger();
        tracing::trace!(?trigger, "Reconciliation requested");
        trigger
    }

    /// Returns the scheduling state of the loop.
    #[must_use]
    pub fn flight_state(&self) -> FlightState {
        self.shared.flight.state()
    }

    /// Returns the number of cycles completed so far.
    #[must_use]
    pub fn cycles_completed(&self) -> u64 {
        self.shared.cycles.load(Ordering::Relaxed)
    }

    /// Runs one cycle now, outside the scheduler.
    ///
    /// For hosts that drive the engine themselves instead of calling
    /// [`ReconciliationEngine::spawn`]; must not overlap a spawned loop.
    pub async fn run_cycle(&self) -> CycleReport {
        let cycle = Cycle {
            transport: &self.shared.transport,
            state: &self.shared.state,
            events: &self.shared.events,
            timeout: self.shared.config.device_timeout(),
        };
        let report = cycle.run().await;
        self.shared.cycles.fetch_add(1, Ordering::Relaxed);
        report
    }

    /// Adds a candidate address. Returns `false` if it was already known.
    pub fn add_address(&self, address: Ipv4Addr) -> bool {
        self.shared.state.write().registry.add_address(address)
    }

    /// Returns every known address with its binding, in address order.
    #[must_use]
    pub fn bindings(&self) -> Vec<(Ipv4Addr, Option<Uid>)> {
        self.shared
            .state
            .read()
            .registry
            .iter()
            .map(|(address, uid)| (address, uid.cloned()))
            .collect()
    }

    /// Returns the public projection of a live device.
    #[must_use]
    pub fn device(&self, uid: &Uid) -> Option<PublicDevice> {
        self.shared.state.read().directory.export_public(uid)
    }

    /// Returns the public projection of every live device, sorted by uid.
    #[must_use]
    pub fn devices(&self) -> Vec<PublicDevice> {
        self.shared.state.read().directory.export_all()
    }

    /// Reports reachability of one uid, or of every device ever seen.
    #[must_use]
    pub fn status(&self, uid: Option<&Uid>) -> StatusReport {
        self.shared.state.read().directory.status(Utc::now(), uid)
    }

    /// Switches a live device once.
    ///
    /// Leaves `udata` untouched; see [`ReconciliationEngine::switch_power`]
    /// for the retrying variant that also records the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceOffline`] if the device is not live, a
    /// [`DeviceError`](crate::error::DeviceError) if its class cannot be
    /// switched, or the transport/protocol failure.
    pub async fn set_power(&self, uid: &Uid, on: bool, timeout: Duration) -> Result<bool> {
        self.live(uid)?.set_power(on, timeout).await
    }

    /// Queries the relay state of a live device.
    ///
    /// # Errors
    ///
    /// Same as [`ReconciliationEngine::set_power`].
    pub async fn check_power(&self, uid: &Uid, timeout: Duration) -> Result<bool> {
        self.live(uid)?.check_power(timeout).await
    }

    /// Reads the power draw of a live device.
    ///
    /// # Errors
    ///
    /// Same as [`ReconciliationEngine::set_power`].
    pub async fn check_energy(&self, uid: &Uid, timeout: Duration) -> Result<f64> {
        self.live(uid)?.check_energy(timeout).await
    }

    /// Switches a device, retrying through reconciliation.
    ///
    /// Makes up to `power_attempts` attempts. Each failure requests a
    /// cycle and waits up to 500 ms so a device that moved can be found
    /// again. On success the device's `udata` records the new state, an
    /// `update` is published and a cycle is requested.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownDevice`] if the uid was never contacted
    /// - a [`DeviceError`](crate::error::DeviceError) if the class cannot
    ///   be switched (not retried)
    /// - [`Error::DeviceTimeout`] if attempts ran out while the device is live
    /// - [`Error::DeviceOffline`] if attempts ran out and it is not
    pub async fn switch_power(&self, uid: &Uid, on: bool) -> Result<bool> {
        if !self.shared.state.read().directory.seen().contains(uid) {
            return Err(Error::UnknownDevice(uid.clone()));
        }
        let timeout = self.shared.config.device_timeout();

        for attempt in 1..=self.shared.config.power_attempts {
            match self.set_power(uid, on, timeout).await {
                Ok(power) => {
                    self.record_switch(uid, power);
                    self.trigger_reconciliation();
                    return Ok(power);
                }
                Err(e @ Error::Device(_)) => return Err(e),
                Err(e) => {
                    tracing::debug!(uid = %uid, attempt, error = %e, "Power switch attempt failed");
                    self.trigger_reconciliation();
                    let pause_ms = random_millis(0, SWITCH_BACKOFF_MS);
                    tokio::time::sleep(Duration::from_millis(pause_ms)).await;
                }
            }
        }

        if self.shared.state.read().directory.contains(uid) {
            tracing::warn!(uid = %uid, "Power switch timed out");
            Err(Error::DeviceTimeout(uid.clone()))
        } else {
            tracing::warn!(uid = %uid, "Power switch failed, device offline");
            Err(Error::DeviceOffline(uid.clone()))
        }
    }

    /// Releases every live transport handle.
    ///
    /// The Seen Ledger and the registry candidates survive.
    pub fn close_all(&self) {
        let devices: Vec<_> = {
            let mut state = self.shared.state.write();
            let devices: Vec<_> = state.directory.drain().collect();
            for device in &devices {
                state.registry.unbind(device.address());
            }
            devices
        };
        tracing::debug!(count = devices.len(), "Releasing device handles");
        for device in devices {
            device.close();
        }
    }

    fn live(&self, uid: &Uid) -> Result<Device<T::Handle>> {
        self.shared
            .state
            .read()
            .directory
            .get(uid)
            .cloned()
            .ok_or_else(|| Error::DeviceOffline(uid.clone()))
    }

    fn record_switch(&self, uid: &Uid, power: bool) {
        let now = Utc::now();
        let mut state = self.shared.state.write();
        if let Some(device) = state.directory.get_mut(uid) {
            let delta = device.data.record_switch(now, power);
            state.directory.touch(uid, now);
            self.shared.events.publish(DeviceEvent::update(uid.clone(), delta));
        }
    }

    /// Scheduler loop: one cycle at a time, reruns after a short pause,
    /// otherwise the update interval or an idle trigger starts the next.
    async fn drive(self) {
        let flight = &self.shared.flight;
        let interval = self.shared.config.update_interval();
        loop {
            flight.begin();
            self.run_cycle().await;

            if flight.finish() {
                let pause_ms = random_millis(RERUN_DELAY_MS.0, RERUN_DELAY_MS.1);
                tracing::debug!(pause_ms, "Rerun requested during cycle");
                tokio::time::sleep(Duration::from_millis(pause_ms)).await;
            } else {
                tokio::select! {
                    () = tokio::time::sleep(interval) => {}
                    () = flight.triggered() => {
                        tracing::debug!("Reconciliation triggered");
                    }
                }
            }
        }
    }

    /// Discovery loop: scan, admit unknown addresses, back off.
    async fn scan(self, mut scanner: DiscoveryScanner) {
        loop {
            let found = scanner.scan(&self.shared.transport).await;
            let added: Vec<_> = {
                let mut state = self.shared.state.write();
                found
                    .into_iter()
                    .filter(|address| state.registry.add_address(*address))
                    .collect()
            };
            for address in &added {
                tracing::info!(address = %address, "Discovered device at new address");
            }
            tokio::time::sleep(scanner.next_delay()).await;
        }
    }
}

/// A running engine.
///
/// Dereferences to the [`ReconciliationEngine`] for every operation.
/// Dropping the handle stops the loops and releases the live transport
/// handles; [`EngineHandle::shutdown`] does the same and also waits for the
/// loops to exit.
pub struct EngineHandle<T: Transport> {
    engine: ReconciliationEngine<T>,
    tasks: Vec<JoinHandle<()>>,
}

impl<T: Transport> EngineHandle<T> {
    /// Returns the engine driven by this handle.
    #[must_use]
    pub fn engine(&self) -> &ReconciliationEngine<T> {
        &self.engine
    }

    /// Stops the loops and releases every live transport handle.
    pub async fn shutdown(mut self) {
        let tasks = std::mem::take(&mut self.tasks);
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            // cancellation is the expected outcome
            let _ = task.await;
        }
        self.engine.close_all();
        tracing::debug!(name = %self.engine.name(), "Reconciliation engine stopped");
    }
}

impl<T: Transport> Drop for EngineHandle<T> {
    fn drop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.engine.close_all();
        tracing::debug!(name = %self.engine.name(), "Reconciliation engine dropped");
    }
}

impl<T: Transport> std::fmt::Debug for EngineHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("engine", &self.engine)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl<T: Transport> Deref for EngineHandle<T> {
    type Target = ReconciliationEngine<T>;

    fn deref(&self) -> &Self::Target {
        &self.engine
    }
}

fn random_millis(min: u64, max: u64) -> u64 {
    rand::rng().random_range(min..=max)
}

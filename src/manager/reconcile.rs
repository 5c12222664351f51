// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One reconciliation cycle.
//!
//! A cycle refreshes every bound device and probes every unbound address
//! concurrently, then re-probes the addresses of devices that failed their
//! refresh. Each task is a straight sequence of fallible steps that ends in
//! a tagged outcome; state is only touched once the remote calls of a task
//! have resolved, under a short write lock that is never held across an
//! await.

use std::net::Ipv4Addr;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::{join, join_all};
use parking_lot::RwLock;
use rand::Rng;

use crate::device::Device;
use crate::error::Error;
use crate::event::{DeviceEvent, EventBus};
use crate::protocol::{self, DeviceHandle, Transport};
use crate::types::Uid;

use super::directory::DeviceDirectory;
use super::registry::AddressRegistry;

/// Bounds of the startup jitter before each task, in milliseconds.
const JITTER_MS: (u64, u64) = (1, 200);

/// Registry and directory, guarded together so a transition is atomic.
pub(crate) struct HubState<H> {
    pub registry: AddressRegistry,
    pub directory: DeviceDirectory<H>,
}

impl<H: DeviceHandle> HubState<H> {
    pub fn new(registry: AddressRegistry) -> Self {
        Self {
            registry,
            directory: DeviceDirectory::new(),
        }
    }

    /// Removes a live device and frees its address.
    ///
    /// Returns `None` if `uid` is not live or is live through another handle.
    fn tear_down(&mut self, uid: &Uid, handle_of: Option<&Device<H>>) -> Option<Device<H>> {
        let live = self.directory.get(uid)?;
        if let Some(expected) = handle_of
            && !live.same_handle(expected)
        {
            return None;
        }
        let removed = self.directory.record_unreachable(uid)?;
        self.registry.unbind(removed.address());
        Some(removed)
    }
}

/// Outcome of a Refresh Task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Refresh {
    /// The device answered every probe.
    Alive,
    /// The device failed and was torn down; its address needs a re-probe.
    Failed(Ipv4Addr),
    /// The record was replaced while the probes were in flight.
    Superseded,
}

/// Outcome of a Discovery Probe Task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Admission {
    /// A device was found and entered the Directory.
    Admitted,
    /// Nothing usable answered; the address stays unbound.
    Rejected,
    /// The address was bound by someone else before the probe started.
    Skipped,
}

/// Counts of what one cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Devices that answered their refresh.
    pub refreshed: usize,
    /// Devices torn down after a failed refresh.
    pub failed: usize,
    /// Devices that entered the Directory, including retries.
    pub admitted: usize,
    /// Address probes that found nothing usable, including retries.
    pub rejected: usize,
}

/// Everything a cycle needs, borrowed from the engine.
pub(crate) struct Cycle<'a, T: Transport> {
    pub transport: &'a T,
    pub state: &'a RwLock<HubState<T::Handle>>,
    pub events: &'a EventBus,
    pub timeout: Duration,
}

impl<T: Transport> Cycle<'_, T> {
    /// Runs one full cycle: fan-out, join, then the bounded retry pass.
    pub async fn run(&self) -> CycleReport {
        let (known, candidates) = self.plan();
        tracing::debug!(
            known = known.len(),
            candidates = candidates.len(),
            "Starting reconciliation cycle"
        );

        let refreshes = join_all(known.into_iter().map(|device| self.refresh(device)));
        let probes = join_all(candidates.into_iter().map(|address| self.admit(address)));
        let (refreshed, admitted) = join(refreshes, probes).await;

        let mut report = CycleReport::default();
        let mut retries = Vec::new();
        for outcome in refreshed {
            match outcome {
                Refresh::Alive => report.refreshed += 1,
                Refresh::Failed(address) => {
                    report.failed += 1;
                    retries.push(address);
                }
                Refresh::Superseded => {}
            }
        }
        report.count(&admitted);

        if !retries.is_empty() {
            tracing::debug!(retries = retries.len(), "Re-probing failed devices");
            let retried = join_all(retries.into_iter().map(|address| self.admit(address))).await;
            report.count(&retried);
        }

        tracing::debug!(?report, "Reconciliation cycle complete");
        report
    }

    /// Splits the registry into live devices to refresh and addresses to probe.
    fn plan(&self) -> (Vec<Device<T::Handle>>, Vec<Ipv4Addr>) {
        let mut state = self.state.write();
        let mut known = Vec::new();
        let mut candidates = Vec::new();
        let mut orphans = Vec::new();

        for (address, uid) in state.registry.iter() {
            match uid.map(|uid| state.directory.get(uid)) {
                Some(Some(device)) => known.push(device.clone()),
                Some(None) => orphans.push(address),
                None => candidates.push(address),
            }
        }
        // a binding without a live record is treated as a free address
        for address in orphans {
            state.registry.unbind(address);
            candidates.push(address);
        }
        (known, candidates)
    }

    /// Refresh Task for a live device.
    async fn refresh(&self, device: Device<T::Handle>) -> Refresh {
        jitter().await;
        let uid = device.uid().clone();

        match device.observe(self.timeout).await {
            Ok(observation) => {
                let now = Utc::now();
                let mut state = self.state.write();
                let Some(live) = state
                    .directory
                    .get_mut(&uid)
                    .filter(|live| live.same_handle(&device))
                else {
                    return Refresh::Superseded;
                };
                let delta = live.data.apply(now, &observation);
                state.directory.touch(&uid, now);
                if let Some(delta) = delta {
                    self.events.publish(DeviceEvent::update(uid, delta));
                }
                Refresh::Alive
            }
            Err(e) => {
                let address = device.address();
                log_failure(&e, &uid, address, "Device refresh failed");
                let removed = {
                    let mut state = self.state.write();
                    let removed = state.tear_down(&uid, Some(&device));
                    if removed.is_some() {
                        self.events.publish(DeviceEvent::unreachable(uid.clone()));
                    }
                    removed
                };
                match removed {
                    Some(removed) => {
                        tracing::info!(uid = %uid, address = %address, "Device unreachable");
                        removed.close();
                        Refresh::Failed(address)
                    }
                    None => Refresh::Superseded,
                }
            }
        }
    }

    /// Discovery Probe Task for an unbound address.
    async fn admit(&self, address: Ipv4Addr) -> Admission {
        jitter().await;
        if self.state.read().registry.bound_to(address).is_some() {
            return Admission::Skipped;
        }

        let probe = self.transport.probe(address, self.timeout);
        let handle = match protocol::within(self.timeout, probe).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::trace!(address = %address, error = %e, "No device at address");
                return Admission::Rejected;
            }
        };
        let mut device = Device::new(handle);
        let uid = device.uid().clone();
        self.retire_stale(&uid);

        let observation = match device.observe(self.timeout).await {
            Ok(observation) => observation,
            Err(e) => {
                log_failure(&e, &uid, address, "Probe of new device failed");
                device.close();
                return Admission::Rejected;
            }
        };

        let now = Utc::now();
        device.data.apply(now, &observation);
        let exported = device.export();
        let reported = device.address();
        let admitted = {
            let mut state = self.state.write();
            let holder = state
                .registry
                .bound_to(reported)
                .filter(|holder| **holder != uid)
                .cloned();
            if let Some(holder) = holder {
                Err((device, holder))
            } else {
                state.registry.bind(reported, uid.clone());
                let replaced = state.directory.record_reachable(device);
                self.events.publish(DeviceEvent::reachable(exported));
                Ok(replaced)
            }
        };
        match admitted {
            Ok(replaced) => {
                if let Some(replaced) = replaced {
                    replaced.close();
                }
                tracing::info!(uid = %uid, address = %address, "Device reachable");
                Admission::Admitted
            }
            Err((device, holder)) => {
                tracing::warn!(
                    uid = %uid,
                    address = %address,
                    reported = %reported,
                    holder = %holder,
                    "Device reports an address held by another device"
                );
                device.close();
                Admission::Rejected
            }
        }
    }

    /// Tears down a live record of `uid` found at a different address.
    fn retire_stale(&self, uid: &Uid) {
        let stale = {
            let mut state = self.state.write();
            let stale = state.tear_down(uid, None);
            if stale.is_some() {
                self.events.publish(DeviceEvent::unreachable(uid.clone()));
            }
            stale
        };
        if let Some(stale) = stale {
            tracing::info!(
                uid = %uid,
                old_address = %stale.address(),
                "Device moved, retiring old record"
            );
            stale.close();
        }
    }
}

impl CycleReport {
    fn count(&mut self, admissions: &[Admission]) {
        for admission in admissions {
            match admission {
                Admission::Admitted => self.admitted += 1,
                Admission::Rejected => self.rejected += 1,
                Admission::Skipped => {}
            }
        }
    }
}

async fn jitter() {
    let millis = rand::rng().random_range(JITTER_MS.0..=JITTER_MS.1);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

fn log_failure(error: &Error, uid: &Uid, address: Ipv4Addr, message: &str) {
    if error.is_recoverable() {
        tracing::debug!(uid = %uid, address = %address, error = %error, "{message}");
    } else {
        tracing::warn!(uid = %uid, address = %address, error = %error, "{message}");
    }
}

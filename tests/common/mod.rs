// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory Device Transport for integration tests.
//!
//! A [`FakeNetwork`] holds simulated plugs keyed by address. Handles talk
//! to the plug with their uid at the address they were opened on; a plug
//! that moved or went offline stops answering them.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use blhub::command::{LEGACY_POWER_COMMAND, REQUEST_COMMAND};
use blhub::error::TransportError;
use blhub::protocol::{CallResponse, DeviceHandle, DeviceInfo, Transport};
use blhub::response::RESPONSE_COMMAND;
use blhub::types::{MacAddress, Uid};
use parking_lot::Mutex;

/// A simulated plug.
#[derive(Debug, Clone)]
pub struct FakePlug {
    pub info: DeviceInfo,
    pub online: bool,
    pub power: bool,
    /// Power draw in hundredths of a watt.
    pub centiwatts: u32,
    /// Upcoming power queries that fail.
    pub failing_power_queries: u32,
    /// Upcoming energy queries that fail.
    pub failing_energy_queries: u32,
    /// Upcoming switch commands that are rejected.
    pub failing_switches: u32,
    /// Every switch payload received.
    pub switches: Vec<(u16, Vec<u8>)>,
}

impl FakePlug {
    pub fn new(uid: &str, address: Ipv4Addr, class: &str) -> Self {
        let octets = address.octets();
        Self {
            info: DeviceInfo {
                uid: Uid::from(uid),
                name: format!("Plug {uid}"),
                address,
                port: 80,
                mac: MacAddress::from([0x34, 0xea, 0x34, octets[1], octets[2], octets[3]]),
                dev_class: class.into(),
                dev_type: class.to_uppercase(),
                dev_type_id: 0x947a,
            },
            online: true,
            power: false,
            centiwatts: 0,
            failing_power_queries: 0,
            failing_energy_queries: 0,
            failing_switches: 0,
            switches: Vec::new(),
        }
    }

    #[must_use]
    pub fn powered(mut self, on: bool, centiwatts: u32) -> Self {
        self.power = on;
        self.centiwatts = centiwatts;
        self
    }

    fn answer(&mut self, command: u16, payload: &[u8]) -> Result<CallResponse, TransportError> {
        let mut reply = vec![0u8; 16];
        let switching = matches!(
            (command, payload.first()),
            (REQUEST_COMMAND, Some(2)) | (LEGACY_POWER_COMMAND, _)
        );
        if switching && self.failing_switches > 0 {
            self.failing_switches -= 1;
            return Ok(CallResponse::error(RESPONSE_COMMAND));
        }
        match (command, payload.first().copied()) {
            (REQUEST_COMMAND, Some(1)) => {
                if self.failing_power_queries > 0 {
                    self.failing_power_queries -= 1;
                    return Err(TransportError::Timeout(1000));
                }
                reply[0] = 1;
                reply[4] = u8::from(self.power);
            }
            (REQUEST_COMMAND, Some(8)) => {
                if self.failing_energy_queries > 0 {
                    self.failing_energy_queries -= 1;
                    return Err(TransportError::Timeout(1000));
                }
                reply[0] = 8;
                reply[5..8].copy_from_slice(&energy_bytes(self.centiwatts));
            }
            (REQUEST_COMMAND, Some(2)) => {
                self.switches.push((command, payload.to_vec()));
                self.power = payload[4] != 0;
                reply[0] = 2;
            }
            (LEGACY_POWER_COMMAND, Some(state)) => {
                self.switches.push((command, payload.to_vec()));
                self.power = state != 0;
            }
            _ => return Err(TransportError::Malformed("unexpected request".to_string())),
        }
        Ok(CallResponse::ok(RESPONSE_COMMAND, reply))
    }
}

/// Encodes hundredths of a watt as the plug's three reversed hex-as-decimal bytes.
pub fn energy_bytes(centiwatts: u32) -> [u8; 3] {
    let digits = format!("{centiwatts:06}");
    let byte = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).unwrap();
    [byte(4..6), byte(2..4), byte(0..2)]
}

#[derive(Debug, Default)]
struct NetState {
    plugs: HashMap<Ipv4Addr, FakePlug>,
    probes: Vec<Ipv4Addr>,
    opened: usize,
    closed: usize,
    broadcasts: usize,
    probe_latency: Duration,
}

/// Shared simulated network; clones see the same plugs.
#[derive(Debug, Clone, Default)]
pub struct FakeNetwork {
    state: Arc<Mutex<NetState>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plug(self, plug: FakePlug) -> Self {
        self.insert(plug);
        self
    }

    pub fn insert(&self, plug: FakePlug) {
        self.state.lock().plugs.insert(plug.info.address, plug);
    }

    /// Places a plug at `address` while it keeps reporting its own address.
    pub fn insert_at(&self, address: Ipv4Addr, plug: FakePlug) {
        self.state.lock().plugs.insert(address, plug);
    }

    /// Runs `f` on the plug with `uid`.
    pub fn update<R>(&self, uid: &str, f: impl FnOnce(&mut FakePlug) -> R) -> R {
        let mut state = self.state.lock();
        let plug = state
            .plugs
            .values_mut()
            .find(|plug| plug.info.uid.as_str() == uid)
            .expect("unknown plug");
        f(plug)
    }

    /// Moves the plug with `uid` to a new address.
    pub fn relocate(&self, uid: &str, address: Ipv4Addr) {
        let mut state = self.state.lock();
        let old = state
            .plugs
            .iter()
            .find(|(_, plug)| plug.info.uid.as_str() == uid)
            .map(|(address, _)| *address)
            .expect("unknown plug");
        let mut plug = state.plugs.remove(&old).expect("plug present");
        plug.info.address = address;
        state.plugs.insert(address, plug);
    }

    pub fn set_probe_latency(&self, latency: Duration) {
        self.state.lock().probe_latency = latency;
    }

    pub fn probes_at(&self, address: Ipv4Addr) -> usize {
        self.state.lock().probes.iter().filter(|a| **a == address).count()
    }

    pub fn open_handles(&self) -> usize {
        let state = self.state.lock();
        state.opened - state.closed
    }

    pub fn broadcasts(&self) -> usize {
        self.state.lock().broadcasts
    }

    pub fn switches(&self, uid: &str) -> Vec<(u16, Vec<u8>)> {
        self.update(uid, |plug| plug.switches.clone())
    }

    fn open(&self, at: Ipv4Addr, info: DeviceInfo) -> FakeHandle {
        self.state.lock().opened += 1;
        FakeHandle {
            at,
            info,
            network: self.clone(),
            closed: Mutex::new(false),
        }
    }
}

impl Transport for FakeNetwork {
    type Handle = FakeHandle;

    async fn probe(&self, address: Ipv4Addr, timeout: Duration) -> Result<FakeHandle, TransportError> {
        let latency = {
            let mut state = self.state.lock();
            state.probes.push(address);
            state.probe_latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let info = {
            let state = self.state.lock();
            state
                .plugs
                .get(&address)
                .filter(|plug| plug.online)
                .map(|plug| plug.info.clone())
        };
        match info {
            Some(info) => Ok(self.open(address, info)),
            None => Err(TransportError::Timeout(millis(timeout))),
        }
    }

    async fn discover(
        &self,
        _timeout: Duration,
        _broadcast_source: &str,
    ) -> Result<Vec<FakeHandle>, TransportError> {
        let infos: Vec<_> = {
            let mut state = self.state.lock();
            state.broadcasts += 1;
            state
                .plugs
                .iter()
                .filter(|(_, plug)| plug.online)
                .map(|(address, plug)| (*address, plug.info.clone()))
                .collect()
        };
        Ok(infos
            .into_iter()
            .map(|(address, info)| self.open(address, info))
            .collect())
    }
}

/// Handle to a simulated plug.
#[derive(Debug)]
pub struct FakeHandle {
    at: Ipv4Addr,
    info: DeviceInfo,
    network: FakeNetwork,
    closed: Mutex<bool>,
}

impl DeviceHandle for FakeHandle {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    async fn call(
        &self,
        command: u16,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<CallResponse, TransportError> {
        if *self.closed.lock() {
            return Err(TransportError::Closed);
        }
        let mut state = self.network.state.lock();
        match state.plugs.get_mut(&self.at) {
            Some(plug) if plug.online && plug.info.uid == self.info.uid => {
                plug.answer(command, payload)
            }
            _ => Err(TransportError::Timeout(millis(timeout))),
        }
    }

    fn close(&self) {
        let mut closed = self.closed.lock();
        if !*closed {
            *closed = true;
            self.network.state.lock().closed += 1;
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

pub fn addr(last: u8) -> Ipv4Addr {
    Ipv4Addr::new(192, 168, 1, last)
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device Directory and Seen Ledger.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::device::{Device, PublicDevice};
use crate::protocol::DeviceHandle;
use crate::types::Uid;

use super::status::{DeviceStatus, StatusReport};

/// Last successful contact per uid.
///
/// Entries are only ever inserted or moved forward, never removed, so a
/// device that went away stays distinguishable from one never seen.
#[derive(Debug, Clone, Default)]
pub struct SeenLedger {
    entries: HashMap<Uid, DateTime<Utc>>,
}

impl SeenLedger {
    /// Records a contact with `uid` at `now`.
    pub fn touch(&mut self, uid: &Uid, now: DateTime<Utc>) {
        self.entries.insert(uid.clone(), now);
    }

    /// Returns the last contact with `uid`.
    #[must_use]
    pub fn last_seen(&self, uid: &Uid) -> Option<DateTime<Utc>> {
        self.entries.get(uid).copied()
    }

    /// Returns `true` if `uid` was ever contacted.
    #[must_use]
    pub fn contains(&self, uid: &Uid) -> bool {
        self.entries.contains_key(uid)
    }

    /// Iterates over every contacted uid.
    pub fn iter(&self) -> impl Iterator<Item = (&Uid, DateTime<Utc>)> {
        self.entries.iter().map(|(uid, seen)| (uid, *seen))
    }
}

/// Live devices keyed by uid, plus the ledger of past contacts.
pub struct DeviceDirectory<H> {
    devices: HashMap<Uid, Device<H>>,
    seen: SeenLedger,
}

impl<H: DeviceHandle> DeviceDirectory<H> {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            devices: HashMap::new(),
            seen: SeenLedger::default(),
        }
    }

    /// Inserts a live device and records the contact in the ledger.
    ///
    /// Returns the record it replaced, if any.
    pub fn record_reachable(&mut self, device: Device<H>) -> Option<Device<H>> {
        if let Some(seen) = device.data.last_seen {
            self.seen.touch(device.uid(), seen);
        }
        self.devices.insert(device.uid().clone(), device)
    }

    /// Removes a device from the directory. Its ledger entry stays.
    pub fn record_unreachable(&mut self, uid: &Uid) -> Option<Device<H>> {
        self.devices.remove(uid)
    }

    /// Records a contact with a live device.
    pub fn touch(&mut self, uid: &Uid, now: DateTime<Utc>) {
        self.seen.touch(uid, now);
    }

    /// Returns the live record for `uid`.
    #[must_use]
    pub fn get(&self, uid: &Uid) -> Option<&Device<H>> {
        self.devices.get(uid)
    }

    /// Returns the live record for `uid` mutably.
    pub fn get_mut(&mut self, uid: &Uid) -> Option<&mut Device<H>> {
        self.devices.get_mut(uid)
    }

    /// Returns `true` if `uid` is live.
    #[must_use]
    pub fn contains(&self, uid: &Uid) -> bool {
        self.devices.contains_key(uid)
    }

    /// Returns the ledger of past contacts.
    #[must_use]
    pub fn seen(&self) -> &SeenLedger {
        &self.seen
    }

    /// Iterates over live devices.
    pub fn iter(&self) -> impl Iterator<Item = &Device<H>> {
        self.devices.values()
    }

    /// Returns the number of live devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if no device is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Returns the public projection of `uid`, if live.
    #[must_use]
    pub fn export_public(&self, uid: &Uid) -> Option<PublicDevice> {
        self.get(uid).map(Device::export)
    }

    /// Returns the public projection of every live device, sorted by uid.
    #[must_use]
    pub fn export_all(&self) -> Vec<PublicDevice> {
        let mut devices: Vec<_> = self.iter().map(Device::export).collect();
        devices.sort_by(|a, b| a.uid.cmp(&b.uid));
        devices
    }

    /// Removes every live device, leaving the ledger intact.
    pub fn drain(&mut self) -> impl Iterator<Item = Device<H>> + '_ {
        self.devices.drain().map(|(_, device)| device)
    }

    /// Builds a status report for one uid, or for every device ever seen.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>, uid: Option<&Uid>) -> StatusReport {
        let mut report = StatusReport::new(now);
        match uid {
            Some(uid) => {
                report.insert(uid.clone(), self.status_of(uid));
            }
            None => {
                for device in self.iter() {
                    report.insert(device.uid().clone(), DeviceStatus::reachable(device.export()));
                }
                for (uid, last_seen) in self.seen.iter() {
                    if !self.contains(uid) {
                        report.insert(uid.clone(), DeviceStatus::Unreachable { last_seen });
                    }
                }
            }
        }
        report
    }

    fn status_of(&self, uid: &Uid) -> DeviceStatus {
        if let Some(device) = self.get(uid) {
            DeviceStatus::reachable(device.export())
        } else if let Some(last_seen) = self.seen.last_seen(uid) {
            DeviceStatus::Unreachable { last_seen }
        } else {
            DeviceStatus::Unknown
        }
    }
}

impl<H: DeviceHandle> std::fmt::Debug for DeviceDirectory<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceDirectory")
            .field("devices", &self.devices)
            .field("seen", &self.seen)
            .finish()
    }
}

impl<H: DeviceHandle> Default for DeviceDirectory<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use super::*;
    use crate::error::TransportError;
    use crate::protocol::{CallResponse, DeviceInfo};
    use crate::types::MacAddress;

    struct StubHandle(DeviceInfo);

    impl DeviceHandle for StubHandle {
        fn info(&self) -> &DeviceInfo {
            &self.0
        }

        async fn call(
            &self,
            _command: u16,
            _payload: &[u8],
            _timeout: Duration,
        ) -> Result<CallResponse, TransportError> {
            Err(TransportError::Closed)
        }

        fn close(&self) {}
    }

    fn device(uid: &str, seen_ms: Option<i64>) -> Device<StubHandle> {
        let mut device = Device::new(StubHandle(DeviceInfo {
            uid: Uid::from(uid),
            name: uid.to_uppercase(),
            address: Ipv4Addr::new(10, 0, 0, 9),
            port: 80,
            mac: MacAddress::from([0; 6]),
            dev_class: "sp2".into(),
            dev_type: "SP2".to_string(),
            dev_type_id: 0x2711,
        }));
        device.data.last_seen = seen_ms.and_then(DateTime::from_timestamp_millis);
        device
    }

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn reachable_devices_enter_the_ledger() {
        let mut directory = DeviceDirectory::new();
        assert!(directory.record_reachable(device("a", Some(10))).is_none());

        assert!(directory.contains(&Uid::from("a")));
        assert_eq!(directory.seen().last_seen(&Uid::from("a")), Some(at(10)));
    }

    #[test]
    fn unreachable_keeps_ledger_entry() {
        let mut directory = DeviceDirectory::new();
        directory.record_reachable(device("a", Some(10)));

        let removed = directory.record_unreachable(&Uid::from("a"));
        assert!(removed.is_some());
        assert!(directory.is_empty());
        assert!(directory.seen().contains(&Uid::from("a")));
    }

    #[test]
    fn status_distinguishes_unreachable_from_unknown() {
        let mut directory = DeviceDirectory::new();
        directory.record_reachable(device("a", Some(10)));
        directory.record_reachable(device("b", Some(20)));
        directory.record_unreachable(&Uid::from("b"));

        let report = directory.status(at(30), None);
        assert_eq!(report.devices.len(), 2);
        assert!(matches!(
            report.get(&Uid::from("a")),
            Some(DeviceStatus::Reachable { .. })
        ));
        assert_eq!(
            report.get(&Uid::from("b")),
            Some(&DeviceStatus::Unreachable { last_seen: at(20) })
        );

        let single = directory.status(at(30), Some(&Uid::from("zz")));
        assert_eq!(single.get(&Uid::from("zz")), Some(&DeviceStatus::Unknown));
    }

    #[test]
    fn export_all_is_sorted() {
        let mut directory = DeviceDirectory::new();
        directory.record_reachable(device("b", None));
        directory.record_reachable(device("a", None));

        let uids: Vec<_> = directory
            .export_all()
            .into_iter()
            .map(|d| d.uid.to_string())
            .collect();
        assert_eq!(uids, ["a", "b"]);
    }
}

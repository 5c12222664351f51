// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only device projection.

use std::net::Ipv4Addr;

use serde::{Serialize, Serializer};

use crate::capabilities::DeviceClass;
use crate::protocol::DeviceInfo;
use crate::state::DeviceData;
use crate::types::{MacAddress, Uid};

/// Public view of a live device, without its transport handle.
///
/// This is the `device` object of `reachable` notifications and of the
/// status report.
///
/// # Examples
///
/// ```
/// use blhub::device::PublicDevice;
/// use blhub::protocol::DeviceInfo;
/// use blhub::state::DeviceData;
/// use blhub::types::{MacAddress, Uid};
///
/// let info = DeviceInfo {
///     uid: Uid::from("34ea34b4c2f1"),
///     name: "Kitchen".to_string(),
///     address: "192.168.1.20".parse().unwrap(),
///     port: 80,
///     mac: MacAddress::from([0x34, 0xea, 0x34, 0xb4, 0xc2, 0xf1]),
///     dev_class: "sp3s".into(),
///     dev_type: "SP3S-EU".to_string(),
///     dev_type_id: 0x947a,
/// };
/// let public = PublicDevice::new(&info, &DeviceData::new());
/// let json = serde_json::to_value(&public).unwrap();
/// assert_eq!(json["mac"], "34:ea:34:b4:c2:f1");
/// assert_eq!(json["devTypeId"], "0x947a");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicDevice {
    /// Stable identifier.
    pub uid: Uid,
    /// Name stored on the device.
    pub name: String,
    /// Current network address.
    pub address: Ipv4Addr,
    /// Current UDP port.
    pub port: u16,
    /// Hardware address.
    pub mac: MacAddress,
    /// Device family.
    pub dev_class: DeviceClass,
    /// Model name.
    pub dev_type: String,
    /// Numeric model identifier, rendered as `0x` plus four hex digits.
    #[serde(serialize_with = "serialize_type_id")]
    pub dev_type_id: u16,
    /// Observed sub-state.
    pub udata: DeviceData,
}

impl PublicDevice {
    /// Projects a device identity and its observed state.
    #[must_use]
    pub fn new(info: &DeviceInfo, data: &DeviceData) -> Self {
        Self {
            uid: info.uid.clone(),
            name: info.name.clone(),
            address: info.address,
            port: info.port,
            mac: info.mac.clone(),
            dev_class: info.dev_class.clone(),
            dev_type: info.dev_type.clone(),
            dev_type_id: info.dev_type_id,
            udata: data.clone(),
        }
    }
}

// serde passes fields by reference
#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_type_id<S: Serializer>(id: &u16, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{id:#06x}"))
}

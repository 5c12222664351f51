// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Live device records.
//!
//! A [`Device`] pairs a connected transport handle with the sub-state the
//! hub has observed. It knows how to run the probes its class supports and
//! how to project itself for the outside world ([`PublicDevice`]).

mod export;

pub use export::PublicDevice;

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use crate::capabilities::{Capabilities, DeviceClass};
use crate::command::{EnergyCommand, PowerCommand};
use crate::error::{DeviceError, Error, Result};
use crate::protocol::{self, DeviceHandle, DeviceInfo};
use crate::response::{EnergyResponse, PowerResponse, SwitchAck};
use crate::state::{DeviceData, Observation};
use crate::types::Uid;

/// A device with a live transport handle.
///
/// Cloning is cheap: clones share the handle.
///
/// # Examples
///
/// ```ignore
/// let device = Device::new(handle);
/// if device.capabilities().power_get {
///     let on = device.check_power(Duration::from_secs(1)).await?;
/// }
/// ```
pub struct Device<H> {
    handle: Arc<H>,
    /// Observed sub-state.
    pub data: DeviceData,
}

impl<H: DeviceHandle> Device<H> {
    /// Wraps a freshly probed handle. The device starts unseen.
    #[must_use]
    pub fn new(handle: H) -> Self {
        Self {
            handle: Arc::new(handle),
            data: DeviceData::new(),
        }
    }

    /// Returns the identity reported by the transport.
    #[must_use]
    pub fn info(&self) -> &DeviceInfo {
        self.handle.info()
    }

    /// Returns the device identifier.
    #[must_use]
    pub fn uid(&self) -> &Uid {
        &self.info().uid
    }

    /// Returns the current network address.
    #[must_use]
    pub fn address(&self) -> Ipv4Addr {
        self.info().address
    }

    /// Returns the device class.
    #[must_use]
    pub fn class(&self) -> &DeviceClass {
        &self.info().dev_class
    }

    /// Returns the capabilities implied by the device class.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.class().capabilities()
    }

    /// Queries the relay state.
    ///
    /// # Errors
    ///
    /// Fails with [`DeviceError::UnsupportedCapability`] for classes without
    /// power queries, or with the transport/protocol failure.
    pub async fn check_power(&self, timeout: Duration) -> Result<bool> {
        self.require(self.capabilities().power_get, "power check")?;
        let response = protocol::send(self.handle.as_ref(), &PowerCommand::Query, timeout).await?;
        Ok(PowerResponse::decode(&response)?.is_on())
    }

    /// Reads the current power draw in watts.
    ///
    /// # Errors
    ///
    /// Fails with [`DeviceError::UnsupportedCapability`] for classes without
    /// energy metering, or with the transport/protocol failure.
    pub async fn check_energy(&self, timeout: Duration) -> Result<f64> {
        self.require(self.capabilities().energy, "energy check")?;
        let response = protocol::send(self.handle.as_ref(), &EnergyCommand, timeout).await?;
        Ok(EnergyResponse::decode(&response)?.watts())
    }

    /// Switches the relay and returns the requested state once acknowledged.
    ///
    /// Does not touch [`Device::data`].
    ///
    /// # Errors
    ///
    /// Fails with [`DeviceError::UnsupportedCapability`] for classes that
    /// cannot be switched, or with the transport/protocol failure.
    pub async fn set_power(&self, on: bool, timeout: Duration) -> Result<bool> {
        let Some(format) = self.capabilities().power_set else {
            return Err(self.unsupported("power set"));
        };
        let command = PowerCommand::set(on, format);
        let response = protocol::send(self.handle.as_ref(), &command, timeout).await?;
        SwitchAck::decode(&response)?;
        Ok(on)
    }

    /// Runs every probe the device class supports.
    ///
    /// Energy is only read while the relay is on; a metering plug that is
    /// off reports `0.0` watts without being asked.
    ///
    /// # Errors
    ///
    /// Returns the first transport or protocol failure.
    pub async fn observe(&self, timeout: Duration) -> Result<Observation> {
        let caps = self.capabilities();
        let power = if caps.power_get {
            Some(self.check_power(timeout).await?)
        } else {
            None
        };
        let energy = match (caps.energy, power) {
            (false, _) => None,
            (true, Some(true)) => Some(self.check_energy(timeout).await?),
            (true, _) => Some(0.0),
        };
        Ok(Observation { power, energy })
    }

    /// Returns `true` if both records share one transport handle.
    #[must_use]
    pub fn same_handle(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handle, &other.handle)
    }

    /// Releases the transport handle.
    pub fn close(&self) {
        tracing::trace!(uid = %self.uid(), "Closing device handle");
        self.handle.close();
    }

    /// Returns the read-only projection of this device.
    #[must_use]
    pub fn export(&self) -> PublicDevice {
        PublicDevice::new(self.info(), &self.data)
    }

    fn require(&self, supported: bool, capability: &'static str) -> Result<()> {
        if supported {
            Ok(())
        } else {
            Err(self.unsupported(capability))
        }
    }

    fn unsupported(&self, capability: &'static str) -> Error {
        DeviceError::UnsupportedCapability {
            capability,
            class: self.class().to_string(),
        }
        .into()
    }
}

impl<H> Clone for Device<H> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
            data: self.data.clone(),
        }
    }
}

impl<H: DeviceHandle> std::fmt::Debug for Device<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("uid", self.uid())
            .field("address", &self.address())
            .field("class", self.class())
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

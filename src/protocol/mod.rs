// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary with the Device Transport.
//!
//! The transport performs UDP discovery and encrypted request/response calls.
//! Its internals are a black box to the hub: given an address and a timeout
//! it returns a connected [`DeviceHandle`] or fails with a [`TransportError`].
//!
//! # Traits
//!
//! - [`Transport`]: probes a single address or broadcasts a discovery probe
//! - [`DeviceHandle`]: a connected device that answers [`DeviceHandle::call`]
//!
//! Both traits return `Send` futures so the engine can drive them from a
//! spawned task.

use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::capabilities::DeviceClass;
use crate::command::Command;
use crate::error::TransportError;
use crate::types::{MacAddress, Uid};

/// Outcome flag of a device call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    /// The device accepted the request.
    Ok,
    /// The device reported an error.
    Error,
}

/// Decrypted answer to a device call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResponse {
    /// Status reported by the device.
    pub status: CallStatus,
    /// Response command code.
    pub command: u16,
    /// Response payload.
    pub payload: Vec<u8>,
}

impl CallResponse {
    /// Creates a successful response.
    #[must_use]
    pub fn ok(command: u16, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status: CallStatus::Ok,
            command,
            payload: payload.into(),
        }
    }

    /// Creates an error response.
    #[must_use]
    pub fn error(command: u16) -> Self {
        Self {
            status: CallStatus::Error,
            command,
            payload: Vec::new(),
        }
    }
}

/// Identity and location of a device, as established by a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
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
    /// Numeric model identifier.
    pub dev_type_id: u16,
}

/// A connected device.
///
/// A handle is shared between the reconciliation loop and concurrent power
/// commands, so every method takes `&self`.
pub trait DeviceHandle: Send + Sync + 'static {
    /// Returns the identity the device reported when the handle was opened.
    fn info(&self) -> &DeviceInfo;

    /// Sends an encrypted request and waits for its answer.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on timeout, refusal or an undecodable
    /// answer.
    fn call(
        &self,
        command: u16,
        payload: &[u8],
        timeout: Duration,
    ) -> impl Future<Output = Result<CallResponse, TransportError>> + Send;

    /// Releases the handle. Further calls fail.
    fn close(&self);
}

/// The Device Transport.
pub trait Transport: Send + Sync + 'static {
    /// Handle type produced by probes.
    type Handle: DeviceHandle;

    /// Establishes a handle to the device at `address`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if no device answers in time.
    fn probe(
        &self,
        address: Ipv4Addr,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Handle, TransportError>> + Send;

    /// Broadcasts a discovery probe from `broadcast_source` and returns a
    /// handle for every device that answered within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the broadcast cannot be sent.
    fn discover(
        &self,
        timeout: Duration,
        broadcast_source: &str,
    ) -> impl Future<Output = Result<Vec<Self::Handle>, TransportError>> + Send;
}

/// Sends a typed command over a handle.
///
/// The call is abandoned once `timeout` elapses, whatever the handle does
/// with the deadline it is given.
///
/// # Errors
///
/// Returns the transport failure unchanged, or [`TransportError::Timeout`]
/// if no answer arrived in time.
pub async fn send<H, C>(
    handle: &H,
    command: &C,
    timeout: Duration,
) -> Result<CallResponse, TransportError>
where
    H: DeviceHandle,
    C: Command + Sync,
{
    let payload = command.payload();
    tracing::trace!(
        uid = %handle.info().uid,
        command = format_args!("{:#04x}", command.command_code()),
        payload = ?payload,
        "Sending device command"
    );
    within(timeout, handle.call(command.command_code(), &payload, timeout)).await
}

/// Runs a transport operation with a hard deadline.
///
/// # Errors
///
/// Returns [`TransportError::Timeout`] if `operation` is still pending after
/// `timeout`, or its own failure.
pub async fn within<F, R>(timeout: Duration, operation: F) -> Result<R, TransportError>
where
    F: Future<Output = Result<R, TransportError>>,
{
    tokio::time::timeout(timeout, operation)
        .await
        .unwrap_or_else(|_| Err(TransportError::Timeout(millis(timeout))))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

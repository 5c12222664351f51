// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the hub.
//!
//! The hierarchy mirrors how failures are handled:
//!
//! - [`TransportError`] and [`ProtocolError`] are recoverable. The
//!   reconciliation loop absorbs them by tearing the device down and
//!   re-probing its address.
//! - [`DeviceError`] and the offline/unknown variants of [`Error`] are caller
//!   errors and are surfaced immediately, never retried.
//! - [`ValueError`] covers configuration validation.

use thiserror::Error;

use crate::types::Uid;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The Device Transport failed to deliver a request or its answer.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The device answered, but not with what the query expects.
    #[error("protocol mismatch: {0}")]
    Protocol(#[from] ProtocolError),

    /// The device cannot perform the requested operation.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// A configuration value was rejected.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The device is not currently in the directory.
    #[error("device {0} is not online")]
    DeviceOffline(Uid),

    /// The device has never been contacted successfully.
    #[error("device {0} is unknown")]
    UnknownDevice(Uid),

    /// The device stayed reachable but never acknowledged the command.
    #[error("device {0} timed out")]
    DeviceTimeout(Uid),
}

impl Error {
    /// Returns `true` for failures that reconciliation absorbs by retrying.
    ///
    /// Transport failures and protocol mismatches are recoverable; everything
    /// else is a caller error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Protocol(_))
    }
}

/// Failures reported by the Device Transport.
///
/// The reconciliation loop does not distinguish between these; they exist so
/// log lines say what happened.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No answer arrived within the timeout.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The device could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The low-level response could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The handle was already released.
    #[error("device handle closed")]
    Closed,
}

/// A well-formed response that does not answer the query that was sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The device reported an error status.
    #[error("error response from device")]
    ErrorStatus,

    /// The response command code is not the expected one.
    #[error("unexpected response command {actual:#06x}, expected {expected:#06x}")]
    UnexpectedCommand {
        /// The expected response command code.
        expected: u16,
        /// The command code that was received.
        actual: u16,
    },

    /// The payload is shorter than a probe response.
    #[error("truncated response payload: {len} bytes, expected at least {min}")]
    Truncated {
        /// Actual payload length.
        len: usize,
        /// Minimum payload length.
        min: usize,
    },

    /// The payload answers a different query parameter.
    #[error("unexpected response parameter {actual}, expected {expected}")]
    UnexpectedParameter {
        /// The query parameter tag that was sent.
        expected: u8,
        /// The tag found in the response.
        actual: u8,
    },

    /// The energy reading is not six decimal digits.
    #[error("unexpected format in energy reading: {0:?}")]
    EnergyFormat(String),
}

/// Errors related to device operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device class does not support the requested capability.
    #[error("{capability} not supported by device class {class}")]
    UnsupportedCapability {
        /// The capability that was requested.
        capability: &'static str,
        /// The device class tag.
        class: String,
    },
}

/// Errors related to configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("{field} value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// The configuration field.
        field: &'static str,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
        /// The actual value that was provided.
        actual: u64,
    },

    /// An IPv4 address could not be parsed.
    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),

    /// An address range is malformed or too large.
    #[error("invalid address range: {0}")]
    InvalidRange(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

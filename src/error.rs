// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `esplink` library.
//!
//! Two families live here:
//!
//! - [`DeviceFailure`] and its [`FailureKind`] describe what went wrong with a
//!   single device request. They are carried as values inside
//!   [`DeviceResult`](crate::response::DeviceResult) and never cross the
//!   client boundary as a propagated error.
//! - [`Error`] and [`ValueError`] cover fallible construction: building a
//!   transport, loading configuration, validating inputs.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP client could not be created.
    #[cfg(feature = "http")]
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The requested transport is not compiled into this build.
    #[error("transport {0} is not available in this build")]
    TransportUnavailable(&'static str),
}

/// Errors related to input validation.
///
/// Every client operation validates its inputs before any network I/O takes
/// place; a `ValueError` becomes a [`FailureKind::Validation`] failure with
/// zero latency.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The device address is not an IPv4 dotted quad.
    #[error("invalid device address '{0}': expected an IPv4 address such as 192.168.1.100")]
    InvalidAddress(String),

    /// The firmware URL is not an absolute http(s) URL.
    #[error("invalid firmware URL '{url}': {reason}")]
    InvalidFirmwareUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A device variable name is empty or contains unsupported characters.
    #[error("invalid variable name '{0}': use ASCII letters, digits and '_'")]
    InvalidVariableName(String),

    /// A variable update was requested without any variables.
    #[error("no variables to update")]
    NoVariables,
}

/// Classification of a failed device request.
///
/// The set is closed: every failure path in a [`DeviceClient`] resolves to
/// exactly one of these.
///
/// [`DeviceClient`]: crate::protocol::DeviceClient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Input was rejected before any request was sent.
    Validation,
    /// No response could be obtained from the device.
    Network,
    /// The request did not complete within its timeout.
    Timeout,
    /// The device answered with a non-2xx status.
    Http,
    /// The caller cancelled the request.
    Cancelled,
    /// Anything else.
    Unknown,
}

impl FailureKind {
    /// Returns the lowercase name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Http => "http",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }

    /// Returns `true` if this failure means the device could not be reached.
    ///
    /// Only these kinds downgrade a connection to offline.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }

    /// Returns `true` if the device demonstrably answered the request.
    #[must_use]
    pub const fn device_responded(&self) -> bool {
        matches!(self, Self::Http)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed device request.
///
/// # Examples
///
/// ```
/// use esplink::error::{DeviceFailure, FailureKind};
/// use std::time::Duration;
///
/// let failure = DeviceFailure::http(404, "Not Found", Duration::from_millis(12));
/// assert_eq!(failure.kind(), FailureKind::Http);
/// assert_eq!(failure.http_status(), Some(404));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DeviceFailure {
    kind: FailureKind,
    message: String,
    latency: Duration,
    http_status: Option<u16>,
}

impl DeviceFailure {
    /// Creates a failure of the given kind.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>, latency: Duration) -> Self {
        Self {
            kind,
            message: message.into(),
            latency,
            http_status: None,
        }
    }

    /// Creates a validation failure. Validation never touches the network,
    /// so its latency is always zero.
    #[must_use]
    pub fn validation(error: &ValueError) -> Self {
        Self::new(FailureKind::Validation, error.to_string(), Duration::ZERO)
    }

    /// Creates a timeout failure.
    #[must_use]
    pub fn timeout(limit: Duration, latency: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("request timed out after {} ms", limit.as_millis()),
            latency,
        )
    }

    /// Creates a cancellation failure.
    #[must_use]
    pub fn cancelled(latency: Duration) -> Self {
        Self::new(FailureKind::Cancelled, "request cancelled", latency)
    }

    /// Creates a network failure.
    #[must_use]
    pub fn network(detail: impl fmt::Display, latency: Duration) -> Self {
        Self::new(FailureKind::Network, format!("network error: {detail}"), latency)
    }

    /// Creates a failure for a non-2xx response.
    #[must_use]
    pub fn http(status: u16, detail: &str, latency: Duration) -> Self {
        let detail = detail.trim();
        let message = if detail.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {detail}")
        };
        Self {
            kind: FailureKind::Http,
            message,
            latency,
            http_status: Some(status),
        }
    }

    /// Creates a failure for an unexpected condition.
    #[must_use]
    pub fn unknown(detail: impl fmt::Display, latency: Duration) -> Self {
        Self::new(FailureKind::Unknown, format!("unexpected error: {detail}"), latency)
    }

    /// Returns the failure classification.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the time spent before the failure was determined.
    #[must_use]
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Returns the HTTP status, for [`FailureKind::Http`] failures.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }
}

impl From<ValueError> for DeviceFailure {
    fn from(error: ValueError) -> Self {
        Self::validation(&error)
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

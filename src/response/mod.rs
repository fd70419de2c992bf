// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalized outcome of a device request.

use std::time::Duration;

use crate::error::{DeviceFailure, FailureKind};
use crate::types::LedState;

/// Result of exactly one device request.
///
/// Both variants carry the request latency, measured from just before the
/// request was sent until its outcome was known. Validation failures report
/// zero latency.
///
/// # Examples
///
/// ```
/// use esplink::response::DeviceResult;
/// use esplink::types::LedState;
/// use std::time::Duration;
///
/// let result = DeviceResult::success("LED is ON", Duration::from_millis(42));
/// assert!(result.is_success());
/// assert_eq!(result.latency_millis(), 42);
/// assert_eq!(result.led_state(), Some(LedState::On));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceResult {
    /// The device answered with a 2xx status.
    Success {
        /// Raw response body.
        body: String,
        /// Request latency.
        latency: Duration,
    },
    /// The request failed.
    Failure(DeviceFailure),
}

impl DeviceResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(body: impl Into<String>, latency: Duration) -> Self {
        Self::Success {
            body: body.into(),
            latency,
        }
    }

    /// Returns `true` on success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the response body on success.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Success { body, .. } => Some(body),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&DeviceFailure> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Returns the failure kind, if any.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure().map(DeviceFailure::kind)
    }

    /// Returns the request latency.
    #[must_use]
    pub fn latency(&self) -> Duration {
        match self {
            Self::Success { latency, .. } => *latency,
            Self::Failure(failure) => failure.latency(),
        }
    }

    /// Returns the request latency in whole milliseconds.
    #[must_use]
    pub fn latency_millis(&self) -> u64 {
        u64::try_from(self.latency().as_millis()).unwrap_or(u64::MAX)
    }

    /// Returns the LED state reported in a successful body.
    #[must_use]
    pub fn led_state(&self) -> Option<LedState> {
        self.body().and_then(LedState::from_response)
    }

    /// Converts into a standard `Result`.
    ///
    /// # Errors
    ///
    /// Returns the `DeviceFailure` if the request failed.
    pub fn into_result(self) -> Result<String, DeviceFailure> {
        match self {
            Self::Success { body, .. } => Ok(body),
            Self::Failure(failure) => Err(failure),
        }
    }
}

impl From<DeviceFailure> for DeviceResult {
    fn from(failure: DeviceFailure) -> Self {
        Self::Failure(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;

    #[test]
    fn failure_accessors() {
        let result = DeviceResult::from(DeviceFailure::network(
            "connection refused",
            Duration::from_millis(7),
        ));
        assert!(!result.is_success());
        assert_eq!(result.failure_kind(), Some(FailureKind::Network));
        assert_eq!(result.latency_millis(), 7);
        assert!(result.body().is_none());
        assert!(result.led_state().is_none());
    }

    #[test]
    fn validation_failure_reports_zero_latency() {
        let result = DeviceResult::from(DeviceFailure::from(ValueError::InvalidAddress(
            "x".to_string(),
        )));
        assert_eq!(result.latency(), Duration::ZERO);
        assert_eq!(result.failure_kind(), Some(FailureKind::Validation));
    }

    #[test]
    fn into_result() {
        let ok = DeviceResult::success("ESP32 is running!", Duration::ZERO);
        assert_eq!(ok.into_result().unwrap(), "ESP32 is running!");

        let err = DeviceResult::from(DeviceFailure::cancelled(Duration::ZERO));
        assert_eq!(err.into_result().unwrap_err().kind(), FailureKind::Cancelled);
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::command::Command;
use crate::error::Error;
use crate::types::DeviceAddress;

/// Which [`DeviceClient`](super::DeviceClient) implementation to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Real HTTP requests to the device.
    #[default]
    Http,
    /// In-process simulated device.
    Simulated,
}

/// Configuration shared by all client implementations.
///
/// Timeouts apply per request and can still be overridden per call through
/// [`RequestOptions`](super::RequestOptions).
///
/// # Examples
///
/// ```
/// use esplink::protocol::{ClientConfig, TransportMode};
/// use std::time::Duration;
///
/// let config = ClientConfig::new()
///     .with_port(8080)
///     .with_ota_timeout(Duration::from_secs(60));
/// assert_eq!(config.port(), 8080);
///
/// let config = ClientConfig::from_json(r#"{ "mode": "simulated", "led_timeout_ms": 1500 }"#)
///     .unwrap();
/// assert_eq!(config.mode(), TransportMode::Simulated);
/// assert_eq!(config.led_timeout(), Duration::from_millis(1500));
/// assert_eq!(config.port(), 80);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    port: u16,
    #[serde(rename = "status_timeout_ms", deserialize_with = "millis")]
    status_timeout: Duration,
    #[serde(rename = "led_timeout_ms", deserialize_with = "millis")]
    led_timeout: Duration,
    #[serde(rename = "ota_timeout_ms", deserialize_with = "millis")]
    ota_timeout: Duration,
    #[serde(rename = "variable_timeout_ms", deserialize_with = "millis")]
    variable_timeout: Duration,
    mode: TransportMode,
}

impl ClientConfig {
    /// Default HTTP port of the device web server.
    pub const DEFAULT_PORT: u16 = 80;

    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the JSON is malformed or has wrong types.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the device HTTP port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the health-check timeout.
    #[must_use]
    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = timeout;
        self
    }

    /// Sets the LED command timeout.
    #[must_use]
    pub fn with_led_timeout(mut self, timeout: Duration) -> Self {
        self.led_timeout = timeout;
        self
    }

    /// Sets the OTA trigger timeout.
    #[must_use]
    pub fn with_ota_timeout(mut self, timeout: Duration) -> Self {
        self.ota_timeout = timeout;
        self
    }

    /// Sets the variable update timeout.
    #[must_use]
    pub fn with_variable_timeout(mut self, timeout: Duration) -> Self {
        self.variable_timeout = timeout;
        self
    }

    /// Sets the transport mode.
    #[must_use]
    pub fn with_mode(mut self, mode: TransportMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the device HTTP port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the health-check timeout.
    #[must_use]
    pub fn status_timeout(&self) -> Duration {
        self.status_timeout
    }

    /// Returns the LED command timeout.
    #[must_use]
    pub fn led_timeout(&self) -> Duration {
        self.led_timeout
    }

    /// Returns the OTA trigger timeout.
    #[must_use]
    pub fn ota_timeout(&self) -> Duration {
        self.ota_timeout
    }

    /// Returns the variable update timeout.
    #[must_use]
    pub fn variable_timeout(&self) -> Duration {
        self.variable_timeout
    }

    /// Returns the transport mode.
    #[must_use]
    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Returns the configured timeout for `command`.
    #[must_use]
    pub fn timeout_for(&self, command: &Command) -> Duration {
        match command {
            Command::Status => self.status_timeout,
            Command::LedOn | Command::LedOff | Command::LedToggle => self.led_timeout,
            Command::OtaUpdate { .. } => self.ota_timeout,
            Command::SetVariables { .. } => self.variable_timeout,
        }
    }

    /// Builds the base URL for a device.
    #[must_use]
    pub fn base_url(&self, address: DeviceAddress) -> String {
        if self.port == Self::DEFAULT_PORT {
            format!("http://{address}")
        } else {
            format!("http://{address}:{}", self.port)
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: Self::DEFAULT_PORT,
            status_timeout: Command::DEFAULT_TIMEOUT,
            led_timeout: Command::DEFAULT_TIMEOUT,
            ota_timeout: Command::OTA_TIMEOUT,
            variable_timeout: Command::DEFAULT_TIMEOUT,
            mode: TransportMode::default(),
        }
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

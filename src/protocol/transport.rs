// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport chosen from configuration.

use crate::command::Command;
use crate::error::Error;
#[cfg(feature = "http")]
use crate::protocol::HttpDeviceClient;
use crate::protocol::{ClientConfig, DeviceClient, RequestOptions, SimulatedDeviceClient, TransportMode};
use crate::response::DeviceResult;

/// A [`DeviceClient`] selected once, at construction time.
///
/// Call sites hold a `Transport` and never branch on the mode themselves.
///
/// # Examples
///
/// ```
/// use esplink::protocol::{ClientConfig, Transport, TransportMode};
///
/// let config = ClientConfig::new().with_mode(TransportMode::Simulated);
/// let transport = Transport::from_config(config).unwrap();
/// assert!(transport.is_simulated());
/// ```
#[derive(Debug)]
pub enum Transport {
    /// Real HTTP transport.
    #[cfg(feature = "http")]
    Http(HttpDeviceClient),
    /// Simulated device.
    Simulated(SimulatedDeviceClient),
}

impl Transport {
    /// Builds the transport named by `config.mode()`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created, or if HTTP mode is
    /// requested in a build without the `http` feature.
    pub fn from_config(config: ClientConfig) -> Result<Self, Error> {
        match config.mode() {
            #[cfg(feature = "http")]
            TransportMode::Http => Ok(Self::Http(HttpDeviceClient::new(config)?)),
            #[cfg(not(feature = "http"))]
            TransportMode::Http => Err(Error::TransportUnavailable("http")),
            TransportMode::Simulated => Ok(Self::Simulated(SimulatedDeviceClient::from_config(
                config,
            ))),
        }
    }

    /// Returns `true` for the simulated transport.
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated(_))
    }
}

impl DeviceClient for Transport {
    async fn send(&self, address: &str, command: &Command, options: RequestOptions) -> DeviceResult {
        match self {
            #[cfg(feature = "http")]
            Self::Http(client) => client.send(address, command, options).await,
            Self::Simulated(client) => client.send(address, command, options).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "http")]
    #[test]
    fn http_mode_builds_http_transport() {
        let transport = Transport::from_config(ClientConfig::default()).unwrap();
        assert!(matches!(transport, Transport::Http(_)));
        assert!(!transport.is_simulated());
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_mode_answers() {
        let config = ClientConfig::new().with_mode(TransportMode::Simulated);
        let transport = Transport::from_config(config).unwrap();

        let result = transport
            .check_status("10.0.0.1", RequestOptions::default())
            .await;
        assert!(result.is_success());
    }
}

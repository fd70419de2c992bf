// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the device web server.

use std::time::Duration;

use reqwest::Client;
use tokio::time::Instant;

use crate::command::{Command, RequestTarget};
use crate::error::{DeviceFailure, Error, FailureKind};
use crate::protocol::{ClientConfig, DeviceClient, RequestOptions, prepare, run_bounded};
use crate::response::DeviceResult;
use crate::types::DeviceAddress;

/// HTTP client for the device.
///
/// Each command is one `GET` on the device web server (see
/// [`Command`] for the path table). The client holds no per-device state;
/// the address is supplied on every call.
///
/// # Examples
///
/// ```no_run
/// use esplink::command::LedCommand;
/// use esplink::protocol::{ClientConfig, DeviceClient, HttpDeviceClient, RequestOptions};
///
/// # async fn example() -> esplink::Result<()> {
/// let client = HttpDeviceClient::new(ClientConfig::default())?;
/// let result = client
///     .set_led("192.168.1.100", LedCommand::Toggle, RequestOptions::default())
///     .await;
/// if let Some(state) = result.led_state() {
///     println!("LED is now {state}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpDeviceClient {
    client: Client,
    config: ClientConfig,
}

/// Why a request that reached the transport did not produce a body.
#[derive(Debug)]
enum Fault {
    Transport(reqwest::Error),
    Status { code: u16, detail: String },
}

impl HttpDeviceClient {
    /// Creates a client with the given configuration.
    ///
    /// Timeouts are enforced per request by the client itself, so the
    /// underlying `reqwest` client has none.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builds the full URL for a request.
    fn build_url(&self, address: DeviceAddress, target: &RequestTarget) -> String {
        format!("{}{target}", self.config.base_url(address))
    }

    async fn fetch(&self, url: &str) -> Result<String, Fault> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Fault::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unknown").to_string()
            } else {
                body
            };
            return Err(Fault::Status {
                code: status.as_u16(),
                detail,
            });
        }

        response.text().await.map_err(Fault::Transport)
    }
}

impl Fault {
    fn into_failure(self, latency: Duration) -> DeviceFailure {
        match self {
            Self::Status { code, detail } => DeviceFailure::http(code, &detail, latency),
            Self::Transport(e) if e.is_timeout() => {
                DeviceFailure::new(FailureKind::Timeout, e.to_string(), latency)
            }
            Self::Transport(e) if e.is_connect() || e.is_request() || e.is_body() => {
                DeviceFailure::network(e, latency)
            }
            Self::Transport(e) => DeviceFailure::unknown(e, latency),
        }
    }
}

impl DeviceClient for HttpDeviceClient {
    async fn send(&self, address: &str, command: &Command, options: RequestOptions) -> DeviceResult {
        let request = match prepare(address, command) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(address, %command, error = %e, "Rejected device request");
                return DeviceFailure::validation(&e).into();
            }
        };

        let url = self.build_url(request.address, &request.target);
        let limit = options
            .timeout()
            .unwrap_or_else(|| self.config.timeout_for(command));

        tracing::debug!(url = %url, %command, timeout_ms = %limit.as_millis(), "Sending HTTP request");

        let started = Instant::now();
        let outcome = run_bounded(self.fetch(&url), limit, options.cancel()).await;
        let latency = started.elapsed();

        match outcome {
            Ok(Ok(body)) => {
                tracing::debug!(body = %body, latency_ms = %latency.as_millis(), "Received HTTP response");
                DeviceResult::success(body, latency)
            }
            Ok(Err(fault)) => {
                let failure = fault.into_failure(latency);
                tracing::debug!(url = %url, kind = %failure.kind(), error = %failure, "HTTP request failed");
                failure.into()
            }
            Err(interrupted) => {
                let failure = interrupted.into_failure(limit, latency);
                tracing::debug!(url = %url, kind = %failure.kind(), "HTTP request interrupted");
                failure.into()
            }
        }
    }
}

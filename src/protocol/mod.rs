// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device client implementations.
//!
//! A [`DeviceClient`] turns one `(address, command)` pair into exactly one
//! request, bounded by a timeout and an optional cancellation token, and
//! returns a classified [`DeviceResult`]. Clients are stateless with respect
//! to the caller: they never retry and never return an error past their own
//! boundary.
//!
//! # Implementations
//!
//! - [`HttpDeviceClient`]: talks to the real firmware over HTTP
//! - [`SimulatedDeviceClient`]: in-process stand-in with the same contract
//! - [`Transport`]: one of the above, picked from [`ClientConfig`] at
//!   construction time
//!
//! # Examples
//!
//! ```no_run
//! use esplink::protocol::{ClientConfig, DeviceClient, HttpDeviceClient, RequestOptions};
//!
//! # async fn example() -> esplink::Result<()> {
//! let client = HttpDeviceClient::new(ClientConfig::default())?;
//! let result = client
//!     .check_status("192.168.1.100", RequestOptions::default())
//!     .await;
//! println!("{result:?} after {} ms", result.latency_millis());
//! # Ok(())
//! # }
//! ```

mod config;
#[cfg(feature = "http")]
mod http;
mod simulated;
mod transport;

pub use config::{ClientConfig, TransportMode};
#[cfg(feature = "http")]
pub use http::HttpDeviceClient;
pub use simulated::SimulatedDeviceClient;
pub use transport::Transport;

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::command::{Command, DeviceVariable, LedCommand, RequestTarget};
use crate::error::{DeviceFailure, ValueError};
use crate::response::DeviceResult;
use crate::types::DeviceAddress;

/// Per-call options: cancellation signal and timeout override.
///
/// # Examples
///
/// ```
/// use esplink::protocol::RequestOptions;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// let options = RequestOptions::new()
///     .with_cancel(token.clone())
///     .with_timeout(Duration::from_secs(2));
/// assert_eq!(options.timeout(), Some(Duration::from_secs(2)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    cancel: Option<CancellationToken>,
    timeout: Option<Duration>,
}

impl RequestOptions {
    /// Creates options with no cancellation token and the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Overrides the command's configured timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the cancellation token, if any.
    #[must_use]
    pub fn cancel(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// Returns the timeout override, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Capability to send commands to a device.
///
/// Implementations must:
///
/// - validate `address` and the command payload before any I/O, returning a
///   [`FailureKind::Validation`](crate::error::FailureKind::Validation)
///   failure with zero latency on bad input
/// - issue exactly one request otherwise, with no retries
/// - distinguish timeout expiry from caller cancellation
///
/// All operations besides [`send`](Self::send) are conveniences over it.
pub trait DeviceClient: Send + Sync {
    /// Sends a command to the device at `address`.
    fn send(
        &self,
        address: &str,
        command: &Command,
        options: RequestOptions,
    ) -> impl Future<Output = DeviceResult> + Send;

    /// Health check against the device root path.
    fn check_status(
        &self,
        address: &str,
        options: RequestOptions,
    ) -> impl Future<Output = DeviceResult> + Send {
        async move { self.send(address, &Command::Status, options).await }
    }

    /// Switches the LED on, off, or toggles it.
    fn set_led(
        &self,
        address: &str,
        command: LedCommand,
        options: RequestOptions,
    ) -> impl Future<Output = DeviceResult> + Send {
        let command = Command::from(command);
        async move { self.send(address, &command, options).await }
    }

    /// Asks the device to download and flash the firmware at `firmware_url`.
    fn start_ota_update(
        &self,
        address: &str,
        firmware_url: &str,
        options: RequestOptions,
    ) -> impl Future<Output = DeviceResult> + Send {
        let command = Command::ota_update(firmware_url);
        async move { self.send(address, &command, options).await }
    }

    /// Updates runtime variables on the device.
    fn set_variables(
        &self,
        address: &str,
        variables: Vec<DeviceVariable>,
        options: RequestOptions,
    ) -> impl Future<Output = DeviceResult> + Send {
        let command = Command::set_variables(variables);
        async move { self.send(address, &command, options).await }
    }
}

/// A validated request, ready to send.
#[derive(Debug)]
pub(crate) struct PreparedRequest {
    pub address: DeviceAddress,
    pub target: RequestTarget,
}

/// Validates an address/command pair without touching the network.
pub(crate) fn prepare(address: &str, command: &Command) -> Result<PreparedRequest, ValueError> {
    let address = DeviceAddress::parse(address)?;
    let target = command.target()?;
    Ok(PreparedRequest { address, target })
}

/// Why a bounded request did not finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupted {
    TimedOut,
    Cancelled,
}

impl Interrupted {
    pub(crate) fn into_failure(self, limit: Duration, latency: Duration) -> DeviceFailure {
        match self {
            Self::TimedOut => DeviceFailure::timeout(limit, latency),
            Self::Cancelled => DeviceFailure::cancelled(latency),
        }
    }
}

/// Runs `future` until it completes, `limit` elapses, or `cancel` fires.
///
/// Cancellation is checked first, so an already-cancelled token never lets
/// the request start.
pub(crate) async fn run_bounded<F: Future>(
    future: F,
    limit: Duration,
    cancel: Option<&CancellationToken>,
) -> Result<F::Output, Interrupted> {
    let cancelled = async {
        match cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        biased;
        () = cancelled => Err(Interrupted::Cancelled),
        outcome = tokio::time::timeout(limit, future) => {
            outcome.map_err(|_| Interrupted::TimedOut)
        }
    }
}

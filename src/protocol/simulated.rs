// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-process simulated device.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::command::{Command, DeviceVariable};
use crate::error::DeviceFailure;
use crate::protocol::{ClientConfig, DeviceClient, RequestOptions, prepare, run_bounded};
use crate::response::DeviceResult;
use crate::types::LedState;

/// A simulated device that answers like the real firmware.
///
/// Useful for demos and tests: it applies the same validation, timeout and
/// cancellation rules as [`HttpDeviceClient`](super::HttpDeviceClient), keeps
/// its own LED and variable state, and counts the requests that would have
/// gone over the network.
///
/// # Examples
///
/// ```
/// use esplink::command::LedCommand;
/// use esplink::protocol::{DeviceClient, RequestOptions, SimulatedDeviceClient};
/// use esplink::types::LedState;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let device = SimulatedDeviceClient::new().with_latency(Duration::from_millis(5));
/// let result = device
///     .set_led("192.168.1.100", LedCommand::Toggle, RequestOptions::default())
///     .await;
/// assert_eq!(result.led_state(), Some(LedState::On));
/// assert_eq!(device.request_count(), 1);
/// # }
/// ```
#[derive(Debug)]
pub struct SimulatedDeviceClient {
    config: ClientConfig,
    latency: Duration,
    reachable: AtomicBool,
    led: Mutex<LedState>,
    variables: Mutex<BTreeMap<String, String>>,
    requests: AtomicUsize,
}

impl SimulatedDeviceClient {
    /// Default simulated round-trip time.
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(50);

    /// Body the firmware sends once the LED is on.
    pub const LED_ON_BODY: &'static str = "User App Active (Morse/Effects ON)";

    /// Body the firmware sends once the LED is off.
    pub const LED_OFF_BODY: &'static str = "User App Inactive (LED OFF)";

    /// Creates a reachable device with its LED off.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(ClientConfig::default())
    }

    /// Creates a device using the timeouts from `config`.
    #[must_use]
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            latency: Self::DEFAULT_LATENCY,
            reachable: AtomicBool::new(true),
            led: Mutex::new(LedState::Off),
            variables: Mutex::new(BTreeMap::new()),
            requests: AtomicUsize::new(0),
        }
    }

    /// Sets the simulated round-trip time.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Sets the initial LED state.
    #[must_use]
    pub fn with_led(self, state: LedState) -> Self {
        *self.led.lock() = state;
        self
    }

    /// Declares a variable the firmware knows about.
    ///
    /// Assignments to undeclared variables are reported as failed, like the
    /// firmware does for unknown names.
    #[must_use]
    pub fn with_variable(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.lock().insert(name.into(), value.into());
        self
    }

    /// Makes the device reachable or not. Unreachable devices fail every
    /// request with a network error after the simulated latency.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Returns the current LED state.
    #[must_use]
    pub fn led_state(&self) -> LedState {
        *self.led.lock()
    }

    /// Returns the current value of a declared variable.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<String> {
        self.variables.lock().get(name).cloned()
    }

    /// Returns how many requests passed validation and were "sent".
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Produces the firmware's answer and applies its side effects.
    fn respond(&self, command: &Command) -> Result<String, &'static str> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err("connection refused");
        }

        let body = match command {
            Command::Status => format!("ESP32 is running!\nLED: {}\n", self.led_state()),
            Command::LedOn => self.switch_led(|_| LedState::On),
            Command::LedOff => self.switch_led(|_| LedState::Off),
            Command::LedToggle => self.switch_led(LedState::toggled),
            Command::OtaUpdate { firmware_url } => {
                format!("Starting OTA update from {firmware_url}...")
            }
            Command::SetVariables { variables } => self.assign(variables),
        };
        Ok(body)
    }

    /// Applies an LED transition. The firmware answers a toggle with the
    /// same body as the explicit on/off handler it ends up in.
    fn switch_led(&self, next: impl FnOnce(LedState) -> LedState) -> String {
        let mut led = self.led.lock();
        *led = next(*led);
        match *led {
            LedState::On => Self::LED_ON_BODY,
            LedState::Off => Self::LED_OFF_BODY,
        }
        .to_string()
    }

    fn assign(&self, variables: &[DeviceVariable]) -> String {
        let mut known = self.variables.lock();
        let mut report = String::from("Update status:\n");
        for var in variables {
            if let Some(slot) = known.get_mut(var.name()) {
                var.value().clone_into(slot);
                report.push_str(&format!(" - {} updated successfully\n", var.name()));
            } else {
                report.push_str(&format!(
                    " - {} FAILED (not found or type mismatch)\n",
                    var.name()
                ));
            }
        }
        report
    }
}

impl Default for SimulatedDeviceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceClient for SimulatedDeviceClient {
    async fn send(&self, address: &str, command: &Command, options: RequestOptions) -> DeviceResult {
        let request = match prepare(address, command) {
            Ok(request) => request,
            Err(e) => return DeviceFailure::validation(&e).into(),
        };

        let limit = options
            .timeout()
            .unwrap_or_else(|| self.config.timeout_for(command));
        self.requests.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(
            address = %request.address,
            target = %request.target,
            "Simulating device request"
        );

        let started = Instant::now();
        let exchange = async {
            tokio::time::sleep(self.latency).await;
            self.respond(command)
        };
        let outcome = run_bounded(exchange, limit, options.cancel()).await;
        let latency = started.elapsed();

        match outcome {
            Ok(Ok(body)) => DeviceResult::success(body, latency),
            Ok(Err(detail)) => DeviceFailure::network(detail, latency).into(),
            Err(interrupted) => interrupted.into_failure(limit, latency).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::LedCommand;
    use crate::error::FailureKind;
    use tokio_util::sync::CancellationToken;

    const ADDR: &str = "192.168.1.100";

    #[tokio::test(start_paused = true)]
    async fn status_reports_led() {
        let device = SimulatedDeviceClient::new().with_led(LedState::On);
        let result = device.check_status(ADDR, RequestOptions::default()).await;
        assert_eq!(result.body(), Some("ESP32 is running!\nLED: ON\n"));
        assert_eq!(result.latency(), SimulatedDeviceClient::DEFAULT_LATENCY);
    }

    #[tokio::test(start_paused = true)]
    async fn led_commands_change_state() {
        let device = SimulatedDeviceClient::new();

        let on = device.set_led(ADDR, LedCommand::On, RequestOptions::default()).await;
        assert_eq!(on.body(), Some("User App Active (Morse/Effects ON)"));
        assert_eq!(on.led_state(), Some(LedState::On));
        assert_eq!(device.led_state(), LedState::On);

        let toggled = device
            .set_led(ADDR, LedCommand::Toggle, RequestOptions::default())
            .await;
        assert_eq!(toggled.body(), Some("User App Inactive (LED OFF)"));
        assert_eq!(toggled.led_state(), Some(LedState::Off));

        let off = device.set_led(ADDR, LedCommand::Off, RequestOptions::default()).await;
        assert_eq!(off.led_state(), Some(LedState::Off));
        assert_eq!(device.request_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn validation_skips_network() {
        let device = SimulatedDeviceClient::new();

        let bad_addr = device.check_status("999.1.1.1", RequestOptions::default()).await;
        assert_eq!(bad_addr.failure_kind(), Some(FailureKind::Validation));
        assert_eq!(bad_addr.latency_millis(), 0);

        let bad_url = device
            .start_ota_update(ADDR, "not-a-url", RequestOptions::default())
            .await;
        assert_eq!(bad_url.failure_kind(), Some(FailureKind::Validation));
        assert_eq!(bad_url.latency_millis(), 0);

        assert_eq!(device.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_is_network_failure() {
        let device = SimulatedDeviceClient::new();
        device.set_reachable(false);

        let result = device.check_status(ADDR, RequestOptions::default()).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::Network));
        assert_eq!(device.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_device_times_out() {
        let device = SimulatedDeviceClient::new().with_latency(Duration::from_secs(10));
        let result = device
            .set_led(
                ADDR,
                LedCommand::On,
                RequestOptions::new().with_timeout(Duration::from_millis(200)),
            )
            .await;

        assert_eq!(result.failure_kind(), Some(FailureKind::Timeout));
        assert_eq!(result.latency(), Duration::from_millis(200));
        // The device never processed the command.
        assert_eq!(device.led_state(), LedState::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_response() {
        let device = SimulatedDeviceClient::new();
        let token = CancellationToken::new();
        token.cancel();

        let result = device
            .set_led(ADDR, LedCommand::On, RequestOptions::new().with_cancel(token))
            .await;
        assert_eq!(result.failure_kind(), Some(FailureKind::Cancelled));
        assert_eq!(device.led_state(), LedState::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn ota_acknowledges_url() {
        let device = SimulatedDeviceClient::new();
        let result = device
            .start_ota_update(ADDR, "http://10.0.0.5:8001/static/firmware.bin", RequestOptions::default())
            .await;
        assert_eq!(
            result.body(),
            Some("Starting OTA update from http://10.0.0.5:8001/static/firmware.bin...")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn variables_update_known_names_only() {
        let device = SimulatedDeviceClient::new().with_variable("blink_ms", "500");
        let result = device
            .set_variables(
                ADDR,
                vec![
                    DeviceVariable::new("blink_ms", "250"),
                    DeviceVariable::new("colour", "red"),
                ],
                RequestOptions::default(),
            )
            .await;

        let report = crate::command::VariableReport::parse(result.body().unwrap());
        assert_eq!(report.updated().collect::<Vec<_>>(), ["blink_ms"]);
        assert_eq!(report.failed().collect::<Vec<_>>(), ["colour"]);
        assert_eq!(device.variable("blink_ms").as_deref(), Some("250"));
        assert_eq!(device.variable("colour"), None);
    }
}

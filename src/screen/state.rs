// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Screen state snapshot.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::command::Command;
use crate::types::{LedState, RequestId};

use super::log::CommandLog;

/// Device reachability as derived from response outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No response has decided it yet.
    #[default]
    Unknown,
    /// The device answered the last applied request.
    Online,
    /// The last applied request timed out or failed to connect.
    Offline,
}

impl ConnectionStatus {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The command in flight and the identifier it was minted with.
///
/// Kept as one value so that "active command" and "latest request id" are
/// either both present or both absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveRequest {
    /// Identifier of the newest dispatch.
    pub request_id: RequestId,
    /// The command it carries.
    pub command: Command,
}

/// Everything a device screen displays.
///
/// Obtained from [`DeviceScreen::snapshot`](super::DeviceScreen::snapshot) or
/// a [`subscribe`](super::DeviceScreen::subscribe) receiver. Snapshots are
/// plain values; mutating the screen never changes a snapshot already taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenState {
    pub(crate) device_address: String,
    pub(crate) connection_status: ConnectionStatus,
    pub(crate) active: Option<ActiveRequest>,
    pub(crate) last_response_text: String,
    pub(crate) last_latency_millis: u64,
    pub(crate) last_success_at: Option<DateTime<Utc>>,
    pub(crate) command_log: CommandLog,
    pub(crate) last_error: Option<String>,
}

impl ScreenState {
    pub(crate) fn new(device_address: impl Into<String>) -> Self {
        Self {
            device_address: device_address.into(),
            connection_status: ConnectionStatus::Unknown,
            active: None,
            last_response_text: String::new(),
            last_latency_millis: 0,
            last_success_at: None,
            command_log: CommandLog::new(),
            last_error: None,
        }
    }

    /// Returns the target device address, as entered.
    #[must_use]
    pub fn device_address(&self) -> &str {
        &self.device_address
    }

    /// Returns the derived connection status.
    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection_status
    }

    /// Returns the active request, if any.
    #[must_use]
    pub fn active(&self) -> Option<&ActiveRequest> {
        self.active.as_ref()
    }

    /// Returns the command in flight. UIs disable command buttons while this
    /// is `Some`.
    #[must_use]
    pub fn active_command(&self) -> Option<&Command> {
        self.active.as_ref().map(|active| &active.command)
    }

    /// Returns the identifier of the command in flight.
    #[must_use]
    pub fn latest_request_id(&self) -> Option<RequestId> {
        self.active.as_ref().map(|active| active.request_id)
    }

    /// Returns `true` while a command is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Returns the body of the last applied successful response.
    #[must_use]
    pub fn last_response_text(&self) -> &str {
        &self.last_response_text
    }

    /// Returns the latency of the last applied response.
    #[must_use]
    pub fn last_latency_millis(&self) -> u64 {
        self.last_latency_millis
    }

    /// Returns when the last applied success arrived.
    #[must_use]
    pub fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.last_success_at
    }

    /// Returns the command history.
    #[must_use]
    pub fn command_log(&self) -> &CommandLog {
        &self.command_log
    }

    /// Returns the last user-visible error.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Derives the LED state from the last applied response.
    #[must_use]
    pub fn led_state(&self) -> Option<LedState> {
        LedState::from_response(&self.last_response_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state() {
        let state = ScreenState::new("192.168.1.100");
        assert_eq!(state.device_address(), "192.168.1.100");
        assert_eq!(state.connection_status(), ConnectionStatus::Unknown);
        assert!(!state.is_busy());
        assert_eq!(state.active_command(), None);
        assert_eq!(state.latest_request_id(), None);
        assert_eq!(state.last_response_text(), "");
        assert_eq!(state.led_state(), None);
        assert!(state.command_log().is_empty());
    }

    #[test]
    fn active_pair_moves_together() {
        let mut state = ScreenState::new("10.0.0.1");
        let id = RequestId::new();
        state.active = Some(ActiveRequest {
            request_id: id,
            command: Command::LedOn,
        });

        assert_eq!(state.active_command(), Some(&Command::LedOn));
        assert_eq!(state.latest_request_id(), Some(id));

        state.active = None;
        assert_eq!(state.active_command(), None);
        assert_eq!(state.latest_request_id(), None);
    }

    #[test]
    fn led_state_from_response_text() {
        let mut state = ScreenState::new("10.0.0.1");
        state.last_response_text = "LED toggled to ON".to_string();
        assert_eq!(state.led_state(), Some(LedState::On));
    }

    #[test]
    fn serializes_snake_case_fields() {
        let json = serde_json::to_value(ScreenState::new("10.0.0.1")).unwrap();
        assert_eq!(json["device_address"], "10.0.0.1");
        assert_eq!(json["connection_status"], "unknown");
        assert!(json["active"].is_null());
        assert!(json["command_log"].as_array().unwrap().is_empty());
    }
}

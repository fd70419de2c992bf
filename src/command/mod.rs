// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device command definitions.
//!
//! Each [`Command`] maps to exactly one GET request on the device's HTTP
//! server.
//!
//! # Available Commands
//!
//! | Command | Path | Default timeout |
//! |---------|------|-----------------|
//! | [`Command::Status`] | `/` | 5 s |
//! | [`Command::LedOn`] | `/led/on` | 5 s |
//! | [`Command::LedOff`] | `/led/off` | 5 s |
//! | [`Command::LedToggle`] | `/led/toggle` | 5 s |
//! | [`Command::OtaUpdate`] | `/ota/update?url=<firmware-url>` | 30 s |
//! | [`Command::SetVariables`] | `/changeVar?<name>=<value>&...` | 5 s |
//!
//! # Examples
//!
//! ```
//! use esplink::command::{Command, LedCommand};
//!
//! let cmd = Command::from(LedCommand::Toggle);
//! assert_eq!(cmd.name(), "led-toggle");
//! assert_eq!(cmd.target().unwrap().to_string(), "/led/toggle");
//!
//! let ota = Command::ota_update("http://10.0.0.5:8001/static/firmware.bin");
//! assert_eq!(
//!     ota.target().unwrap().to_string(),
//!     "/ota/update?url=http%3A%2F%2F10.0.0.5%3A8001%2Fstatic%2Ffirmware.bin"
//! );
//! ```

mod variables;

pub use variables::{DeviceVariable, VariableOutcome, VariableReport};

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::ValueError;
use crate::types::FirmwareUrl;

/// A command that can be sent to the device.
///
/// Commands are immutable once issued. Inputs carried by a command (firmware
/// URL, variable names) are validated when its request target is built, so a
/// malformed command still produces a proper validation failure rather than
/// being unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Command {
    /// Health check.
    Status,
    /// Turn the LED on.
    LedOn,
    /// Turn the LED off.
    LedOff,
    /// Toggle the LED.
    LedToggle,
    /// Flash new firmware from a URL. The device reboots afterwards.
    OtaUpdate {
        /// Absolute http(s) URL of the firmware image.
        firmware_url: String,
    },
    /// Update named runtime variables on the device.
    SetVariables {
        /// Variables to update, in order.
        variables: Vec<DeviceVariable>,
    },
}

impl Command {
    /// Default timeout for quick device commands.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
    /// Default timeout for OTA requests; flashing is slow and the device is
    /// briefly unreachable once it accepts the image.
    pub const OTA_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates an OTA update command.
    #[must_use]
    pub fn ota_update(firmware_url: impl Into<String>) -> Self {
        Self::OtaUpdate {
            firmware_url: firmware_url.into(),
        }
    }

    /// Creates a variable update command.
    #[must_use]
    pub fn set_variables(variables: impl IntoIterator<Item = DeviceVariable>) -> Self {
        Self::SetVariables {
            variables: variables.into_iter().collect(),
        }
    }

    /// Returns the kebab-case command name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::LedOn => "led-on",
            Self::LedOff => "led-off",
            Self::LedToggle => "led-toggle",
            Self::OtaUpdate { .. } => "ota-update",
            Self::SetVariables { .. } => "set-variables",
        }
    }

    /// Returns the timeout used when the caller does not override it.
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        match self {
            Self::OtaUpdate { .. } => Self::OTA_TIMEOUT,
            _ => Self::DEFAULT_TIMEOUT,
        }
    }

    /// Validates the command payload and builds its request target.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if the firmware URL or any variable is invalid.
    pub fn target(&self) -> Result<RequestTarget, ValueError> {
        let target = match self {
            Self::Status => RequestTarget::new("/"),
            Self::LedOn => RequestTarget::new("/led/on"),
            Self::LedOff => RequestTarget::new("/led/off"),
            Self::LedToggle => RequestTarget::new("/led/toggle"),
            Self::OtaUpdate { firmware_url } => {
                let url = FirmwareUrl::parse(firmware_url)?;
                RequestTarget::new("/ota/update").with_query("url", url.as_str())
            }
            Self::SetVariables { variables } => {
                if variables.is_empty() {
                    return Err(ValueError::NoVariables);
                }
                variables
                    .iter()
                    .try_fold(RequestTarget::new("/changeVar"), |target, var| {
                        var.validate()?;
                        Ok::<_, ValueError>(target.with_query(var.name(), var.value()))
                    })?
            }
        };
        Ok(target)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<LedCommand> for Command {
    fn from(command: LedCommand) -> Self {
        match command {
            LedCommand::On => Self::LedOn,
            LedCommand::Off => Self::LedOff,
            LedCommand::Toggle => Self::LedToggle,
        }
    }
}

/// LED action accepted by [`DeviceClient::set_led`](crate::protocol::DeviceClient::set_led).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedCommand {
    /// Turn on.
    On,
    /// Turn off.
    Off,
    /// Flip the current state.
    Toggle,
}

/// Path and query of a device request, before the base URL is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    path: &'static str,
    query: Vec<(String, String)>,
}

impl RequestTarget {
    fn new(path: &'static str) -> Self {
        Self {
            path,
            query: Vec::new(),
        }
    }

    fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path
    }

    /// Returns the query parameters, unencoded.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(
                f,
                "{sep}{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )?;
        }
        Ok(())
    }
}

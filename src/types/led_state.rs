// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LED state as reported by the device.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// State of the device LED.
///
/// The firmware answers in free-form text, so the state is recovered by
/// looking for whole-word `ON`/`OFF` tokens rather than matching a fixed
/// response.
///
/// # Examples
///
/// ```
/// use esplink::types::LedState;
///
/// assert_eq!(LedState::from_response("LED toggled to ON"), Some(LedState::On));
/// assert_eq!(LedState::from_response("User App Inactive (LED off)"), Some(LedState::Off));
/// assert_eq!(LedState::from_response("ESP32 is running!"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LedState {
    /// LED is off.
    Off,
    /// LED is on.
    On,
}

impl LedState {
    /// Extracts the LED state from a response body.
    ///
    /// The last `ON`/`OFF` word wins (case-insensitive), so bodies such as
    /// `"toggled from OFF to ON"` report the resulting state. Substrings of
    /// other words (`"running"`, `"Effects"`) are ignored.
    #[must_use]
    pub fn from_response(body: &str) -> Option<Self> {
        body.split(|c: char| !c.is_ascii_alphanumeric())
            .rev()
            .find_map(|word| word.parse().ok())
    }

    /// Returns the opposite state.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }

    /// Returns the uppercase token used by the firmware.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for LedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("on") {
            Ok(Self::On)
        } else if s.eq_ignore_ascii_case("off") {
            Ok(Self::Off)
        } else {
            Err(())
        }
    }
}

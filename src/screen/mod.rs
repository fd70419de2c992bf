// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! UI state synchronization for one device.
//!
//! [`DeviceScreen`] owns a [`ScreenState`] and is the only way to change it.
//! Overlapping commands are tagged with request identifiers and only the
//! newest one may update the displayed state ("latest request wins"), no
//! matter in which order the device answers.
//!
//! The following hold after every transition:
//!
//! - the active command and the latest request id are both set or both unset
//! - at most one command is active; a new dispatch supersedes the previous one
//! - response text, latency and connection status only change for the newest
//!   request, and the success timestamp only on a newest *successful* one
//! - the [`CommandLog`] is newest first and holds at most
//!   [`CommandLog::CAPACITY`] entries, each of which ends up `success` or
//!   `error`
//!
//! Connection status follows failure kinds: timeouts and network errors mean
//! offline, an HTTP error status means the device answered (online),
//! validation and unknown failures leave it unchanged, and cancellations are
//! silent.

mod device_screen;
mod log;
mod state;

pub use device_screen::{DeviceScreen, DispatchOutcome, Disposition};
pub use log::{CommandLog, LogEntry, LogStatus};
pub use state::{ActiveRequest, ConnectionStatus, ScreenState};

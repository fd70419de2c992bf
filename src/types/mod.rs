// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by the client and the screen state.
//!
//! Types that constrain their input ([`DeviceAddress`], [`FirmwareUrl`])
//! validate on construction and return [`ValueError`](crate::error::ValueError)
//! on bad input.

mod address;
mod led_state;
mod request_id;

pub use address::{DeviceAddress, FirmwareUrl};
pub use led_state::LedState;
pub use request_id::RequestId;

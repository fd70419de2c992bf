// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `esplink` - control an ESP32 LED/OTA device over HTTP and keep a UI in
//! sync with it.
//!
//! The device runs a tiny web server with a health check, LED switching,
//! over-the-air firmware updates and runtime variables. This library provides:
//!
//! - **Device clients** ([`protocol`]): one request per call, with input
//!   validation, timeouts, cancellation and a fixed failure taxonomy
//! - **Screen state** ([`screen`]): a state manager that guarantees the
//!   displayed state never reflects a superseded response
//!
//! # Quick Start
//!
//! ## Sending a command
//!
//! ```no_run
//! use esplink::command::LedCommand;
//! use esplink::protocol::{ClientConfig, DeviceClient, HttpDeviceClient, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() -> esplink::Result<()> {
//!     let client = HttpDeviceClient::new(ClientConfig::default())?;
//!
//!     let result = client
//!         .set_led("192.168.1.100", LedCommand::On, RequestOptions::default())
//!         .await;
//!
//!     match result.into_result() {
//!         Ok(body) => println!("device said: {body}"),
//!         Err(failure) => println!("{} failure: {failure}", failure.kind()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Driving a screen
//!
//! ```no_run
//! use esplink::{Command, DeviceScreen};
//! use esplink::protocol::{ClientConfig, Transport};
//!
//! #[tokio::main]
//! async fn main() -> esplink::Result<()> {
//!     let config = ClientConfig::from_json(r#"{ "mode": "http", "ota_timeout_ms": 60000 }"#)?;
//!     let screen = DeviceScreen::new(Transport::from_config(config)?, "192.168.1.100");
//!
//!     let mut updates = screen.subscribe();
//!     tokio::spawn(screen.dispatch(Command::LedToggle));
//!
//!     while updates.changed().await.is_ok() {
//!         let state = updates.borrow_and_update().clone();
//!         println!("{} busy={}", state.connection_status(), state.is_busy());
//!         if !state.is_busy() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod error;
pub mod protocol;
pub mod response;
pub mod screen;
pub mod types;

pub use command::{Command, DeviceVariable, LedCommand, VariableReport};
pub use error::{DeviceFailure, Error, FailureKind, Result, ValueError};
#[cfg(feature = "http")]
pub use protocol::HttpDeviceClient;
pub use protocol::{
    ClientConfig, DeviceClient, RequestOptions, SimulatedDeviceClient, Transport, TransportMode,
};
pub use response::DeviceResult;
pub use screen::{ConnectionStatus, DeviceScreen, DispatchOutcome, ScreenState};
pub use types::{DeviceAddress, FirmwareUrl, LedState, RequestId};

// Copyright 2025 Tim Roberts
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Session management for a network streaming-device remote.
//!
//! Remembers the last device the user picked, and on startup tries to reach
//! it again through its device-info endpoint. The crate is split into
//! layers that can be used on their own:
//!
//! - **Protocol layer**: the `<device-info>` XML document ([`DeviceInfo`])
//! - **HTTP layer**: [`DeviceInfoClient`] and its `reqwest` implementation,
//!   with an explicit target per request and a bounded timeout
//! - **Store layer**: [`PreferenceStore`] and the two-key last-device record
//! - **Session layer**: [`SessionController`] publishing [`ViewState`] on a
//!   watch channel, and [`Session`] to run it as a task
//!
//! # Quick Start
//!
//! ```no_run
//! use roku_session::{
//!     ClientConfig, HttpDeviceClient, MemoryStore, Session, SessionController,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpDeviceClient::new(ClientConfig::default())?;
//!     let session = Session::spawn(SessionController::new(client, MemoryStore::new()));
//!
//!     let state = session.reconnect_last_device().await?;
//!     println!("{state}");
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod http;
pub mod protocol;
pub mod session;
pub mod store;

pub use device::Device;
pub use http::{ClientConfig, DeviceInfoClient, HttpDeviceClient, RequestError, DEFAULT_TIMEOUT};
pub use protocol::{DeviceInfo, ParseError};
pub use session::{
    SelectionSource, Session, SessionClosed, SessionConfig, SessionController, ViewState,
};
pub use store::{Edit, LastDevice, MemoryStore, PreferenceStore, StoreError};

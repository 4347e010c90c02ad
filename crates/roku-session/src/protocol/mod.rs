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

//! Device-info protocol.
//!
//! A device answers `GET /query/device-info` with a flat XML document
//! describing itself. Only the friendly name and device id are needed to
//! identify a device; the rest is kept for display.

mod device_info;

pub use device_info::{DeviceInfo, DEVICE_INFO_PATH};

use thiserror::Error;

/// Errors that can occur while reading a device-info document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid device-info document: {0}")]
    InvalidFormat(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

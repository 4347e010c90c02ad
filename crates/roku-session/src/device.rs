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

//! The controllable device record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A streaming device the remote can target.
///
/// `location` is the base URL the device advertised during discovery
/// (for example `http://192.0.2.10:8060/`). `device_id` is whatever the
/// device itself reports in its device-info document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    location: String,
    friendly_name: String,
    device_id: String,
}

impl Device {
    /// Create a device record.
    #[must_use]
    pub fn new(
        location: impl Into<String>,
        friendly_name: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            friendly_name: friendly_name.into(),
            device_id: device_id.into(),
        }
    }

    /// Network location (base URL) of the device.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Human-readable name, also used as a weak identity check on reconnect.
    #[must_use]
    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] at {}", self.friendly_name, self.device_id, self.location)
    }
}

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

//! Application configuration management.
//!
//! Configuration is stored as TOML through `confy`. The last-device record
//! lives in a separate preferences file so that rewriting one never touches
//! the other.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name used for the `confy` configuration directory.
pub const APP_NAME: &str = "simple-remote";

const CONFIG_NAME: &str = "config";
const PREFERENCES_NAME: &str = "preferences";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Upper bound on a device-info round trip, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Where the last-device preferences are kept (defaults next to the config)
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,
}

fn default_config_version() -> u32 {
    1
}

fn default_request_timeout_ms() -> u64 {
    5000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            request_timeout_ms: default_request_timeout_ms(),
            preferences_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration, from `path` if given or the default location otherwise.
    /// A missing file is created with defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, confy::ConfyError> {
        match path {
            Some(path) => confy::load_path(path),
            None => confy::load(APP_NAME, CONFIG_NAME),
        }
    }

    /// Save configuration to `path`, or the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<(), confy::ConfyError> {
        match path {
            Some(path) => confy::store_path(path, self),
            None => confy::store(APP_NAME, CONFIG_NAME, self),
        }
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Resolved preferences file path.
    pub fn preferences_path(&self) -> Result<PathBuf, confy::ConfyError> {
        match &self.preferences_path {
            Some(path) => Ok(path.clone()),
            None => confy::get_configuration_file_path(APP_NAME, PREFERENCES_NAME),
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

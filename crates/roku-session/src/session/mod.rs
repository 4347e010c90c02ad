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

//! Device session controller.
//!
//! [`SessionController`] mediates between the persisted last-device record
//! and a live device, publishing a [`ViewState`] on a watch channel. New
//! subscribers always see the most recent state; intermediate states may be
//! skipped.
//!
//! ```text
//! Initializing
//!   -> ReconnectingLastDevice
//!        -> NoDeviceSelected
//!        -> DeviceDisconnected
//!        -> DeviceMismatch
//!        -> DeviceReconnected
//! (any) -> DeviceSelected
//! ```

mod handle;

pub use handle::{Session, SessionClosed};

use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::timeout;

use crate::device::Device;
use crate::http::{DeviceInfoClient, RequestError, DEFAULT_TIMEOUT};
use crate::store::{self, LastDevice, PreferenceStore};

/// State published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ViewState {
    Initializing,
    NoDeviceSelected,
    ReconnectingLastDevice,
    /// The remembered device answered under its remembered name.
    DeviceReconnected(Device),
    /// The remembered device could not be reached or did not answer usefully.
    DeviceDisconnected,
    /// Something answered at the remembered location under another name.
    DeviceMismatch { expected: String, found: String },
    DeviceSelected(Device),
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::NoDeviceSelected => write!(f, "no device selected"),
            Self::ReconnectingLastDevice => write!(f, "reconnecting to last device"),
            Self::DeviceReconnected(device) => write!(f, "reconnected to {device}"),
            Self::DeviceDisconnected => write!(f, "last device disconnected"),
            Self::DeviceMismatch { expected, found } => {
                write!(f, "expected '{expected}' but '{found}' answered")
            }
            Self::DeviceSelected(device) => write!(f, "selected {device}"),
        }
    }
}

/// Where a selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionSource {
    /// The user picked the device; it becomes the remembered device.
    #[default]
    User,
    /// Reconnection logic picked the device; the record is left alone.
    Reconnect,
}

/// Tunables for [`SessionController`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on the device-info round trip during reconnect,
    /// independent of any timeout the client applies itself.
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Owns the current device and the state channel.
///
/// Operations take `&mut self`, so two of them can never overlap on the same
/// controller. Use [`Session::spawn`] to drive a controller from a task.
pub struct SessionController<C, S> {
    client: C,
    store: S,
    state_tx: watch::Sender<ViewState>,
    current: Option<Device>,
    config: SessionConfig,
}

impl<C, S> fmt::Debug for SessionController<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &*self.state_tx.borrow())
            .field("current", &self.current)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C: DeviceInfoClient, S: PreferenceStore> SessionController<C, S> {
    #[must_use]
    pub fn new(client: C, store: S) -> Self {
        Self::with_config(client, store, SessionConfig::default())
    }

    #[must_use]
    pub fn with_config(client: C, store: S, config: SessionConfig) -> Self {
        let (state_tx, _) = watch::channel(ViewState::Initializing);

        Self {
            client,
            store,
            state_tx,
            current: None,
            config,
        }
    }

    /// Subscribe to state changes. The receiver starts at the current state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state_tx.subscribe()
    }

    /// Most recently published state.
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.state_tx.borrow().clone()
    }

    /// Device that requests are currently aimed at.
    #[must_use]
    pub fn current_device(&self) -> Option<&Device> {
        self.current.as_ref()
    }

    /// Try to reach the remembered device again.
    ///
    /// Never fails: every outcome is reported as the returned state, which
    /// is also the last state published.
    pub async fn reconnect_last_device(&mut self) -> ViewState {
        self.emit(ViewState::ReconnectingLastDevice);

        let (location, name) = match self.read_record() {
            LastDevice::Complete { location, name } => (location, name),
            LastDevice::None => {
                debug!("No previous device in preferences");
                return self.finish(ViewState::NoDeviceSelected);
            }
            LastDevice::Partial { location, name } => {
                warn!(
                    "Discarding incomplete previous-device record (location: {location:?}, name: {name:?})"
                );
                self.clear_last_device();
                return self.finish(ViewState::NoDeviceSelected);
            }
        };

        // Names are compared trimmed; device-info parsing trims too.
        let name = name.trim().to_string();

        let request_timeout = self.config.request_timeout;
        let response = match timeout(request_timeout, self.client.device_info(&location)).await {
            Ok(response) => response,
            Err(_elapsed) => Err(RequestError::Timeout(request_timeout)),
        };

        match response {
            Ok(info) if info.friendly_device_name == name => {
                info!("Reconnected to previous device '{name}' at {location}");
                let device = Device::new(location, name, info.device_id);
                self.current = Some(device.clone());
                self.finish(ViewState::DeviceReconnected(device))
            }
            Ok(info) => {
                info!(
                    "Device at {location} is '{}', not the remembered '{name}'",
                    info.friendly_device_name
                );
                self.finish(ViewState::DeviceMismatch {
                    expected: name,
                    found: info.friendly_device_name,
                })
            }
            Err(e) if e.is_unreachable() => {
                info!("Previous device did not respond to device-info query: {e}");
                self.clear_last_device();
                self.finish(ViewState::DeviceDisconnected)
            }
            Err(e) => {
                warn!("Previous device at {location} gave an unusable device-info answer: {e}");
                self.finish(ViewState::DeviceDisconnected)
            }
        }
    }

    /// Make `device` the current target and publish it.
    ///
    /// A [`SelectionSource::User`] selection also becomes the remembered
    /// device. Store failures are logged, never returned.
    pub fn select_device(&mut self, device: Device, source: SelectionSource) {
        if source == SelectionSource::User {
            if let Err(e) = store::write_last_device(&self.store, &device) {
                warn!("Failed to remember device '{}': {e}", device.friendly_name());
            }
        }

        debug!("Current device is now {device} ({source:?})");
        self.current = Some(device.clone());
        self.emit(ViewState::DeviceSelected(device));
    }

    fn read_record(&self) -> LastDevice {
        store::read_last_device(&self.store).unwrap_or_else(|e| {
            warn!("Failed to read previous device from preferences: {e}");
            LastDevice::None
        })
    }

    fn clear_last_device(&self) {
        if let Err(e) = store::clear_last_device(&self.store) {
            warn!("Failed to clear previous device from preferences: {e}");
        }
    }

    fn emit(&self, state: ViewState) {
        debug!("View state: {state}");
        self.state_tx.send_replace(state);
    }

    fn finish(&self, state: ViewState) -> ViewState {
        self.emit(state.clone());
        state
    }
}

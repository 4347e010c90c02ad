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

//! Durable key-value preferences and the last-device record kept in them.
//!
//! The record is two independent string entries. They are always written
//! and removed in one [`PreferenceStore::apply`] call, but a store written by
//! something else may still hold only one of them, so reads report that case
//! explicitly as [`LastDevice::Partial`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::device::Device;

/// Key holding the network location of the previously selected device.
pub const PREVIOUS_LOCATION_KEY: &str = "PREVIOUS_DEVICE_LOCATION";

/// Key holding the friendly name of the previously selected device.
pub const PREVIOUS_NAME_KEY: &str = "PREVIOUS_DEVICE_NAME";

/// Errors raised by a preference backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("preference backend error: {0}")]
    Backend(String),

    #[error("preference store lock poisoned")]
    Poisoned,
}

/// A single change within a preference commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Put { key: String, value: String },
    Remove { key: String },
}

impl Edit {
    #[must_use]
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn remove(key: impl Into<String>) -> Self {
        Self::Remove { key: key.into() }
    }
}

/// String preferences with all-or-nothing commits.
pub trait PreferenceStore: Send + Sync {
    /// Read a value. `Ok(None)` means the key is absent.
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Apply every edit as one commit. Either all edits become durable or
    /// none do.
    fn apply(&self, edits: &[Edit]) -> Result<(), StoreError>;
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Arc<T> {
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_string(key)
    }

    fn apply(&self, edits: &[Edit]) -> Result<(), StoreError> {
        (**self).apply(edits)
    }
}

/// Apply edits to an in-memory map, in order.
pub fn apply_edits(entries: &mut BTreeMap<String, String>, edits: &[Edit]) {
    for edit in edits {
        match edit {
            Edit::Put { key, value } => {
                entries.insert(key.clone(), value.clone());
            }
            Edit::Remove { key } => {
                entries.remove(key);
            }
        }
    }
}

/// Process-local [`PreferenceStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given entries.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_poisoned| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn apply(&self, edits: &[Edit]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_poisoned| StoreError::Poisoned)?;
        apply_edits(&mut entries, edits);
        Ok(())
    }
}

/// What the store knows about the previously selected device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastDevice {
    /// Neither entry is present.
    None,
    /// Exactly one entry is present.
    Partial {
        location: Option<String>,
        name: Option<String>,
    },
    /// Both entries are present.
    Complete { location: String, name: String },
}

/// Read the last-device record.
pub fn read_last_device(store: &impl PreferenceStore) -> Result<LastDevice, StoreError> {
    let location = store.get_string(PREVIOUS_LOCATION_KEY)?;
    let name = store.get_string(PREVIOUS_NAME_KEY)?;

    Ok(match (location, name) {
        (None, None) => LastDevice::None,
        (Some(location), Some(name)) => LastDevice::Complete { location, name },
        (location, name) => LastDevice::Partial { location, name },
    })
}

/// Overwrite the last-device record with `device`'s location and name.
///
/// The name is stored trimmed, matching how device-info names are parsed.
pub fn write_last_device(store: &impl PreferenceStore, device: &Device) -> Result<(), StoreError> {
    store.apply(&[
        Edit::put(PREVIOUS_LOCATION_KEY, device.location()),
        Edit::put(PREVIOUS_NAME_KEY, device.friendly_name().trim()),
    ])
}

/// Remove both entries of the last-device record.
pub fn clear_last_device(store: &impl PreferenceStore) -> Result<(), StoreError> {
    store.apply(&[
        Edit::remove(PREVIOUS_NAME_KEY),
        Edit::remove(PREVIOUS_LOCATION_KEY),
    ])
}

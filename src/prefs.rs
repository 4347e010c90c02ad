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

//! File-backed preference store.
//!
//! Preferences are a flat string map persisted as TOML with `confy`. Every
//! commit is a single load-edit-store cycle, so both halves of the
//! last-device record land in the same write.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use roku_session::store::apply_edits;
use roku_session::{Edit, PreferenceStore, StoreError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// [`PreferenceStore`] persisted to a TOML file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serialises load-edit-store cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. A missing file is an empty map and is not created.
    fn load(&self) -> Result<PreferenceFile, StoreError> {
        if !self.path.exists() {
            return Ok(PreferenceFile::default());
        }
        confy::load_path(&self.path).map_err(|e| StoreError::Backend(e.to_string()))
    }
}

impl PreferenceStore for FileStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.entries.remove(key))
    }

    fn apply(&self, edits: &[Edit]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_poisoned| StoreError::Poisoned)?;

        let mut file = self.load()?;
        apply_edits(&mut file.entries, edits);
        confy::store_path(&self.path, &file).map_err(|e| StoreError::Backend(e.to_string()))
    }
}

//! File-backed value stores, one JSON file per store scope.
//!
//! Stores are read once at the start of a run and written back atomically at
//! the end. A file that cannot be parsed is treated as a cold start rather
//! than failing every future run of the check.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use value_store::ValueStore;

use crate::config::StateConfig;
use crate::fs;
use crate::scope::{StoreScope, decode_object, object_dir, validate_component};
use crate::{Error, Result};

/// Version tag written into every store file.
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct StoreFileRef<'a> {
    version: u32,
    entries: &'a ValueStore,
}

#[derive(Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    entries: ValueStore,
}

/// Loads and persists value stores below the configured state directory.
#[derive(Debug, Clone)]
pub struct StateRepository {
    config: StateConfig,
}

impl StateRepository {
    pub fn new(config: StateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StateConfig {
        &self.config
    }

    pub fn store_path(&self, scope: &StoreScope) -> PathBuf {
        scope.path_in(&self.config.state_dir)
    }

    /// Load the store for `scope`. A missing or unreadable file yields an
    /// empty store.
    pub fn load(&self, scope: &StoreScope) -> Result<ValueStore> {
        let path = self.store_path(scope);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(scope = %scope, "No value store yet, starting empty");
                return Ok(ValueStore::new());
            }
            Err(e) => return Err(Error::io_path("reading value store", &path, e)),
        };

        Ok(decode(&raw, &path).unwrap_or_else(|| {
            warn!(scope = %scope, path = %path.display(), "Discarding unreadable value store");
            ValueStore::new()
        }))
    }

    /// Write `store` for `scope` atomically and mark it clean.
    ///
    /// Entries holding NaN or infinities cannot round-trip through JSON and
    /// are dropped first. Returns `false` when the store was unchanged and
    /// the configuration allows skipping the write.
    pub fn persist(&self, scope: &StoreScope, store: &mut ValueStore) -> Result<bool> {
        for key in store.remove_non_finite() {
            warn!(scope = %scope, key = %key, "Dropping non-finite value store entry");
        }

        if self.config.skip_unmodified && !store.is_modified() {
            debug!(scope = %scope, "Value store unchanged, not persisting");
            return Ok(false);
        }

        let path = self.store_path(scope);
        let contents = serde_json::to_vec(&StoreFileRef {
            version: FORMAT_VERSION,
            entries: store,
        })?;
        fs::write_atomic(&path, &contents)?;
        store.mark_clean();

        debug!(scope = %scope, entries = store.len(), "Value store persisted");
        Ok(true)
    }

    /// Delete the store for `scope`. Returns whether it existed.
    pub fn remove(&self, scope: &StoreScope) -> Result<bool> {
        fs::remove_file_if_exists(&self.store_path(scope))
    }

    /// Delete every store of a monitored object that is no longer evaluated.
    pub fn remove_object(&self, object: &str) -> Result<bool> {
        validate_component("object", object)?;
        let dir = object_dir(&self.config.state_dir, object);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                info!(object = %object, "Removed value stores of monitored object");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io_path("removing", &dir, e)),
        }
    }

    /// Monitored objects that currently have stores, sorted.
    pub fn objects(&self) -> Result<Vec<String>> {
        let root = &self.config.state_dir;
        let entries = match std::fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io_path("listing", root, e)),
        };

        let mut objects = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io_path("listing", root, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| Error::io_path("inspecting", &entry.path(), e))?
                .is_dir();
            if !is_dir {
                continue;
            }
            if let Some(object) = entry.file_name().to_str().and_then(decode_object) {
                objects.push(object);
            }
        }
        objects.sort();
        Ok(objects)
    }
}

fn decode(raw: &[u8], path: &Path) -> Option<ValueStore> {
    let file: StoreFile = match serde_json::from_slice(raw) {
        Ok(file) => file,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to parse value store");
            return None;
        }
    };
    if file.version != FORMAT_VERSION {
        warn!(path = %path.display(), version = file.version, "Unsupported value store version");
        return None;
    }
    Some(file.entries)
}

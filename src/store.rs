//! Persistent storage for progress.
//!
//! This module provides the key-value backends (`FileStore` on disk, `MemoryStore`
//! in process) and `ProgressStore`, the only path between in-memory progress and
//! durable storage. Reads that fail for any reason fall back to fresh progress;
//! writes are schema-checked and refused rather than persisted when invalid.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::profile::Profile;
use crate::progress::{initial_progress, AllProgress, Progress};
use crate::schema::{parse_all_progress, validate_all_progress};

/// Storage key of the progress blob.
pub const PROGRESS_KEY: &str = "questbox_progress";
/// Storage key of the catalog overlay.
pub const CATALOG_KEY: &str = "questbox_catalog";

/// String values stored under string keys.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&mut self, key: &str) -> StoreResult<()>;
}

/// One JSON file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Copy the file behind `key` to `backup/<timestamp>_<key>.json`.
    pub fn backup(&self, key: &str) -> StoreResult<PathBuf> {
        let source = self.path_for(key);
        if !source.exists() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("nothing stored under '{key}'"),
            )));
        }
        let backup_dir = self.dir.join("backup");
        fs::create_dir_all(&backup_dir)?;
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let target = backup_dir.join(format!("{timestamp}_{key}.json"));
        fs::copy(&source, &target)?;
        tracing::info!(backup = %target.display(), "backup written");
        Ok(target)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Atomic-ish write via temp + rename.
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(value.as_bytes())?;
        f.sync_all()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-process store, mainly for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Serialize)]
struct ProfileExport<'a> {
    progress: &'a Progress,
}

/// Schema-checked load, save and reset of every profile's progress.
#[derive(Debug)]
pub struct ProgressStore<S> {
    backend: S,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(backend: S) -> Self {
        ProgressStore { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Load stored progress, or fresh progress if it is absent or fails validation.
    ///
    /// Every profile in `profiles` is guaranteed an entry. A corrupt blob is left
    /// in place until the next successful save overwrites it.
    pub fn load(&self, profiles: &[Profile]) -> AllProgress {
        let raw = match self.backend.get(PROGRESS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!("no stored progress, starting fresh");
                return initial_progress(profiles);
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored progress, starting fresh");
                return initial_progress(profiles);
            }
        };
        match parse_all_progress(&raw) {
            Ok(mut all) => {
                for p in profiles {
                    all.entry(p.id.clone()).or_default();
                }
                tracing::info!(profiles = all.len(), "progress loaded");
                all
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored progress is invalid, starting fresh");
                initial_progress(profiles)
            }
        }
    }

    /// Validate and persist. Invalid data is refused and the last good blob kept.
    pub fn save(&mut self, all: &AllProgress) -> StoreResult<()> {
        let value = serde_json::to_value(all)?;
        if let Err(e) = validate_all_progress(&value) {
            tracing::error!(error = %e, "refusing to save invalid progress");
            return Err(e.into());
        }
        let data = serde_json::to_string_pretty(&value)?;
        self.backend.set(PROGRESS_KEY, &data)?;
        tracing::debug!(bytes = data.len(), "progress saved");
        Ok(())
    }

    /// Remove the stored blob and hand back fresh progress for every profile.
    pub fn reset_all(&mut self, profiles: &[Profile]) -> StoreResult<AllProgress> {
        self.backend.remove(PROGRESS_KEY)?;
        tracing::info!("all progress reset");
        Ok(initial_progress(profiles))
    }

    /// Pretty JSON `{ "progress": ... }` for one profile.
    pub fn export_profile(&self, all: &AllProgress, profile_id: &str) -> StoreResult<String> {
        let progress = all
            .get(profile_id)
            .ok_or_else(|| StoreError::UnknownProfile(profile_id.to_string()))?;
        Ok(serde_json::to_string_pretty(&ProfileExport { progress })?)
    }
}

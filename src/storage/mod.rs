//! Storage layer for levelup records.
//!
//! Records are JSON documents, one per key, held by a [`RecordStore`]
//! backend. The typed [`Store`] wrapper owns the failure policy:
//!
//! - absent or malformed records decode as "no record" (callers substitute
//!   a documented default)
//! - backend read errors are treated the same way
//! - backend write errors are logged and skipped
//!
//! so an unavailable or corrupted store degrades to "as if no history
//! existed yet" instead of failing the caller.
//!
//! ## Versioning
//!
//! Every record carries a `version` field. Records written before versioning
//! existed (version 0, camelCase field names) are accepted through serde
//! aliases and upgraded by [`Record::upgrade`] when read.

pub mod backend;
pub mod file;
pub mod memory;

pub use backend::{BackendType, RecordStore};
pub use file::FileBackend;
pub use memory::MemoryBackend;

use crate::models::{DailyProgress, LevelData, RECORD_VERSION, RewardData, StreakData};
use crate::scoring;
use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Key of the live `DailyProgress` record.
pub const DAILY_PROGRESS_KEY: &str = "level-up-daily-progress";
/// Key of the `StreakData` record.
pub const STREAK_DATA_KEY: &str = "level-up-streak-data";
/// Key of the `LevelData` record.
pub const LEVEL_DATA_KEY: &str = "level-up-level-data";
/// Key of the `RewardData` record.
pub const REWARD_DATA_KEY: &str = "level-up-reward-data";
/// Key of the hardcore-mode flag (`"true"` / `"false"`).
pub const HARDCORE_MODE_KEY: &str = "level-up-hardcore-mode";

/// A persisted record type with a fixed key.
pub trait Record: Serialize + DeserializeOwned {
    const KEY: &'static str;

    fn version(&self) -> u32;

    /// Bring an older record up to [`RECORD_VERSION`].
    fn upgrade(&mut self);
}

impl Record for DailyProgress {
    const KEY: &'static str = DAILY_PROGRESS_KEY;

    fn version(&self) -> u32 {
        self.version
    }

    fn upgrade(&mut self) {
        self.version = RECORD_VERSION;
    }
}

impl Record for StreakData {
    const KEY: &'static str = STREAK_DATA_KEY;

    fn version(&self) -> u32 {
        self.version
    }

    fn upgrade(&mut self) {
        // v0 history was only sorted on write
        self.history.sort_by_key(|e| e.date);
        self.version = RECORD_VERSION;
    }
}

impl Record for LevelData {
    const KEY: &'static str = LEVEL_DATA_KEY;

    fn version(&self) -> u32 {
        self.version
    }

    fn upgrade(&mut self) {
        // v0 stored derived fields; recompute them from the XP total
        let band = scoring::level_for_xp(self.total_xp);
        self.level = band.level;
        self.progress = band.progress;
        self.next_level_xp = band.next_level_xp;
        self.version = RECORD_VERSION;
    }
}

impl Record for RewardData {
    const KEY: &'static str = REWARD_DATA_KEY;

    fn version(&self) -> u32 {
        self.version
    }

    fn upgrade(&mut self) {
        self.weekly.sort_by_key(|e| e.date);
        self.version = RECORD_VERSION;
    }
}

/// Typed access to records over any backend.
pub struct Store<B: RecordStore> {
    backend: B,
}

impl<B: RecordStore> Store<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[cfg(test)]
    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Read and decode a record. `None` when absent, malformed or unreadable.
    pub fn load<R: Record>(&self) -> Option<R> {
        let raw = match self.backend.get(R::KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = R::KEY, error = %e, "record store read failed; using defaults");
                return None;
            }
        };

        let mut record: R = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key = R::KEY, error = %e, "malformed record ignored");
                return None;
            }
        };

        if record.version() < RECORD_VERSION {
            tracing::debug!(key = R::KEY, from = record.version(), to = RECORD_VERSION, "upgrading record");
            record.upgrade();
        }
        Some(record)
    }

    /// Read a record or fall back to its default.
    pub fn load_or_default<R: Record + Default>(&self) -> R {
        self.load().unwrap_or_default()
    }

    /// Encode and write a record. Failures are logged, never returned.
    pub fn save<R: Record>(&mut self, record: &R) {
        let encoded = match serde_json::to_string(record) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(key = R::KEY, error = %e, "record encode failed; write skipped");
                return;
            }
        };
        self.put_raw(R::KEY, &encoded);
    }

    /// Read a boolean flag stored as `"true"` / `"false"`.
    pub fn load_flag(&self, key: &str) -> bool {
        match self.backend.get(key) {
            Ok(Some(raw)) => raw.trim() == "true",
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(key, error = %e, "record store read failed; flag treated as off");
                false
            }
        }
    }

    pub fn save_flag(&mut self, key: &str, value: bool) {
        self.put_raw(key, if value { "true" } else { "false" });
    }

    fn put_raw(&mut self, key: &str, value: &str) {
        if let Err(e) = self.backend.put(key, value) {
            tracing::warn!(key, error = %e, "record store write failed; change not persisted");
        }
    }
}

/// Default data directory: `<XDG data dir>/levelup`.
pub fn default_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("levelup"))
}

/// Open a backend of the requested type.
///
/// If the file backend cannot be opened the store is unavailable; an
/// in-memory backend stands in so reads return defaults and writes vanish.
pub fn open_backend(kind: BackendType, data_dir: &Path) -> Box<dyn RecordStore> {
    let backend: Box<dyn RecordStore> = match kind {
        BackendType::Memory => Box::new(MemoryBackend::new()),
        BackendType::File => match FileBackend::open(data_dir) {
            Ok(backend) => Box::new(backend),
            Err(e) => {
                tracing::warn!(
                    path = %data_dir.display(),
                    error = %e,
                    "data directory unavailable; progress will not be saved"
                );
                Box::new(MemoryBackend::new())
            }
        },
    };
    tracing::debug!(
        backend = backend.backend_type(),
        location = %backend.location(),
        "record store opened"
    );
    backend
}

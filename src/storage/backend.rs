//! Record store trait and backend selection.
//!
//! This module provides the storage abstraction the engine runs on:
//! - `FileBackend` - One JSON file per key under a data directory (default)
//! - `MemoryBackend` - Process-local map, for tests and as a fallback

use crate::Result;

/// Trait for key-value stores that hold raw record JSON.
///
/// One record per key, no secondary indices. Implementations decide where
/// the bytes live; decoding and fallbacks are handled by [`super::Store`].
pub trait RecordStore: Send + Sync {
    /// Read the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn put(&mut self, key: &str, value: &str) -> Result<()>;

    /// Get the storage location description (for display purposes).
    fn location(&self) -> String;

    /// Get the backend type name.
    fn backend_type(&self) -> &'static str;
}

impl<T: RecordStore + ?Sized> RecordStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn location(&self) -> String {
        (**self).location()
    }

    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }
}

/// Available record store backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendType {
    /// JSON files under the data directory (default)
    #[default]
    File,
    /// In-memory only; nothing survives the process
    Memory,
}

impl BackendType {
    /// Parse a backend type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "file" | "default" => Some(Self::File),
            "memory" | "mem" | "ephemeral" => Some(Self::Memory),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

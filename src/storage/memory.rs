//! In-memory storage backend.

use super::backend::RecordStore;
use crate::Result;
use std::collections::BTreeMap;

/// Record store that keeps everything in a map for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    records: BTreeMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

impl RecordStore for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

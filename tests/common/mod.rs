//! Common test utilities for levelup integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't touch the
//! user's real data directory or config.kdl.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// Every task in the default catalog as (category, task).
pub const ALL_TASKS: [(&str, &str); 10] = [
    ("mindset", "meditation"),
    ("mindset", "journaling"),
    ("fitness", "workout"),
    ("fitness", "hydration"),
    ("productivity", "study"),
    ("productivity", "reading"),
    ("communication", "social"),
    ("communication", "gratitude"),
    ("discipline", "sleep"),
    ("discipline", "routine"),
];

/// A test environment with isolated data and config.
///
/// The `lu()` method returns a `Command` that sets `LU_DATA_DIR` and
/// `LU_CONFIG` per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the lu binary with isolated directories.
    pub fn lu(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_lu"));
        cmd.current_dir(self.data_dir.path());
        cmd.env("LU_DATA_DIR", self.data_dir.path());
        cmd.env("LU_CONFIG", self.config_path());
        cmd.env_remove("LU_API_KEY");
        cmd.env_remove("LU_TODAY");
        cmd.env_remove("LU_LOG");
        cmd
    }

    /// A Command with the clock pinned to `date`.
    pub fn lu_on(&self, date: &str) -> Command {
        let mut cmd = self.lu();
        cmd.env("LU_TODAY", date);
        cmd
    }

    /// Run a command on `date` and parse its JSON output.
    pub fn json_on(&self, date: &str, args: &[&str]) -> serde_json::Value {
        let output = self.lu_on(date).args(args).assert().success().get_output().stdout.clone();
        serde_json::from_slice(&output).unwrap()
    }

    /// Mark every task full on `date` (100 points).
    pub fn complete_day(&self, date: &str) -> serde_json::Value {
        let mut last = serde_json::Value::Null;
        for (category, task) in ALL_TASKS {
            last = self.json_on(date, &["mark", category, task, "full"]);
        }
        last
    }

    pub fn data_path(&self) -> &Path {
        self.data_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.path().join("config.kdl")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

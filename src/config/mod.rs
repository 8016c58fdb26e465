//! Configuration management for levelup.
//!
//! ## config.kdl - User preferences
//!
//! Located at `~/.config/levelup/config.kdl` (override with `LU_CONFIG`).
//!
//! Contains:
//! - `output-format` - "json" or "human"
//! - `data-dir` - Directory holding the record files
//! - `backend` - "file" or "memory"
//! - `catalog` - JSON file replacing the built-in catalog
//! - `coach-endpoint` / `coach-model` - Text-completion API settings
//! - `action-log` - Whether commands are appended to `action.log`
//!
//! The coach API key is never stored here; it is read from `LU_API_KEY`.
//!
//! ## Precedence
//!
//! CLI flag > environment > config.kdl > defaults.
//! Use the [`resolver`] module for unified precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    API_KEY_ENV, CONFIG_PATH_ENV, ConfigOverrides, DATA_DIR_ENV, DEFAULT_COACH_ENDPOINT,
    DEFAULT_COACH_MODEL, Resolved, ResolvedConfig, ValueSource, config_path, load_config,
    resolve_config, save_config,
};
pub use schema::{CONFIG_KEYS, LevelUpConfig, OutputFormat};

//! levelup - A gamified habit tracker library.
//!
//! This library provides the core functionality for the `lu` CLI tool:
//! daily task scoring, streaks, experience levels and weekly rewards,
//! persisted as JSON records behind a pluggable record store.

pub mod action_log;
pub mod cli;
pub mod clock;
pub mod coach;
pub mod commands;
pub mod config;
pub mod models;
pub mod scoring;
pub mod storage;
pub mod tracker;

pub use tracker::Tracker;


/// Library-level error type for levelup operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Kdl(#[from] kdl::KdlError),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Coach request failed: {0}")]
    Http(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for levelup operations.
pub type Result<T> = std::result::Result<T, Error>;

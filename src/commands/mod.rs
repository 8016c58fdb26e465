//! Command implementations for the `lu` CLI.
//!
//! Each command returns a result struct implementing [`CommandResult`], so
//! `main` can print it as JSON (default) or human-readable text.
//! Commands are organized by area:
//! - `progress` - Daily scoring, streaks, levels and rewards
//! - `catalog` - Catalog listing and invariant check
//! - `coach` - Coach features
//! - `config` - config.kdl management

pub mod catalog;
pub mod coach;
pub mod config;
pub mod progress;

pub use catalog::{CatalogCheckResult, CatalogResult, catalog_check, catalog_show};
pub use coach::{
    coach_chat, coach_insights, coach_mood, coach_plan, coach_reward, coach_scale, coach_summary,
    parse_missed_habit,
};
pub use config::{ConfigGetResult, ConfigSetResult, ConfigShowResult, config_get, config_set, config_show};
pub use progress::{
    ClaimResult, DayResult, HardcoreResult, LevelResult, RewardsResult, StatusResult, StreakResult,
    TodayResult, claim, hardcore, hardcore_show, level, mark, rewards, status, streak, today,
    toggle_habit,
};

use serde::Serialize;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait CommandResult: Serialize {
    /// Serialize to JSON string.
    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Format points with one decimal.
pub(crate) fn pts(points: f64) -> String {
    format!("{:.1}", points)
}

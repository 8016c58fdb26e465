//! Data models for levelup records.
//!
//! This module defines the persisted records:
//! - `DailyProgress` - Today's task statuses and point total
//! - `StreakData` - Current/longest streak plus recent daily history
//! - `LevelData` - Cumulative XP and the level band it falls in
//! - `RewardData` - Weekly series, unlock marker and claim history
//!
//! Field aliases accept the legacy camelCase record shape (version 0).

pub mod catalog;
pub mod level;

pub use catalog::{Catalog, CatalogIssue, Category, NegativeHabit, Reward, Task};
pub use level::{Level, LevelProgress};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Schema version stamped on every record written by this crate.
pub const RECORD_VERSION: u32 = 1;

/// Unlock marker set on `RewardData::unlocked` while a reward is pending.
pub const REWARD_AVAILABLE: &str = "available";

/// Completion status of a single task. "Unset" is the absence of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Full,
    Half,
    Missed,
}

impl TaskStatus {
    /// Parse a status name. `unset`/`none` yield `Ok(None)`.
    pub fn parse(s: &str) -> crate::Result<Option<Self>> {
        match s.to_lowercase().as_str() {
            "full" | "done" => Ok(Some(Self::Full)),
            "half" | "partial" => Ok(Some(Self::Half)),
            "missed" | "miss" => Ok(Some(Self::Missed)),
            "unset" | "none" | "clear" => Ok(None),
            _ => Err(crate::Error::InvalidInput(format!(
                "Invalid status: {} (expected full, half, missed or unset)",
                s
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Half => "half",
            Self::Missed => "missed",
        }
    }

    /// Share of the task's points this status earns.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Full => 1.0,
            Self::Half => 0.5,
            Self::Missed => 0.0,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task id -> status within one category. `null` values mean unset.
pub type TaskStatuses = BTreeMap<String, Option<TaskStatus>>;

/// Category id -> task statuses.
pub type CategoryStatuses = BTreeMap<String, TaskStatuses>;

/// One day's point total in a history series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayPoints {
    pub date: NaiveDate,
    pub points: f64,
}

impl DayPoints {
    pub fn new(date: NaiveDate, points: f64) -> Self {
        Self { date, points }
    }
}

/// Today's progress. Superseded (not deleted) when the date rolls over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProgress {
    #[serde(default)]
    pub version: u32,

    /// Calendar date this record belongs to
    pub date: NaiveDate,

    /// Point total, floored at zero and rounded to one decimal
    #[serde(default)]
    pub points: f64,

    #[serde(default)]
    pub categories: CategoryStatuses,

    #[serde(default, alias = "hardcoreMode")]
    pub hardcore_mode: bool,

    /// Negative habit id -> toggled on
    #[serde(default, alias = "negativeHabits")]
    pub negative_habits: BTreeMap<String, bool>,

    /// Penalty currently subtracted from the total
    #[serde(default, alias = "negativePoints")]
    pub negative_points: f64,

    /// Set once the total reaches the daily goal
    #[serde(default)]
    pub completed: bool,
}

impl DailyProgress {
    /// A zero-point record for `date`.
    pub fn fresh(date: NaiveDate, hardcore_mode: bool) -> Self {
        Self {
            version: RECORD_VERSION,
            date,
            points: 0.0,
            categories: CategoryStatuses::new(),
            hardcore_mode,
            negative_habits: BTreeMap::new(),
            negative_points: 0.0,
            completed: false,
        }
    }

    /// Status of a task, if one has been recorded.
    pub fn status(&self, category_id: &str, task_id: &str) -> Option<TaskStatus> {
        self.categories
            .get(category_id)
            .and_then(|tasks| tasks.get(task_id))
            .copied()
            .flatten()
    }

    /// Record (or clear, with `None`) a task status.
    pub fn set_status(&mut self, category_id: &str, task_id: &str, status: Option<TaskStatus>) {
        let tasks = self.categories.entry(category_id.to_string()).or_default();
        match status {
            Some(status) => {
                tasks.insert(task_id.to_string(), Some(status));
            }
            None => {
                tasks.remove(task_id);
            }
        }
    }

    /// Whether a negative habit is toggled on today.
    pub fn habit_enabled(&self, habit_id: &str) -> bool {
        self.negative_habits.get(habit_id).copied().unwrap_or(false)
    }
}

/// Streak state: consecutive qualifying days ending today.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreakData {
    #[serde(default)]
    pub version: u32,

    #[serde(default, alias = "currentStreak")]
    pub current_streak: u32,

    /// All-time longest streak; only ever raised
    #[serde(default, alias = "longestStreak")]
    pub longest_streak: u32,

    /// Most recent daily totals, ascending by date
    #[serde(default, alias = "streakHistory")]
    pub history: Vec<DayPoints>,
}

/// Experience total and level band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    #[serde(default)]
    pub version: u32,

    #[serde(default, alias = "totalXP")]
    pub total_xp: f64,

    #[serde(default, alias = "currentLevel")]
    pub level: Level,

    /// Percent progress through the current band, 0-100
    #[serde(default, alias = "levelProgress")]
    pub progress: f64,

    /// XP needed for the next band; `None` at the top band
    #[serde(default, alias = "nextLevelXP")]
    pub next_level_xp: Option<f64>,

    /// Date of the last XP credit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credited_date: Option<NaiveDate>,

    /// Points already credited for `credited_date`
    #[serde(default)]
    pub credited_points: f64,
}

impl Default for LevelData {
    fn default() -> Self {
        let band = LevelProgress::for_xp(0.0);
        Self {
            version: RECORD_VERSION,
            total_xp: 0.0,
            level: band.level,
            progress: band.progress,
            next_level_xp: band.next_level_xp,
            credited_date: None,
            credited_points: 0.0,
        }
    }
}

/// A claimed reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardClaim {
    pub date: NaiveDate,
    pub reward: String,
}

/// Weekly reward state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardData {
    #[serde(default)]
    pub version: u32,

    /// Mean of the latest (up to 7) weekly entries, one decimal
    #[serde(default, alias = "weekAverage")]
    pub week_average: f64,

    /// Holds `REWARD_AVAILABLE` while a reward is pending
    #[serde(default, alias = "rewardsUnlocked")]
    pub unlocked: Vec<String>,

    #[serde(default, alias = "rewardHistory")]
    pub history: Vec<RewardClaim>,

    /// Current week's daily totals
    #[serde(default, alias = "weeklyData")]
    pub weekly: Vec<DayPoints>,
}

impl RewardData {
    /// Whether the unlock marker is set (a reward can be claimed).
    pub fn is_pending(&self) -> bool {
        !self.unlocked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::date;

    #[test]
    fn test_task_status_parse() {
        assert_eq!(TaskStatus::parse("full").unwrap(), Some(TaskStatus::Full));
        assert_eq!(TaskStatus::parse("HALF").unwrap(), Some(TaskStatus::Half));
        assert_eq!(TaskStatus::parse("missed").unwrap(), Some(TaskStatus::Missed));
        assert_eq!(TaskStatus::parse("unset").unwrap(), None);
        assert!(TaskStatus::parse("sometimes").is_err());
    }

    #[test]
    fn test_task_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TaskStatus::Half).unwrap(), "\"half\"");
    }

    #[test]
    fn test_set_status_unset_removes_entry() {
        let mut progress = DailyProgress::fresh(date("2024-05-01"), false);
        progress.set_status("fitness", "workout", Some(TaskStatus::Full));
        assert_eq!(progress.status("fitness", "workout"), Some(TaskStatus::Full));

        progress.set_status("fitness", "workout", None);
        assert_eq!(progress.status("fitness", "workout"), None);
        assert!(progress.categories["fitness"].is_empty());
    }

    #[test]
    fn test_daily_progress_accepts_legacy_shape() {
        let legacy = r#"{
            "date": "2024-05-01",
            "points": 42.5,
            "categories": {"mindset": {"meditation": "full", "journaling": null}},
            "hardcoreMode": true,
            "negativePoints": 0,
            "completed": false
        }"#;
        let progress: DailyProgress = serde_json::from_str(legacy).unwrap();
        assert_eq!(progress.version, 0);
        assert!(progress.hardcore_mode);
        assert_eq!(progress.status("mindset", "meditation"), Some(TaskStatus::Full));
        assert_eq!(progress.status("mindset", "journaling"), None);
    }

    #[test]
    fn test_level_data_accepts_legacy_top_band() {
        let legacy = r#"{"totalXP": 2500, "currentLevel": "Life Hacker", "levelProgress": 100, "nextLevelXP": null}"#;
        let level: LevelData = serde_json::from_str(legacy).unwrap();
        assert_eq!(level.level, Level::LifeHacker);
        assert_eq!(level.next_level_xp, None);
        assert_eq!(level.total_xp, 2500.0);
    }

    #[test]
    fn test_reward_data_pending() {
        let mut data = RewardData::default();
        assert!(!data.is_pending());
        data.unlocked.push(REWARD_AVAILABLE.to_string());
        assert!(data.is_pending());
    }
}

//! Daily scoring, streak, level and reward commands.

use super::{CommandResult, pts};
use crate::models::{
    Catalog, DailyProgress, Level, LevelData, Reward, RewardData, StreakData, TaskStatus,
    TaskStatuses,
};
use crate::scoring::{self, StreakTitle};
use crate::storage::RecordStore;
use crate::tracker::{DayOutcome, Snapshot, Tracker};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;

// === Status ===

#[derive(Debug, Serialize)]
pub struct StatusResult {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    pub max_points: f64,
    pub reward_available: bool,
}

impl CommandResult for StatusResult {
    fn to_human(&self) -> String {
        let s = &self.snapshot;
        let mut lines = vec![format!(
            "{}  {}/{} pts{}",
            s.today,
            pts(s.progress.points),
            pts(self.max_points),
            if s.progress.hardcore_mode { " (hardcore)" } else { "" }
        )];
        lines.push(format!(
            "Streak: {} day(s), {}{} | best {}",
            s.streak.current_streak,
            s.streak_title.title,
            bonus_suffix(&s.streak_title),
            s.streak.longest_streak
        ));
        lines.push(format!("Level: {}", level_line(&s.level)));
        lines.push(format!(
            "Week average: {}{}",
            pts(s.reward.week_average),
            if self.reward_available {
                " | reward available!"
            } else {
                ""
            }
        ));
        lines.join("\n")
    }
}

/// Snapshot of every record for today.
pub fn status<B: RecordStore>(tracker: &Tracker<B>) -> StatusResult {
    let snapshot = tracker.snapshot();
    StatusResult {
        max_points: tracker.catalog().max_points(),
        reward_available: snapshot.reward.is_pending(),
        snapshot,
    }
}

// === Today ===

#[derive(Debug, Serialize)]
pub struct TaskView {
    pub id: String,
    pub name: String,
    pub points: f64,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub points: f64,
    pub max_points: f64,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct HabitView {
    pub id: String,
    pub name: String,
    pub penalty: f64,
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct TodayResult {
    pub date: NaiveDate,
    pub points: f64,
    pub max_points: f64,
    pub completed: bool,
    pub hardcore_mode: bool,
    pub negative_points: f64,
    pub categories: Vec<CategoryView>,
    pub negative_habits: Vec<HabitView>,
}

impl TodayResult {
    pub(crate) fn build(catalog: &Catalog, progress: &DailyProgress) -> Self {
        let empty = TaskStatuses::new();
        let categories = catalog
            .categories
            .iter()
            .map(|category| {
                let statuses = progress.categories.get(&category.id).unwrap_or(&empty);
                CategoryView {
                    id: category.id.clone(),
                    name: category.name.clone(),
                    icon: category.icon.clone(),
                    points: scoring::category_points(category, statuses),
                    max_points: category.points,
                    tasks: category
                        .tasks
                        .iter()
                        .map(|task| TaskView {
                            id: task.id.clone(),
                            name: task.name.clone(),
                            points: task.points,
                            status: progress
                                .status(&category.id, &task.id)
                                .or(task.default_status),
                        })
                        .collect(),
                }
            })
            .collect();
        let negative_habits = catalog
            .negative_habits
            .iter()
            .map(|habit| HabitView {
                id: habit.id.clone(),
                name: habit.name.clone(),
                penalty: habit.penalty,
                enabled: progress.habit_enabled(&habit.id),
            })
            .collect();

        Self {
            date: progress.date,
            points: progress.points,
            max_points: catalog.max_points(),
            completed: progress.completed,
            hardcore_mode: progress.hardcore_mode,
            negative_points: progress.negative_points,
            categories,
            negative_habits,
        }
    }
}

impl CommandResult for TodayResult {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "{}: {}/{} pts{}",
            self.date,
            pts(self.points),
            pts(self.max_points),
            if self.completed { " (goal reached)" } else { "" }
        )];
        for category in &self.categories {
            lines.push(format!(
                "\n{} [{}] {}/{}",
                category.name,
                category.id,
                pts(category.points),
                pts(category.max_points)
            ));
            for task in &category.tasks {
                let mark = match task.status {
                    Some(TaskStatus::Full) => "[x]",
                    Some(TaskStatus::Half) => "[~]",
                    Some(TaskStatus::Missed) => "[-]",
                    None => "[ ]",
                };
                lines.push(format!(
                    "  {} {} ({}, {} pts)",
                    mark,
                    task.name,
                    task.id,
                    pts(task.points)
                ));
            }
        }
        if self.hardcore_mode {
            lines.push(format!(
                "\nHardcore mode: -{} pts",
                pts(self.negative_points)
            ));
            for habit in &self.negative_habits {
                lines.push(format!(
                    "  {} {} ({}, -{})",
                    if habit.enabled { "[!]" } else { "[ ]" },
                    habit.name,
                    habit.id,
                    pts(habit.penalty)
                ));
            }
        }
        lines.join("\n")
    }
}

/// Today's record with per-category points.
pub fn today<B: RecordStore>(tracker: &Tracker<B>) -> TodayResult {
    let mut progress = tracker.daily_progress();
    progress.hardcore_mode = progress.hardcore_mode || tracker.hardcore_mode();
    TodayResult::build(tracker.catalog(), &progress)
}

// === Day updates (mark / habit / hardcore) ===

#[derive(Debug, Serialize)]
pub struct DayResult {
    pub change: String,
    pub date: NaiveDate,
    pub points: f64,
    pub max_points: f64,
    pub completed: bool,
    pub newly_completed: bool,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub streak_title: StreakTitle,
    pub total_xp: f64,
    pub level: Level,
    pub week_average: f64,
    pub reward_available: bool,
    pub reward_unlocked: bool,
}

impl DayResult {
    fn from_outcome(change: String, catalog: &Catalog, outcome: DayOutcome) -> Self {
        Self {
            change,
            date: outcome.progress.date,
            points: outcome.progress.points,
            max_points: catalog.max_points(),
            completed: outcome.progress.completed,
            newly_completed: outcome.newly_completed,
            current_streak: outcome.streak.current_streak,
            longest_streak: outcome.streak.longest_streak,
            streak_title: scoring::streak_title(outcome.streak.current_streak),
            total_xp: outcome.level.total_xp,
            level: outcome.level.level,
            week_average: outcome.reward.week_average,
            reward_available: outcome.reward.is_pending(),
            reward_unlocked: outcome.reward_unlocked,
        }
    }
}

impl CommandResult for DayResult {
    fn to_human(&self) -> String {
        let mut lines = vec![
            self.change.clone(),
            format!(
                "Today: {}/{} pts",
                pts(self.points),
                pts(self.max_points)
            ),
            format!(
                "Streak {} ({}) | {} XP ({}) | week avg {}",
                self.current_streak,
                self.streak_title.title,
                pts(self.total_xp),
                self.level,
                pts(self.week_average)
            ),
        ];
        if self.newly_completed {
            lines.push("Daily goal reached!".to_string());
        }
        if self.reward_unlocked {
            lines.push("Weekly reward unlocked! Claim it with `lu claim <reward-id>`.".to_string());
        }
        lines.join("\n")
    }
}

/// Set one task's status for today.
pub fn mark<B: RecordStore>(
    tracker: &mut Tracker<B>,
    category_id: &str,
    task_id: &str,
    status: &str,
) -> Result<DayResult> {
    let status = TaskStatus::parse(status)?;
    let outcome = tracker.set_task_status(category_id, task_id, status)?;
    let change = format!(
        "Marked {}/{}: {}",
        category_id,
        task_id,
        status.map_or("unset", |s| s.as_str())
    );
    Ok(DayResult::from_outcome(change, tracker.catalog(), outcome))
}

/// Toggle a negative habit for today.
pub fn toggle_habit<B: RecordStore>(tracker: &mut Tracker<B>, habit_id: &str) -> Result<DayResult> {
    let outcome = tracker.toggle_negative_habit(habit_id)?;
    let enabled = outcome.progress.habit_enabled(habit_id);
    let mut change = format!(
        "Habit {}: {}",
        habit_id,
        if enabled { "on" } else { "off" }
    );
    if !outcome.progress.hardcore_mode {
        change.push_str(" (no penalty outside hardcore mode)");
    }
    Ok(DayResult::from_outcome(change, tracker.catalog(), outcome))
}

#[derive(Debug, Serialize)]
pub struct HardcoreResult {
    pub hardcore_mode: bool,
    #[serde(flatten)]
    pub day: Option<DayResult>,
}

impl CommandResult for HardcoreResult {
    fn to_human(&self) -> String {
        match &self.day {
            Some(day) => day.to_human(),
            None => format!(
                "Hardcore mode is {}",
                if self.hardcore_mode { "on" } else { "off" }
            ),
        }
    }
}

/// Turn hardcore mode on or off and rescore today.
pub fn hardcore<B: RecordStore>(tracker: &mut Tracker<B>, enabled: bool) -> HardcoreResult {
    let outcome = tracker.set_hardcore_mode(enabled);
    let change = format!("Hardcore mode {}", if enabled { "on" } else { "off" });
    HardcoreResult {
        hardcore_mode: enabled,
        day: Some(DayResult::from_outcome(change, tracker.catalog(), outcome)),
    }
}

pub fn hardcore_show<B: RecordStore>(tracker: &Tracker<B>) -> HardcoreResult {
    HardcoreResult {
        hardcore_mode: tracker.hardcore_mode(),
        day: None,
    }
}

// === Streak / level ===

#[derive(Debug, Serialize)]
pub struct StreakResult {
    #[serde(flatten)]
    pub streak: StreakData,
    pub title: StreakTitle,
    pub qualifying_points: f64,
}

impl CommandResult for StreakResult {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!(
                "Current streak: {} day(s), {}{}",
                self.streak.current_streak,
                self.title.title,
                bonus_suffix(&self.title)
            ),
            format!("Longest streak: {} day(s)", self.streak.longest_streak),
        ];
        let recent = &self.streak.history[self.streak.history.len().saturating_sub(7)..];
        if !recent.is_empty() {
            lines.push(format!("Last {} day(s):", recent.len()));
            for day in recent {
                let mark = if scoring::qualifies_for_streak(day.points) {
                    "*"
                } else {
                    " "
                };
                lines.push(format!("  {} {} {}", mark, day.date, pts(day.points)));
            }
        }
        lines.join("\n")
    }
}

pub fn streak<B: RecordStore>(tracker: &Tracker<B>) -> StreakResult {
    let streak = tracker.streak_data();
    StreakResult {
        title: scoring::streak_title(streak.current_streak),
        streak,
        qualifying_points: scoring::STREAK_QUALIFYING_POINTS,
    }
}

#[derive(Debug, Serialize)]
pub struct LevelResult {
    #[serde(flatten)]
    pub level: LevelData,
    /// XP still needed for the next band
    pub xp_to_next: Option<f64>,
}

impl CommandResult for LevelResult {
    fn to_human(&self) -> String {
        let mut out = format!("Level: {}", level_line(&self.level));
        if let Some(needed) = self.xp_to_next {
            out.push_str(&format!("\n{} XP to go", pts(needed)));
        }
        out
    }
}

pub fn level<B: RecordStore>(tracker: &Tracker<B>) -> LevelResult {
    let level = tracker.level_data();
    LevelResult {
        xp_to_next: level
            .next_level_xp
            .map(|next| scoring::round1((next - level.total_xp).max(0.0))),
        level,
    }
}

// === Rewards ===

#[derive(Debug, Serialize)]
pub struct RewardsResult {
    #[serde(flatten)]
    pub reward: RewardData,
    pub available: bool,
    pub unlock_average: f64,
    pub rewards: Vec<Reward>,
}

impl CommandResult for RewardsResult {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Week average: {} (unlocks at {})",
            pts(self.reward.week_average),
            pts(self.unlock_average)
        )];
        if self.available {
            lines.push("A reward is available. Choose one:".to_string());
            for reward in &self.rewards {
                lines.push(format!("  {} - {}: {}", reward.id, reward.name, reward.description));
            }
        }
        if !self.reward.history.is_empty() {
            lines.push("Claimed:".to_string());
            for claim in &self.reward.history {
                lines.push(format!("  {} {}", claim.date, claim.reward));
            }
        }
        lines.join("\n")
    }
}

pub fn rewards<B: RecordStore>(tracker: &Tracker<B>) -> RewardsResult {
    let reward = tracker.reward_data();
    RewardsResult {
        available: reward.is_pending(),
        reward,
        unlock_average: scoring::REWARD_UNLOCK_AVERAGE,
        rewards: tracker.catalog().rewards.clone(),
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimResult {
    pub date: NaiveDate,
    pub reward: Reward,
}

impl CommandResult for ClaimResult {
    fn to_human(&self) -> String {
        format!("Enjoy your {}! {}", self.reward.name, self.reward.description)
    }
}

/// Claim a pending reward by catalog id.
pub fn claim<B: RecordStore>(tracker: &mut Tracker<B>, reward_id: &str) -> Result<ClaimResult> {
    let reward = tracker
        .catalog()
        .reward(reward_id)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("reward '{}'", reward_id)))?;
    if !tracker.reward_data().is_pending() {
        return Err(Error::InvalidInput(format!(
            "no reward available; a weekly average of {} unlocks one",
            scoring::REWARD_UNLOCK_AVERAGE
        )));
    }
    tracker.claim_reward(reward_id);
    Ok(ClaimResult {
        date: tracker.today(),
        reward,
    })
}

fn bonus_suffix(title: &StreakTitle) -> String {
    if title.bonus > 0 {
        format!(" (+{} bonus)", title.bonus)
    } else {
        String::new()
    }
}

fn level_line(level: &LevelData) -> String {
    match level.next_level_xp {
        Some(next) => format!(
            "{} ({} / {} XP, {:.0}%)",
            level.level,
            pts(level.total_xp),
            pts(next),
            level.progress
        ),
        None => format!("{} ({} XP, max level)", level.level, pts(level.total_xp)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::memory_tracker;

    #[test]
    fn test_mark_reports_day() {
        let mut tracker = memory_tracker("2024-03-04");
        let result = mark(&mut tracker, "fitness", "workout", "full").unwrap();
        assert_eq!(result.points, 15.0);
        assert_eq!(result.max_points, 100.0);
        assert_eq!(result.total_xp, 15.0);
        assert!(!result.newly_completed);
        assert!(result.to_human().contains("Marked fitness/workout: full"));

        let json: serde_json::Value = serde_json::from_str(&result.to_json()).unwrap();
        assert_eq!(json["points"], 15.0);
        assert_eq!(json["level"], "Novice");
    }

    #[test]
    fn test_mark_rejects_unknown_ids_and_status() {
        let mut tracker = memory_tracker("2024-03-04");
        assert!(matches!(
            mark(&mut tracker, "fitness", "yoga", "full"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            mark(&mut tracker, "fitness", "workout", "mostly"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_today_view_shows_statuses_and_category_points() {
        let mut tracker = memory_tracker("2024-03-04");
        mark(&mut tracker, "mindset", "meditation", "half").unwrap();

        let view = today(&tracker);
        let mindset = &view.categories[0];
        assert_eq!(mindset.id, "mindset");
        assert_eq!(mindset.points, 5.0);
        assert_eq!(mindset.tasks[0].status, Some(TaskStatus::Half));
        assert_eq!(mindset.tasks[1].status, None);
        assert!(view.to_human().contains("[~] Meditation (10 min)"));
    }

    #[test]
    fn test_habit_outside_hardcore_has_no_penalty() {
        let mut tracker = memory_tracker("2024-03-04");
        mark(&mut tracker, "fitness", "workout", "full").unwrap();
        let result = toggle_habit(&mut tracker, "skip-workout").unwrap();
        assert_eq!(result.points, 15.0);
        assert!(result.change.contains("no penalty"));

        let result = hardcore(&mut tracker, true);
        assert!(result.hardcore_mode);
        assert_eq!(result.day.as_ref().unwrap().points, 5.0);
        assert!(hardcore_show(&tracker).hardcore_mode);
    }

    #[test]
    fn test_claim_requires_pending_reward() {
        let mut tracker = memory_tracker("2024-03-04");
        assert!(matches!(
            claim(&mut tracker, "cheat-meal"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            claim(&mut tracker, "yacht"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_level_reports_xp_to_next() {
        let mut tracker = memory_tracker("2024-03-04");
        mark(&mut tracker, "productivity", "study", "full").unwrap();
        let result = level(&tracker);
        assert_eq!(result.xp_to_next, Some(485.0));
        assert!(result.to_human().contains("Novice"));
    }
}

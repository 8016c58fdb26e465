//! Progression engine.
//!
//! [`Tracker`] owns the record store and applies the scoring rules to it.
//! Each update reads its own record, folds in today's total, recomputes the
//! aggregate and writes the record back. Updates are independent of each
//! other; there is no transaction spanning records.

use crate::clock::{Clock, SystemClock};
use crate::models::{
    Catalog, DailyProgress, DayPoints, LevelData, REWARD_AVAILABLE, RECORD_VERSION,
    RewardClaim, RewardData, StreakData, TaskStatus,
};
use crate::scoring::{self, StreakTitle};
use crate::storage::{HARDCORE_MODE_KEY, RecordStore, Store};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;

/// Everything that changed when a day was recorded.
#[derive(Debug, Clone, Serialize)]
pub struct DayOutcome {
    pub progress: DailyProgress,
    pub streak: StreakData,
    pub level: LevelData,
    pub reward: RewardData,
    /// The daily goal was reached by this change
    pub newly_completed: bool,
    /// The reward marker went from armed to pending with this change
    pub reward_unlocked: bool,
}

/// Read-only view of all records.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub today: NaiveDate,
    pub progress: DailyProgress,
    pub streak: StreakData,
    pub streak_title: StreakTitle,
    pub level: LevelData,
    pub reward: RewardData,
}

/// The progression engine over a record store.
pub struct Tracker<B: RecordStore> {
    store: Store<B>,
    catalog: Catalog,
    clock: Box<dyn Clock>,
}

impl<B: RecordStore> Tracker<B> {
    /// Create a tracker using the system clock.
    pub fn new(backend: B, catalog: Catalog) -> Self {
        Self {
            store: Store::new(backend),
            catalog,
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the clock (tests, `--today`).
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ==================== Daily Progress ====================

    /// Today's progress.
    ///
    /// A stored record from another day is discarded; the fresh record keeps
    /// only its hardcore-mode flag.
    pub fn daily_progress(&self) -> DailyProgress {
        let today = self.today();
        match self.store.load::<DailyProgress>() {
            Some(progress) if progress.date == today => progress,
            Some(stale) => DailyProgress::fresh(today, stale.hardcore_mode),
            None => DailyProgress::fresh(today, false),
        }
    }

    /// Overwrite the stored daily record.
    pub fn save_daily_progress(&mut self, progress: &DailyProgress) {
        let mut progress = progress.clone();
        progress.version = RECORD_VERSION;
        self.store.save(&progress);
    }

    /// Today's record, with the standalone hardcore flag folded in.
    fn working_day(&self) -> DailyProgress {
        let mut progress = self.daily_progress();
        progress.hardcore_mode = progress.hardcore_mode || self.hardcore_mode();
        progress
    }

    /// Recompute, persist, and propagate a day's progress.
    ///
    /// Runs the full update chain: total → daily record → streak → level →
    /// reward.
    pub fn record_day(&mut self, mut progress: DailyProgress) -> DayOutcome {
        let was_completed = progress.completed;
        let was_pending = self.reward_data().is_pending();

        progress.points = scoring::daily_total(
            &self.catalog,
            &progress.categories,
            progress.hardcore_mode,
            &progress.negative_habits,
        );
        progress.negative_points =
            scoring::negative_points(&self.catalog, progress.hardcore_mode, &progress.negative_habits);
        progress.completed = progress.points >= scoring::DAILY_GOAL_POINTS;
        self.save_daily_progress(&progress);

        let points = progress.points;
        let streak = self.update_streak(points);
        let level = self.update_level_data(points);
        let reward = self.update_reward_data(points);

        tracing::info!(
            date = %progress.date,
            points,
            streak = streak.current_streak,
            xp = level.total_xp,
            "day recorded"
        );

        DayOutcome {
            newly_completed: progress.completed && !was_completed,
            reward_unlocked: reward.is_pending() && !was_pending,
            progress,
            streak,
            level,
            reward,
        }
    }

    /// Set (or clear) one task's status for today and record the day.
    pub fn set_task_status(
        &mut self,
        category_id: &str,
        task_id: &str,
        status: Option<TaskStatus>,
    ) -> Result<DayOutcome> {
        self.catalog.resolve_task(category_id, task_id)?;
        let mut progress = self.working_day();
        progress.set_status(category_id, task_id, status);
        Ok(self.record_day(progress))
    }

    /// Flip a negative habit for today and record the day.
    pub fn toggle_negative_habit(&mut self, habit_id: &str) -> Result<DayOutcome> {
        if self.catalog.habit(habit_id).is_none() {
            return Err(Error::NotFound(format!("negative habit '{}'", habit_id)));
        }
        let mut progress = self.working_day();
        let enabled = !progress.habit_enabled(habit_id);
        progress.negative_habits.insert(habit_id.to_string(), enabled);
        Ok(self.record_day(progress))
    }

    // ==================== Hardcore Mode ====================

    pub fn hardcore_mode(&self) -> bool {
        self.store.load_flag(HARDCORE_MODE_KEY)
    }

    /// Persist the hardcore flag and rescore today under it.
    pub fn set_hardcore_mode(&mut self, enabled: bool) -> DayOutcome {
        self.store.save_flag(HARDCORE_MODE_KEY, enabled);
        let mut progress = self.daily_progress();
        progress.hardcore_mode = enabled;
        self.record_day(progress)
    }

    // ==================== Streaks ====================

    pub fn streak_data(&self) -> StreakData {
        self.store.load_or_default()
    }

    /// Fold today's points into the streak record.
    pub fn update_streak(&mut self, points: f64) -> StreakData {
        let today = self.today();
        let mut data = self.streak_data();

        upsert(&mut data.history, today, points);
        data.history.sort_by_key(|e| e.date);

        data.current_streak = scoring::current_streak(&data.history, today);
        data.longest_streak = data
            .longest_streak
            .max(scoring::longest_run(&data.history))
            .max(data.current_streak);

        let overflow = data.history.len().saturating_sub(scoring::STREAK_HISTORY_LIMIT);
        data.history.drain(..overflow);
        data.version = RECORD_VERSION;

        self.store.save(&data);
        data
    }

    /// Title for the current stored streak.
    pub fn streak_title(&self) -> StreakTitle {
        scoring::streak_title(self.streak_data().current_streak)
    }

    // ==================== Levels ====================

    pub fn level_data(&self) -> LevelData {
        self.store.load_or_default()
    }

    /// Credit today's cumulative total as XP.
    ///
    /// `points` is the day's running total, not a delta. Only the part not
    /// yet credited for today is added, so calling this after every status
    /// change never counts a day twice and XP never goes down.
    pub fn update_level_data(&mut self, points: f64) -> LevelData {
        let today = self.today();
        let mut data = self.level_data();

        let already = if data.credited_date == Some(today) {
            data.credited_points
        } else {
            0.0
        };
        let delta = (points - already).max(0.0);

        data.total_xp = scoring::round1(data.total_xp + delta);
        data.credited_date = Some(today);
        data.credited_points = already.max(points);

        let band = scoring::level_for_xp(data.total_xp);
        data.level = band.level;
        data.progress = band.progress;
        data.next_level_xp = band.next_level_xp;
        data.version = RECORD_VERSION;

        self.store.save(&data);
        data
    }

    // ==================== Rewards ====================

    pub fn reward_data(&self) -> RewardData {
        self.store.load_or_default()
    }

    /// Fold today's points into the weekly series and re-evaluate the unlock.
    pub fn update_reward_data(&mut self, points: f64) -> RewardData {
        let today = self.today();
        let mut data = self.reward_data();

        if let Some(entry) = data.weekly.iter_mut().find(|e| e.date == today) {
            entry.points = points;
        } else {
            let rolled_over = data
                .weekly
                .last()
                .is_some_and(|last| scoring::week_start(last.date) != scoring::week_start(today));
            if rolled_over {
                data.weekly.clear();
            }
            data.weekly.push(DayPoints::new(today, points));
        }

        let average = scoring::rolling_average(&data.weekly);
        if scoring::reaches_unlock_average(&data.weekly) && !data.is_pending() {
            tracing::info!(average, "weekly reward unlocked");
            data.unlocked = vec![REWARD_AVAILABLE.to_string()];
        }
        data.week_average = scoring::round1(average);
        data.version = RECORD_VERSION;

        self.store.save(&data);
        data
    }

    /// Record a claim and re-arm the unlock marker.
    ///
    /// Does not check that a reward was pending.
    pub fn claim_reward(&mut self, reward_id: &str) {
        let mut data = self.reward_data();
        data.history.push(RewardClaim {
            date: self.today(),
            reward: reward_id.to_string(),
        });
        data.unlocked.clear();
        data.version = RECORD_VERSION;
        self.store.save(&data);
    }

    // ==================== Views ====================

    pub fn snapshot(&self) -> Snapshot {
        let streak = self.streak_data();
        Snapshot {
            today: self.today(),
            progress: self.daily_progress(),
            streak_title: scoring::streak_title(streak.current_streak),
            streak,
            level: self.level_data(),
            reward: self.reward_data(),
        }
    }
}

/// Replace the entry for `date` or append a new one.
fn upsert(series: &mut Vec<DayPoints>, date: NaiveDate, points: f64) {
    match series.iter_mut().find(|e| e.date == date) {
        Some(entry) => entry.points = points,
        None => series.push(DayPoints::new(date, points)),
    }
}

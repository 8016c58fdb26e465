//! Pure scoring functions.
//!
//! Everything here is side-effect free: point totals from task statuses,
//! streak walks over a daily history, level bands, and the rolling weekly
//! average that gates rewards. The [`Tracker`](crate::Tracker) wires these
//! to persisted records.

use crate::models::{
    Catalog, Category, CategoryStatuses, DayPoints, LevelProgress, TaskStatuses,
};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// Points a day needs to count toward a streak.
pub const STREAK_QUALIFYING_POINTS: f64 = 80.0;

/// Daily entries retained in the streak history.
pub const STREAK_HISTORY_LIMIT: usize = 90;

/// Rolling average that unlocks a reward.
pub const REWARD_UNLOCK_AVERAGE: f64 = 85.0;

/// Entries averaged for the weekly reward gate.
pub const REWARD_WINDOW: usize = 7;

/// Total that marks a day complete.
pub const DAILY_GOAL_POINTS: f64 = 100.0;

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Points earned in one category.
///
/// Iteration follows the category's task list, so unknown ids in `statuses`
/// are ignored. Tasks with no recorded status use their default status.
pub fn category_points(category: &Category, statuses: &TaskStatuses) -> f64 {
    category
        .tasks
        .iter()
        .map(|task| {
            let status = statuses.get(&task.id).copied().flatten().or(task.default_status);
            status.map_or(0.0, |s| task.points * s.multiplier())
        })
        .sum()
}

/// Penalty from negative habits toggled on. Zero unless hardcore mode is on.
pub fn negative_points(
    catalog: &Catalog,
    hardcore_mode: bool,
    toggles: &BTreeMap<String, bool>,
) -> f64 {
    if !hardcore_mode {
        return 0.0;
    }
    catalog
        .negative_habits
        .iter()
        .filter(|habit| toggles.get(&habit.id).copied().unwrap_or(false))
        .map(|habit| habit.penalty)
        .sum()
}

/// Daily total: category points minus hardcore penalties, floored at zero
/// and rounded to one decimal.
pub fn daily_total(
    catalog: &Catalog,
    statuses: &CategoryStatuses,
    hardcore_mode: bool,
    toggles: &BTreeMap<String, bool>,
) -> f64 {
    let empty = TaskStatuses::new();
    let earned: f64 = catalog
        .categories
        .iter()
        .map(|category| category_points(category, statuses.get(&category.id).unwrap_or(&empty)))
        .sum();
    let total = earned - negative_points(catalog, hardcore_mode, toggles);
    round1(total.max(0.0))
}

pub fn qualifies_for_streak(points: f64) -> bool {
    points >= STREAK_QUALIFYING_POINTS
}

/// Consecutive qualifying days ending at `today`.
///
/// Walks back one calendar day at a time; stops at the first day that is
/// missing from `history` or below the qualifying threshold.
pub fn current_streak(history: &[DayPoints], today: NaiveDate) -> u32 {
    let by_date: HashMap<NaiveDate, f64> = history.iter().map(|e| (e.date, e.points)).collect();

    let mut streak = 0u32;
    loop {
        let day = today - Duration::days(i64::from(streak));
        match by_date.get(&day) {
            Some(&points) if qualifies_for_streak(points) => streak += 1,
            _ => break,
        }
    }
    streak
}

/// Longest run of qualifying entries in a date-sorted history.
///
/// A non-qualifying entry resets the run; entries are not checked for
/// calendar contiguity.
pub fn longest_run(history: &[DayPoints]) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    for entry in history {
        if qualifies_for_streak(entry.points) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

/// Title earned by a streak, plus any bonus points it grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StreakTitle {
    pub title: &'static str,
    pub bonus: u32,
}

/// Highest matching title wins; bonuses do not stack.
pub fn streak_title(streak: u32) -> StreakTitle {
    let (title, bonus) = match streak {
        30.. => ("Habitual Legend", 0),
        15.. => ("Momentum Master", 0),
        7.. => ("Disciplined Rookie", 0),
        3.. => ("Starter", 5),
        _ => ("Building Momentum", 0),
    };
    StreakTitle { title, bonus }
}

/// Level band and progress for an XP total.
pub fn level_for_xp(xp: f64) -> LevelProgress {
    LevelProgress::for_xp(xp)
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Mean of the latest (up to [`REWARD_WINDOW`]) entries; 0 when empty.
pub fn rolling_average(entries: &[DayPoints]) -> f64 {
    let recent = &entries[entries.len().saturating_sub(REWARD_WINDOW)..];
    if recent.is_empty() {
        return 0.0;
    }
    recent.iter().map(|e| e.points).sum::<f64>() / recent.len() as f64
}

/// Whether the latest (up to [`REWARD_WINDOW`]) entries average at least
/// [`REWARD_UNLOCK_AVERAGE`].
///
/// Daily totals carry one decimal, so the comparison is done in whole
/// tenths; summing the raw floats can land just below an exact threshold.
pub fn reaches_unlock_average(entries: &[DayPoints]) -> bool {
    let recent = &entries[entries.len().saturating_sub(REWARD_WINDOW)..];
    if recent.is_empty() {
        return false;
    }
    let tenths: i64 = recent.iter().map(|e| to_tenths(e.points)).sum();
    tenths >= to_tenths(REWARD_UNLOCK_AVERAGE) * recent.len() as i64
}

fn to_tenths(points: f64) -> i64 {
    (points * 10.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use crate::test_utils::date;

    fn statuses(pairs: &[(&str, Option<TaskStatus>)]) -> TaskStatuses {
        pairs.iter().map(|(id, s)| (id.to_string(), *s)).collect()
    }

    fn history(entries: &[(&str, f64)]) -> Vec<DayPoints> {
        entries.iter().map(|(d, p)| DayPoints::new(date(d), *p)).collect()
    }

    // ==================== Category Points ====================

    #[test]
    fn test_category_points_full_half_missed() {
        let catalog = Catalog::default();
        let fitness = catalog.category("fitness").unwrap();

        let all_full = statuses(&[("workout", Some(TaskStatus::Full)), ("hydration", Some(TaskStatus::Full))]);
        assert_eq!(category_points(fitness, &all_full), 20.0);

        let mixed = statuses(&[("workout", Some(TaskStatus::Half)), ("hydration", Some(TaskStatus::Missed))]);
        assert_eq!(category_points(fitness, &mixed), 7.5);

        assert_eq!(category_points(fitness, &TaskStatuses::new()), 0.0);
    }

    #[test]
    fn test_category_points_ignores_unknown_ids() {
        let catalog = Catalog::default();
        let fitness = catalog.category("fitness").unwrap();
        let extra = statuses(&[("yoga", Some(TaskStatus::Full)), ("hydration", Some(TaskStatus::Full))]);
        assert_eq!(category_points(fitness, &extra), 5.0);
    }

    #[test]
    fn test_category_points_falls_back_to_default_status() {
        let mut catalog = Catalog::default();
        catalog.categories[0].tasks[0].default_status = Some(TaskStatus::Half);
        let mindset = &catalog.categories[0];

        assert_eq!(category_points(mindset, &TaskStatuses::new()), 5.0);
        // Explicit null also falls back
        assert_eq!(category_points(mindset, &statuses(&[("meditation", None)])), 5.0);
        // A recorded status wins over the default
        assert_eq!(
            category_points(mindset, &statuses(&[("meditation", Some(TaskStatus::Missed))])),
            0.0
        );
    }

    #[test]
    fn test_category_points_monotonic_and_bounded() {
        let catalog = Catalog::default();
        let options = [None, Some(TaskStatus::Missed), Some(TaskStatus::Half), Some(TaskStatus::Full)];

        for category in &catalog.categories {
            let ids: Vec<&str> = category.tasks.iter().map(|t| t.id.as_str()).collect();
            for a in options {
                for b in options {
                    let base = statuses(&[(ids[0], a), (ids[1], b)]);
                    let points = category_points(category, &base);
                    assert!(points <= category.points);

                    // Upgrading any task to full never lowers the score
                    let upgraded = statuses(&[(ids[0], Some(TaskStatus::Full)), (ids[1], b)]);
                    assert!(category_points(category, &upgraded) >= points);
                }
            }
        }
    }

    // ==================== Daily Total ====================

    fn all(status: TaskStatus, catalog: &Catalog) -> CategoryStatuses {
        catalog
            .categories
            .iter()
            .map(|c| {
                let tasks = c.tasks.iter().map(|t| (t.id.clone(), Some(status))).collect();
                (c.id.clone(), tasks)
            })
            .collect()
    }

    #[test]
    fn test_daily_total_perfect_day() {
        let catalog = Catalog::default();
        let total = daily_total(&catalog, &all(TaskStatus::Full, &catalog), false, &BTreeMap::new());
        assert_eq!(total, 100.0);
    }

    #[test]
    fn test_daily_total_all_half() {
        let catalog = Catalog::default();
        let total = daily_total(&catalog, &all(TaskStatus::Half, &catalog), false, &BTreeMap::new());
        assert_eq!(total, 50.0);
    }

    #[test]
    fn test_daily_total_penalties_only_in_hardcore() {
        let catalog = Catalog::default();
        let statuses = all(TaskStatus::Full, &catalog);
        let toggles: BTreeMap<String, bool> =
            [("skip-workout".to_string(), true), ("negative-talk".to_string(), false)].into();

        assert_eq!(daily_total(&catalog, &statuses, false, &toggles), 100.0);
        assert_eq!(daily_total(&catalog, &statuses, true, &toggles), 90.0);
        assert_eq!(negative_points(&catalog, true, &toggles), 10.0);
        assert_eq!(negative_points(&catalog, false, &toggles), 0.0);
    }

    #[test]
    fn test_daily_total_never_negative() {
        let catalog = Catalog::default();
        let toggles: BTreeMap<String, bool> = catalog
            .negative_habits
            .iter()
            .map(|h| (h.id.clone(), true))
            .collect();

        assert_eq!(daily_total(&catalog, &CategoryStatuses::new(), true, &toggles), 0.0);

        let mut some = CategoryStatuses::new();
        some.insert(
            "fitness".to_string(),
            statuses(&[("hydration", Some(TaskStatus::Full))]),
        );
        assert_eq!(daily_total(&catalog, &some, true, &toggles), 0.0);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(84.94), 84.9);
        assert_eq!(round1(12.25), 12.3);
        assert_eq!(round1(0.1 + 0.2), 0.3);
    }

    // ==================== Streaks ====================

    #[test]
    fn test_current_streak_stops_at_gap() {
        let h = history(&[
            ("2024-03-06", 95.0),
            ("2024-03-08", 90.0),
            ("2024-03-09", 85.0),
            ("2024-03-10", 80.0),
        ]);
        assert_eq!(current_streak(&h, date("2024-03-10")), 3);
    }

    #[test]
    fn test_current_streak_stops_at_low_day() {
        let h = history(&[("2024-03-08", 100.0), ("2024-03-09", 79.9), ("2024-03-10", 80.0)]);
        assert_eq!(current_streak(&h, date("2024-03-10")), 1);
    }

    #[test]
    fn test_current_streak_zero_when_today_missing_or_low() {
        let h = history(&[("2024-03-09", 100.0)]);
        assert_eq!(current_streak(&h, date("2024-03-10")), 0);

        let h = history(&[("2024-03-09", 100.0), ("2024-03-10", 50.0)]);
        assert_eq!(current_streak(&h, date("2024-03-10")), 0);
    }

    #[test]
    fn test_current_streak_crosses_month_boundary() {
        let h = history(&[("2024-02-28", 90.0), ("2024-02-29", 90.0), ("2024-03-01", 90.0)]);
        assert_eq!(current_streak(&h, date("2024-03-01")), 3);
    }

    #[test]
    fn test_longest_run_resets_on_low_entry() {
        let h = history(&[
            ("2024-03-01", 90.0),
            ("2024-03-02", 90.0),
            ("2024-03-03", 90.0),
            ("2024-03-04", 10.0),
            ("2024-03-05", 90.0),
        ]);
        assert_eq!(longest_run(&h), 3);
        assert_eq!(longest_run(&[]), 0);
    }

    #[test]
    fn test_streak_titles() {
        assert_eq!(streak_title(0).title, "Building Momentum");
        assert_eq!(streak_title(2).title, "Building Momentum");
        assert_eq!(streak_title(3), StreakTitle { title: "Starter", bonus: 5 });
        assert_eq!(streak_title(6).bonus, 5);
        assert_eq!(streak_title(7), StreakTitle { title: "Disciplined Rookie", bonus: 0 });
        assert_eq!(streak_title(15).title, "Momentum Master");
        assert_eq!(streak_title(30).title, "Habitual Legend");
        assert_eq!(streak_title(365).bonus, 0);
    }

    // ==================== Weeks & Averages ====================

    #[test]
    fn test_week_start_is_monday() {
        // 2024-03-10 is a Sunday
        assert_eq!(week_start(date("2024-03-10")), date("2024-03-04"));
        assert_eq!(week_start(date("2024-03-11")), date("2024-03-11"));
        assert_eq!(week_start(date("2024-03-13")), date("2024-03-11"));
    }

    #[test]
    fn test_rolling_average_uses_latest_seven() {
        let mut h = history(&[("2024-03-01", 0.0)]);
        for day in 2..=8 {
            h.push(DayPoints::new(date(&format!("2024-03-0{}", day)), 85.0));
        }
        assert_eq!(rolling_average(&h), 85.0);
        assert_eq!(rolling_average(&h[..2]), 42.5);
        assert_eq!(rolling_average(&[]), 0.0);
    }

    #[test]
    fn test_unlock_average_is_exact_on_uneven_week() {
        // Sums to 595.0; the float mean is 84.99999999999999
        let week = history(&[
            ("2024-03-11", 70.0),
            ("2024-03-12", 79.7),
            ("2024-03-13", 93.4),
            ("2024-03-14", 84.8),
            ("2024-03-15", 90.9),
            ("2024-03-16", 83.4),
            ("2024-03-17", 92.8),
        ]);
        assert!(reaches_unlock_average(&week));

        let mut short = week.clone();
        short[6].points = 92.7;
        assert!(!reaches_unlock_average(&short));
        assert!(!reaches_unlock_average(&[]));
    }
}

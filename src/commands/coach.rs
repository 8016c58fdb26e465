//! Coach commands: gather inputs from the tracker and ask the coach.

use super::progress::today;
use super::{CommandResult, pts};
use crate::coach::{
    Advice, ChatReply, ChatTurn, Coach, DailySummary, InsightMetrics, Insights, MissedHabit,
    MoodAnalysis, Plan, Recalibration, RewardRecommendation, TextCompletion,
};
use crate::models::{DayPoints, TaskStatus};
use crate::scoring::{self, REWARD_WINDOW};
use crate::storage::RecordStore;
use crate::tracker::Tracker;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Difference between weekly averages that counts as a trend.
const TREND_THRESHOLD: f64 = 5.0;

fn with_fallback_note(text: String, fallback: bool) -> String {
    if fallback {
        format!("{}\n(offline answer; set LU_API_KEY for personalised coaching)", text)
    } else {
        text
    }
}

impl CommandResult for Advice<ChatReply> {
    fn to_human(&self) -> String {
        with_fallback_note(self.value.response.clone(), self.fallback)
    }
}

impl CommandResult for Advice<MoodAnalysis> {
    fn to_human(&self) -> String {
        let text = format!(
            "{} {}\n{}\nTip: {}",
            self.value.emoji,
            self.value.mood.as_str(),
            self.value.response,
            self.value.suggestion
        );
        with_fallback_note(text, self.fallback)
    }
}

impl CommandResult for Advice<Plan> {
    fn to_human(&self) -> String {
        let text = self
            .value
            .suggestions
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, s))
            .collect::<Vec<_>>()
            .join("\n");
        with_fallback_note(text, self.fallback)
    }
}

impl CommandResult for Advice<Recalibration> {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for (category, average) in &self.value.averages {
            lines.push(format!("  {}: {} avg", category, pts(*average)));
        }
        if !self.value.low_categories.is_empty() {
            lines.push(format!("Needs a boost: {}", self.value.low_categories.join(", ")));
        }
        for (category, points) in &self.value.adjustments {
            lines.push(format!("Suggest {} -> {} pts", category, pts(*points)));
        }
        lines.push(self.value.message.clone());
        with_fallback_note(lines.join("\n"), self.fallback)
    }
}

impl CommandResult for Advice<DailySummary> {
    fn to_human(&self) -> String {
        with_fallback_note(self.value.summary.clone(), self.fallback)
    }
}

impl CommandResult for Advice<Insights> {
    fn to_human(&self) -> String {
        let text = format!(
            "{}\nHighlight: {}\nNext: {}",
            self.value.summary, self.value.highlight, self.value.recommendation
        );
        with_fallback_note(text, self.fallback)
    }
}

impl CommandResult for Advice<RewardRecommendation> {
    fn to_human(&self) -> String {
        with_fallback_note(self.value.recommendation.clone(), self.fallback)
    }
}

/// Chat, optionally continuing a conversation saved as a JSON array of
/// `{"role": "user"|"coach", "content": "..."}` turns.
pub fn coach_chat<C: TextCompletion>(
    coach: &Coach<C>,
    message: &str,
    history_file: Option<&Path>,
) -> Result<Advice<ChatReply>> {
    let history: Vec<ChatTurn> = match history_file {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => Vec::new(),
    };
    coach.chat(message, &history)
}

pub fn coach_mood<C: TextCompletion>(coach: &Coach<C>, entry: &str) -> Result<Advice<MoodAnalysis>> {
    coach.analyze_mood(entry)
}

/// Parse `name` or `name:days` (days defaults to 1).
pub fn parse_missed_habit(s: &str) -> Result<MissedHabit> {
    let (name, days) = match s.rsplit_once(':') {
        Some((name, days)) => {
            let days = days.trim().parse::<u32>().map_err(|_| {
                Error::InvalidInput(format!("Invalid day count in '{}' (expected name:days)", s))
            })?;
            (name, days)
        }
        None => (s, 1),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput(format!("Missing habit name in '{}'", s)));
    }
    Ok(MissedHabit {
        name: name.to_string(),
        days,
    })
}

/// Plan for the given habits, or for today's missed and unset tasks.
pub fn coach_plan<C: TextCompletion, B: RecordStore>(
    coach: &Coach<C>,
    tracker: &Tracker<B>,
    habits: &[String],
) -> Result<Advice<Plan>> {
    let missed = if habits.is_empty() {
        today(tracker)
            .categories
            .into_iter()
            .flat_map(|category| category.tasks)
            .filter(|task| matches!(task.status, None | Some(TaskStatus::Missed)))
            .map(|task| MissedHabit {
                name: task.name,
                days: 1,
            })
            .collect()
    } else {
        habits
            .iter()
            .map(|h| parse_missed_habit(h))
            .collect::<Result<Vec<_>>>()?
    };
    coach.plan(&missed)
}

/// Suggest weight changes from today's category points.
pub fn coach_scale<C: TextCompletion, B: RecordStore>(
    coach: &Coach<C>,
    tracker: &Tracker<B>,
) -> Result<Advice<Recalibration>> {
    let day = today(tracker);
    let scores: BTreeMap<String, f64> = day
        .categories
        .iter()
        .map(|c| (c.name.clone(), c.points))
        .collect();
    let weights: BTreeMap<String, f64> = day
        .categories
        .iter()
        .map(|c| (c.name.clone(), c.max_points))
        .collect();
    coach.recalibrate(&[scores], &weights)
}

pub fn coach_summary<C: TextCompletion, B: RecordStore>(
    coach: &Coach<C>,
    tracker: &Tracker<B>,
) -> Result<Advice<DailySummary>> {
    let day = today(tracker);
    let scores: BTreeMap<String, f64> = day
        .categories
        .iter()
        .map(|c| (c.name.clone(), c.points))
        .collect();
    coach.daily_summary(day.points, &scores)
}

/// Aggregate metrics over the stored daily history.
pub(crate) fn insight_metrics(history: &[DayPoints]) -> InsightMetrics {
    let average = if history.is_empty() {
        0.0
    } else {
        scoring::round1(history.iter().map(|d| d.points).sum::<f64>() / history.len() as f64)
    };
    InsightMetrics {
        total_days: history.len(),
        average_score: average,
        category_trends: BTreeMap::new(),
        recent_trend: recent_trend(history).to_string(),
    }
}

/// Compare the last week's average with the week before it.
fn recent_trend(history: &[DayPoints]) -> &'static str {
    let split = history.len().saturating_sub(REWARD_WINDOW);
    let (earlier, recent) = history.split_at(split);
    let earlier = &earlier[earlier.len().saturating_sub(REWARD_WINDOW)..];
    if earlier.is_empty() || recent.is_empty() {
        return "stable";
    }
    let diff = scoring::rolling_average(recent) - scoring::rolling_average(earlier);
    if diff > TREND_THRESHOLD {
        "improving"
    } else if diff < -TREND_THRESHOLD {
        "declining"
    } else {
        "stable"
    }
}

pub fn coach_insights<C: TextCompletion, B: RecordStore>(
    coach: &Coach<C>,
    tracker: &Tracker<B>,
) -> Result<Advice<Insights>> {
    coach.insights(&insight_metrics(&tracker.streak_data().history))
}

/// Reward idea from the week average and today's completed tasks.
pub fn coach_reward<C: TextCompletion, B: RecordStore>(
    coach: &Coach<C>,
    tracker: &Tracker<B>,
) -> Result<Advice<RewardRecommendation>> {
    let completed: Vec<String> = today(tracker)
        .categories
        .into_iter()
        .flat_map(|category| category.tasks)
        .filter(|task| task.status == Some(TaskStatus::Full))
        .map(|task| task.name)
        .collect();
    coach.recommend_reward(tracker.reward_data().week_average, &completed)
}

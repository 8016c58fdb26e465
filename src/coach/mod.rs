//! Habit coach backed by a generative text model.
//!
//! Every feature follows the same shape: build a prompt, send it through a
//! [`TextCompletion`], parse what comes back, and fall back to a fixed answer
//! when the call fails or the reply cannot be parsed. Replies are never
//! trusted to be JSON even when the prompt asks for it.

pub mod http;

pub use http::HttpCompletion;

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prompt in, text out.
pub trait TextCompletion {
    fn complete(&self, prompt: &str) -> Result<String>;
}

impl<T: TextCompletion + ?Sized> TextCompletion for Box<T> {
    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }
}

/// Number of prior chat turns included in a chat prompt.
pub const CHAT_HISTORY_LIMIT: usize = 10;
/// Category averages below this are flagged by [`Coach::recalibrate`].
pub const LOW_CATEGORY_AVERAGE: f64 = 15.0;
/// Habits mentioned in a reward prompt.
pub const REWARD_HABIT_LIMIT: usize = 5;

const COACH_PERSONA: &str = "You are a motivational life coach helping users build better habits. \
Be encouraging, practical, and supportive. Keep responses concise (2-3 sentences max). \
Focus on actionable advice and positive reinforcement.";

const CHAT_FALLBACK: &str =
    "I couldn't reach my thoughts just now. Keep going, one small step at a time!";
const SUMMARY_FALLBACK: &str = "Great effort today! Keep going!";
const REWARD_FALLBACK: &str =
    "You've earned a relaxing evening. Maybe watch that movie you've been saving!";
const PLAN_FALLBACK: [&str; 3] = [
    "Try setting a specific time reminder for your missed habits",
    "Try breaking down the habit into smaller 5-minute actions",
    "Try linking the habit to an existing daily routine",
];

/// A coach answer, marked when it came from the fixed fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advice<T> {
    #[serde(flatten)]
    pub value: T,
    pub fallback: bool,
}

impl<T> Advice<T> {
    fn model(value: T) -> Self {
        Self {
            value,
            fallback: false,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            fallback: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Coach,
}

/// One prior message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub response: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Mood {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Some(Mood::Positive),
            "neutral" => Some(Mood::Neutral),
            "negative" => Some(Mood::Negative),
            _ => None,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Positive => "😊",
            Mood::Neutral => "😐",
            Mood::Negative => "😔",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Positive => "positive",
            Mood::Neutral => "neutral",
            Mood::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoodAnalysis {
    pub mood: Mood,
    pub emoji: String,
    pub response: String,
    pub suggestion: String,
}

/// Mood reply as the model writes it; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMood {
    mood: String,
    emoji: String,
    response: String,
    suggestion: String,
}

/// A habit the user has been missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissedHabit {
    pub name: String,
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recalibration {
    /// Mean points per category over the supplied days
    pub averages: BTreeMap<String, f64>,
    /// Categories whose average is below [`LOW_CATEGORY_AVERAGE`]
    pub low_categories: Vec<String>,
    /// Suggested new point values (empty when the model gave none)
    pub adjustments: BTreeMap<String, f64>,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRecalibration {
    adjustments: BTreeMap<String, f64>,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub summary: String,
}

/// Aggregate numbers the insights prompt is built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightMetrics {
    pub total_days: usize,
    pub average_score: f64,
    /// Percent change per category
    pub category_trends: BTreeMap<String, f64>,
    pub recent_trend: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    pub summary: String,
    pub highlight: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardRecommendation {
    pub recommendation: String,
}

/// Parse the span from the first `{` to the last `}` of `text`.
///
/// Models like to wrap JSON in prose or code fences; this recovers the object
/// when it is there and returns `None` otherwise.
pub fn extract_json_object<T: DeserializeOwned>(text: &str) -> Option<T> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Keep lines that start with "Try" or a list number, cleaned of their
/// markers, at most three.
fn parse_suggestions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with("Try") || is_numbered(line))
        .map(|line| strip_list_marker(line).to_string())
        .filter(|line| !line.is_empty())
        .take(3)
        .collect()
}

fn is_numbered(line: &str) -> bool {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && line[digits..].starts_with('.')
}

fn strip_list_marker(line: &str) -> &str {
    let mut rest = line;
    if is_numbered(rest) {
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        rest = rest[digits + 1..].trim_start();
    }
    if let Some(stripped) = rest.strip_prefix('-') {
        rest = stripped.trim_start();
    }
    rest
}

fn require_text(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", what)));
    }
    Ok(())
}

fn join_points(scores: &BTreeMap<String, f64>) -> String {
    scores
        .iter()
        .map(|(name, points)| format!("{}: {} points", name, points))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The coach features over some completion backend.
pub struct Coach<C: TextCompletion> {
    completion: C,
}

impl<C: TextCompletion> Coach<C> {
    pub fn new(completion: C) -> Self {
        Self { completion }
    }

    /// Send a prompt; failures and blank replies are logged and become `None`.
    fn ask(&self, feature: &'static str, prompt: &str) -> Option<String> {
        match self.completion.complete(prompt) {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                tracing::warn!(feature, "empty completion; using fallback");
                None
            }
            Err(e) => {
                tracing::warn!(feature, error = %e, "completion failed; using fallback");
                None
            }
        }
    }

    /// Reply to a chat message in the context of the recent conversation.
    pub fn chat(&self, message: &str, history: &[ChatTurn]) -> Result<Advice<ChatReply>> {
        require_text(message, "Message")?;

        let recent = &history[history.len().saturating_sub(CHAT_HISTORY_LIMIT)..];
        let transcript = recent
            .iter()
            .map(|turn| {
                let speaker = match turn.role {
                    Role::User => "User",
                    Role::Coach => "Coach",
                };
                format!("{}: {}", speaker, turn.content)
            })
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "{}\n\nConversation:\n{}\n\nUser: {}\nCoach:",
            COACH_PERSONA, transcript, message
        );

        Ok(match self.ask("chat", &prompt) {
            Some(text) => Advice::model(ChatReply {
                response: text.trim().to_string(),
            }),
            None => Advice::fallback(ChatReply {
                response: CHAT_FALLBACK.to_string(),
            }),
        })
    }

    /// Classify the tone of a journal entry and offer support.
    pub fn analyze_mood(&self, entry: &str) -> Result<Advice<MoodAnalysis>> {
        require_text(entry, "Journal entry")?;

        let prompt = format!(
            "Analyze the emotional tone of this journal entry and provide supportive feedback.\n\n\
             Journal Entry: \"{}\"\n\n\
             Respond with JSON containing:\n\
             - \"mood\": one of \"positive\", \"neutral\", \"negative\"\n\
             - \"emoji\": corresponding emoji (😊, 😐, or 😔)\n\
             - \"response\": a supportive 2-3 sentence message with practical advice\n\
             - \"suggestion\": one actionable tip to improve mood/wellbeing\n\n\
             Return valid JSON only.",
            entry
        );

        let raw = self
            .ask("mood", &prompt)
            .and_then(|text| extract_json_object::<RawMood>(&text));

        Ok(match raw {
            Some(raw) => {
                let mood = Mood::parse(&raw.mood).unwrap_or_default();
                let emoji = if raw.emoji.trim().is_empty() {
                    mood.emoji().to_string()
                } else {
                    raw.emoji
                };
                Advice::model(MoodAnalysis {
                    mood,
                    emoji,
                    response: raw.response,
                    suggestion: raw.suggestion,
                })
            }
            None => Advice::fallback(MoodAnalysis {
                mood: Mood::Neutral,
                emoji: Mood::Neutral.emoji().to_string(),
                response: "Thank you for sharing. Keep reflecting and tracking your journey!"
                    .to_string(),
                suggestion: "Take a moment to practice gratitude or deep breathing.".to_string(),
            }),
        })
    }

    /// Three micro-habit suggestions for habits the user keeps missing.
    pub fn plan(&self, missed: &[MissedHabit]) -> Result<Advice<Plan>> {
        if missed.is_empty() {
            return Err(Error::InvalidInput(
                "At least one missed habit is required".to_string(),
            ));
        }

        let habits = missed
            .iter()
            .map(|h| format!("{} missed {} days", h.name, h.days))
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = format!(
            "A user is struggling with these habits: {}\n\n\
             Generate exactly 3 short, actionable micro-habit suggestions (1 sentence each) to help them improve.\n\
             Each suggestion should be:\n\
             - Specific and achievable\n\
             - Start with \"Try...\"\n\
             - Focus on small, sustainable changes\n\
             - Directly address the missed habits\n\n\
             Return ONLY the 3 suggestions, one per line, starting with \"Try...\"",
            habits
        );

        let suggestions = self
            .ask("plan", &prompt)
            .map(|text| parse_suggestions(&text))
            .unwrap_or_default();

        Ok(if suggestions.is_empty() {
            Advice::fallback(Plan {
                suggestions: PLAN_FALLBACK.iter().map(|s| s.to_string()).collect(),
            })
        } else {
            Advice::model(Plan { suggestions })
        })
    }

    /// Suggest category weight changes from a run of per-day category points.
    pub fn recalibrate(
        &self,
        days: &[BTreeMap<String, f64>],
        weights: &BTreeMap<String, f64>,
    ) -> Result<Advice<Recalibration>> {
        if days.is_empty() {
            return Err(Error::InvalidInput("Weekly data is required".to_string()));
        }

        let mut averages: BTreeMap<String, f64> = BTreeMap::new();
        for day in days {
            for (category, points) in day {
                *averages.entry(category.clone()).or_insert(0.0) += points;
            }
        }
        for total in averages.values_mut() {
            *total /= days.len() as f64;
        }
        let low_categories: Vec<String> = averages
            .iter()
            .filter(|(_, avg)| **avg < LOW_CATEGORY_AVERAGE)
            .map(|(name, _)| name.clone())
            .collect();

        let low_text = if low_categories.is_empty() {
            "None".to_string()
        } else {
            low_categories.join(", ")
        };
        let prompt = format!(
            "Analyze weekly habit tracker performance and suggest weight adjustments.\n\n\
             Current Category Weights: {}\n\
             Categories with Low Scores (<15 avg): {}\n\n\
             Generate a JSON response with:\n\
             - \"adjustments\": object mapping category names to new point values (suggest small increases of 2-5 points for low categories)\n\
             - \"message\": a short motivational message explaining the changes (1 sentence)\n\n\
             Keep total weight around 100. Only adjust categories that need a boost. Return valid JSON only.",
            join_points(weights),
            low_text
        );

        let raw = self
            .ask("scale", &prompt)
            .and_then(|text| extract_json_object::<RawRecalibration>(&text));

        Ok(match raw {
            Some(raw) => Advice::model(Recalibration {
                averages,
                low_categories,
                adjustments: raw.adjustments,
                message: raw.message,
            }),
            None => Advice::fallback(Recalibration {
                averages,
                low_categories,
                adjustments: BTreeMap::new(),
                message: "Weekly recalibration complete. Focus on consistency!".to_string(),
            }),
        })
    }

    /// A short motivational paragraph about today's score.
    pub fn daily_summary(
        &self,
        total_points: f64,
        category_scores: &BTreeMap<String, f64>,
    ) -> Result<Advice<DailySummary>> {
        let breakdown = if category_scores.is_empty() {
            "No category data".to_string()
        } else {
            join_points(category_scores)
        };
        let prompt = format!(
            "Generate a motivational daily summary for a habit tracker user.\n\n\
             Today's Score: {}/100 points\n\
             Category Breakdown: {}\n\n\
             Write a short, encouraging paragraph (2-3 sentences) that:\n\
             - Celebrates achievements if score is 70+\n\
             - Provides gentle motivation if score is below 70\n\
             - Suggests one specific improvement\n\
             - Stays positive and supportive\n\n\
             Format as a natural, friendly message.",
            total_points, breakdown
        );

        Ok(match self.ask("summary", &prompt) {
            Some(text) => Advice::model(DailySummary {
                summary: text.trim().to_string(),
            }),
            None => Advice::fallback(DailySummary {
                summary: SUMMARY_FALLBACK.to_string(),
            }),
        })
    }

    /// Summary, highlight and recommendation from aggregate metrics.
    pub fn insights(&self, metrics: &InsightMetrics) -> Result<Advice<Insights>> {
        let trends = metrics
            .category_trends
            .iter()
            .map(|(name, change)| {
                let sign = if *change > 0.0 { "+" } else { "" };
                format!("{}: {}{}%", name, sign, change)
            })
            .collect::<Vec<_>>()
            .join(", ");
        let trends = if trends.is_empty() {
            "No trends available".to_string()
        } else {
            trends
        };
        let recent = if metrics.recent_trend.is_empty() {
            "stable"
        } else {
            metrics.recent_trend.as_str()
        };
        let prompt = format!(
            "Generate an AI insights summary for a habit tracker user based on their {}-day data.\n\n\
             Key Metrics:\n\
             - Average Daily Score: {}/100\n\
             - Category Trends: {}\n\
             - Recent Performance: {}\n\n\
             Create a JSON response with:\n\
             - \"summary\": A 2-3 sentence motivational summary highlighting key wins and areas for growth\n\
             - \"highlight\": One standout achievement (1 sentence)\n\
             - \"recommendation\": One actionable tip for continued improvement (1 sentence)\n\n\
             Return valid JSON only.",
            metrics.total_days, metrics.average_score, trends, recent
        );

        let parsed = self
            .ask("insights", &prompt)
            .and_then(|text| extract_json_object::<Insights>(&text));

        Ok(match parsed {
            Some(insights) => Advice::model(insights),
            None => Advice::fallback(Insights {
                summary: "Keep tracking your habits consistently. Small daily actions lead to big changes!"
                    .to_string(),
                highlight: format!(
                    "You've been maintaining an average score of {} points.",
                    metrics.average_score
                ),
                recommendation: "Focus on one category where you can improve by just 5 points daily."
                    .to_string(),
            }),
        })
    }

    /// A personalised reward idea for a strong week.
    pub fn recommend_reward(
        &self,
        week_average: f64,
        habits: &[String],
    ) -> Result<Advice<RewardRecommendation>> {
        let habits_text = if habits.is_empty() {
            "Various habits consistently".to_string()
        } else {
            habits
                .iter()
                .take(REWARD_HABIT_LIMIT)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        };
        let prompt = format!(
            "A user achieved a weekly average of {}/100 points and has been consistently completing: {}.\n\n\
             Generate a personalized reward recommendation that:\n\
             - Celebrates their achievement\n\
             - Suggests a specific, enjoyable reward (not food unless specifically requested)\n\
             - Is appropriate for their high performance\n\
             - Keeps it to 1-2 sentences\n\n\
             Make it feel special and personalized.",
            week_average, habits_text
        );

        Ok(match self.ask("reward", &prompt) {
            Some(text) => Advice::model(RewardRecommendation {
                recommendation: text.trim().to_string(),
            }),
            None => Advice::fallback(RewardRecommendation {
                recommendation: REWARD_FALLBACK.to_string(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Completion that replays a fixed reply and records prompts.
    struct Scripted {
        reply: Result<String>,
        prompts: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                prompts: RefCell::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(Error::Http("connection refused".to_string())),
                prompts: RefCell::new(Vec::new()),
            }
        }

        fn last_prompt(&self) -> String {
            self.prompts.borrow().last().cloned().unwrap_or_default()
        }

        fn calls(&self) -> usize {
            self.prompts.borrow().len()
        }
    }

    impl TextCompletion for Scripted {
        fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(Error::Http(e.to_string())),
            }
        }
    }

    fn scores(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    // ==================== JSON Extraction Tests ====================

    #[test]
    fn test_extract_json_object_from_prose() {
        let text = "Sure! Here you go:\n```json\n{\"summary\": \"a\", \"highlight\": \"b\", \"recommendation\": \"c\"}\n```";
        let parsed: Insights = extract_json_object(text).unwrap();
        assert_eq!(parsed.highlight, "b");
    }

    #[test]
    fn test_extract_json_object_missing_or_broken() {
        assert!(extract_json_object::<serde_json::Value>("no braces here").is_none());
        assert!(extract_json_object::<serde_json::Value>("} backwards {").is_none());
        assert!(extract_json_object::<serde_json::Value>("{\"a\": }").is_none());
    }

    #[test]
    fn test_extract_json_object_spans_first_to_last_brace() {
        let text = "{\"a\": 1} and then {\"b\": 2}";
        // First `{` to last `}` is not a single object
        assert!(extract_json_object::<serde_json::Value>(text).is_none());
    }

    // ==================== Chat Tests ====================

    #[test]
    fn test_chat_builds_transcript_from_recent_history() {
        let completion = Scripted::ok("  Keep it up!  ");
        let coach = Coach::new(completion);
        let history: Vec<ChatTurn> = (0..12)
            .map(|i| ChatTurn {
                role: if i % 2 == 0 { Role::User } else { Role::Coach },
                content: format!("turn {}", i),
            })
            .collect();

        let reply = coach.chat("How do I start?", &history).unwrap();
        assert!(!reply.fallback);
        assert_eq!(reply.value.response, "Keep it up!");

        let prompt = coach.completion.last_prompt();
        assert!(!prompt.contains("turn 1\n"));
        assert!(prompt.contains("User: turn 2"));
        assert!(prompt.contains("Coach: turn 11"));
        assert!(prompt.ends_with("User: How do I start?\nCoach:"));
    }

    #[test]
    fn test_chat_rejects_empty_message_without_calling() {
        let coach = Coach::new(Scripted::ok("hi"));
        assert!(matches!(coach.chat("   ", &[]), Err(Error::InvalidInput(_))));
        assert_eq!(coach.completion.calls(), 0);
    }

    #[test]
    fn test_chat_falls_back_on_error() {
        let coach = Coach::new(Scripted::failing());
        let reply = coach.chat("hello", &[]).unwrap();
        assert!(reply.fallback);
        assert_eq!(reply.value.response, CHAT_FALLBACK);
        assert_eq!(coach.completion.calls(), 1);
    }

    // ==================== Mood Tests ====================

    #[test]
    fn test_mood_parses_and_normalizes() {
        let coach = Coach::new(Scripted::ok(
            r#"{"mood": "ecstatic", "emoji": "", "response": "Nice.", "suggestion": "Walk."}"#,
        ));
        let analysis = coach.analyze_mood("Today was fine").unwrap();
        assert!(!analysis.fallback);
        assert_eq!(analysis.value.mood, Mood::Neutral);
        assert_eq!(analysis.value.emoji, "😐");
        assert_eq!(analysis.value.response, "Nice.");
    }

    #[test]
    fn test_mood_keeps_valid_reply() {
        let coach = Coach::new(Scripted::ok(
            "Analysis: {\"mood\": \"Negative\", \"emoji\": \"😢\", \"response\": \"r\", \"suggestion\": \"s\"}",
        ));
        let analysis = coach.analyze_mood("rough day").unwrap();
        assert_eq!(analysis.value.mood, Mood::Negative);
        assert_eq!(analysis.value.emoji, "😢");
    }

    #[test]
    fn test_mood_fallback_on_non_json() {
        let coach = Coach::new(Scripted::ok("I think they are happy."));
        let analysis = coach.analyze_mood("great run this morning").unwrap();
        assert!(analysis.fallback);
        assert_eq!(analysis.value.mood, Mood::Neutral);
        assert!(analysis.value.suggestion.contains("gratitude"));
    }

    // ==================== Plan Tests ====================

    #[test]
    fn test_plan_parses_try_and_numbered_lines() {
        let coach = Coach::new(Scripted::ok(
            "Here are ideas:\n1. Try a 5 minute walk\n- not this\nTry water first thing\n2. - Try reading one page\n3. Try extra",
        ));
        let missed = vec![MissedHabit {
            name: "Workout".to_string(),
            days: 3,
        }];
        let plan = coach.plan(&missed).unwrap();
        assert!(!plan.fallback);
        assert_eq!(
            plan.value.suggestions,
            vec![
                "Try a 5 minute walk",
                "Try water first thing",
                "Try reading one page"
            ]
        );
        assert!(coach.completion.last_prompt().contains("Workout missed 3 days"));
    }

    #[test]
    fn test_plan_fallback_when_nothing_parses() {
        let coach = Coach::new(Scripted::ok("Just do better."));
        let missed = vec![MissedHabit {
            name: "Sleep".to_string(),
            days: 1,
        }];
        let plan = coach.plan(&missed).unwrap();
        assert!(plan.fallback);
        assert_eq!(plan.value.suggestions.len(), 3);
        assert!(plan.value.suggestions.iter().all(|s| s.starts_with("Try")));
    }

    #[test]
    fn test_plan_requires_habits() {
        let coach = Coach::new(Scripted::ok("Try x"));
        assert!(matches!(coach.plan(&[]), Err(Error::InvalidInput(_))));
    }

    // ==================== Recalibration Tests ====================

    #[test]
    fn test_recalibrate_flags_low_categories() {
        let coach = Coach::new(Scripted::ok(
            r#"{"adjustments": {"Fitness": 23}, "message": "Boosted fitness."}"#,
        ));
        let days = vec![
            scores(&[("Fitness", 10.0), ("Nutrition", 20.0)]),
            scores(&[("Fitness", 12.0), ("Nutrition", 20.0)]),
        ];
        let weights = scores(&[("Fitness", 20.0), ("Nutrition", 20.0)]);

        let result = coach.recalibrate(&days, &weights).unwrap();
        assert!(!result.fallback);
        assert_eq!(result.value.averages["Fitness"], 11.0);
        assert_eq!(result.value.low_categories, vec!["Fitness"]);
        assert_eq!(result.value.adjustments["Fitness"], 23.0);
        assert!(coach
            .completion
            .last_prompt()
            .contains("Categories with Low Scores (<15 avg): Fitness"));
    }

    #[test]
    fn test_recalibrate_fallback_keeps_averages() {
        let coach = Coach::new(Scripted::failing());
        let days = vec![scores(&[("Mind", 20.0)])];
        let result = coach.recalibrate(&days, &BTreeMap::new()).unwrap();
        assert!(result.fallback);
        assert!(result.value.adjustments.is_empty());
        assert!(result.value.low_categories.is_empty());
        assert_eq!(result.value.averages["Mind"], 20.0);
    }

    #[test]
    fn test_recalibrate_requires_days() {
        let coach = Coach::new(Scripted::ok("{}"));
        assert!(matches!(
            coach.recalibrate(&[], &BTreeMap::new()),
            Err(Error::InvalidInput(_))
        ));
    }

    // ==================== Summary / Insights / Reward Tests ====================

    #[test]
    fn test_daily_summary() {
        let coach = Coach::new(Scripted::ok("Strong day!"));
        let summary = coach
            .daily_summary(85.0, &scores(&[("Fitness", 20.0)]))
            .unwrap();
        assert_eq!(summary.value.summary, "Strong day!");
        assert!(coach.completion.last_prompt().contains("Today's Score: 85/100"));

        let coach = Coach::new(Scripted::ok("   "));
        let summary = coach.daily_summary(0.0, &BTreeMap::new()).unwrap();
        assert!(summary.fallback);
        assert_eq!(summary.value.summary, SUMMARY_FALLBACK);
        assert!(coach.completion.last_prompt().contains("No category data"));
    }

    #[test]
    fn test_insights_fallback_mentions_average() {
        let coach = Coach::new(Scripted::ok("{\"summary\": \"only one field\"}"));
        let metrics = InsightMetrics {
            total_days: 14,
            average_score: 72.5,
            category_trends: scores(&[("Fitness", 5.0), ("Mind", -3.0)]),
            recent_trend: "improving".to_string(),
        };
        let insights = coach.insights(&metrics).unwrap();
        assert!(insights.fallback);
        assert!(insights.value.highlight.contains("72.5"));

        let prompt = coach.completion.last_prompt();
        assert!(prompt.contains("14-day data"));
        assert!(prompt.contains("Fitness: +5%"));
        assert!(prompt.contains("Mind: -3%"));
    }

    #[test]
    fn test_recommend_reward_limits_habits() {
        let coach = Coach::new(Scripted::ok("Book a massage."));
        let habits: Vec<String> = (1..=7).map(|i| format!("habit{}", i)).collect();
        let reward = coach.recommend_reward(90.0, &habits).unwrap();
        assert_eq!(reward.value.recommendation, "Book a massage.");

        let prompt = coach.completion.last_prompt();
        assert!(prompt.contains("habit5"));
        assert!(!prompt.contains("habit6"));
    }

    #[test]
    fn test_advice_serializes_flat() {
        let advice = Advice::fallback(DailySummary {
            summary: "x".to_string(),
        });
        let json = serde_json::to_value(&advice).unwrap();
        assert_eq!(json, serde_json::json!({"summary": "x", "fallback": true}));
    }
}

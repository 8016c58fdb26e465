//! Static category/task catalog.
//!
//! The catalog is plain configuration: categories of weighted tasks, the
//! negative habits penalized in hardcore mode, and the rewards that can be
//! claimed once the weekly average qualifies. It is never persisted; an
//! alternate catalog can be loaded from a JSON file.

use super::TaskStatus;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// A trackable habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub points: f64,
    /// Status assumed when nothing has been recorded for today
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_status: Option<TaskStatus>,
}

/// A weighted group of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
    /// Declared maximum; expected to equal the sum of task points
    pub points: f64,
    pub tasks: Vec<Task>,
}

impl Category {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Sum of the tasks' point values.
    pub fn task_points(&self) -> f64 {
        self.tasks.iter().map(|t| t.points).sum()
    }
}

/// A habit that costs points while hardcore mode is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegativeHabit {
    pub id: String,
    pub name: String,
    /// Points subtracted when toggled on (positive number)
    pub penalty: f64,
}

/// A claimable reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
}

/// A problem found by [`Catalog::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogIssue {
    /// Declared category max differs from the sum of its tasks
    MaxPointsMismatch {
        category: String,
        declared: f64,
        task_sum: f64,
    },
    /// Task with zero or negative points
    NonPositivePoints { category: String, task: String },
    /// Negative habit with zero or negative penalty
    NonPositivePenalty { habit: String },
    /// Id used more than once within its namespace
    DuplicateId { kind: &'static str, id: String },
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogIssue::MaxPointsMismatch {
                category,
                declared,
                task_sum,
            } => write!(
                f,
                "category '{}' declares {} points but its tasks sum to {}",
                category, declared, task_sum
            ),
            CatalogIssue::NonPositivePoints { category, task } => {
                write!(f, "task '{}/{}' must be worth more than 0 points", category, task)
            }
            CatalogIssue::NonPositivePenalty { habit } => {
                write!(f, "negative habit '{}' must have a penalty above 0", habit)
            }
            CatalogIssue::DuplicateId { kind, id } => write!(f, "duplicate {} id '{}'", kind, id),
        }
    }
}

/// The full static configuration consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
    #[serde(default)]
    pub negative_habits: Vec<NegativeHabit>,
    #[serde(default)]
    pub rewards: Vec<Reward>,
}

impl Catalog {
    /// Load a catalog from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog: Catalog = serde_json::from_str(&content)?;
        if catalog.categories.is_empty() {
            return Err(Error::InvalidInput(format!(
                "catalog {} has no categories",
                path.display()
            )));
        }
        Ok(catalog)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn habit(&self, id: &str) -> Option<&NegativeHabit> {
        self.negative_habits.iter().find(|h| h.id == id)
    }

    pub fn reward(&self, id: &str) -> Option<&Reward> {
        self.rewards.iter().find(|r| r.id == id)
    }

    /// Resolve a category/task pair or report which part is unknown.
    pub fn resolve_task(&self, category_id: &str, task_id: &str) -> Result<(&Category, &Task)> {
        let category = self
            .category(category_id)
            .ok_or_else(|| Error::NotFound(format!("category '{}'", category_id)))?;
        let task = category
            .task(task_id)
            .ok_or_else(|| Error::NotFound(format!("task '{}' in category '{}'", task_id, category_id)))?;
        Ok((category, task))
    }

    /// Highest achievable daily total (sum of declared category maxima).
    pub fn max_points(&self) -> f64 {
        self.categories.iter().map(|c| c.points).sum()
    }

    /// Check the catalog's invariants. An empty list means it is consistent.
    pub fn validate(&self) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();

        let mut category_ids = HashSet::new();
        for category in &self.categories {
            if !category_ids.insert(category.id.as_str()) {
                issues.push(CatalogIssue::DuplicateId {
                    kind: "category",
                    id: category.id.clone(),
                });
            }

            let task_sum = category.task_points();
            if (task_sum - category.points).abs() > f64::EPSILON {
                issues.push(CatalogIssue::MaxPointsMismatch {
                    category: category.id.clone(),
                    declared: category.points,
                    task_sum,
                });
            }

            let mut task_ids = HashSet::new();
            for task in &category.tasks {
                if !task_ids.insert(task.id.as_str()) {
                    issues.push(CatalogIssue::DuplicateId {
                        kind: "task",
                        id: format!("{}/{}", category.id, task.id),
                    });
                }
                if task.points <= 0.0 {
                    issues.push(CatalogIssue::NonPositivePoints {
                        category: category.id.clone(),
                        task: task.id.clone(),
                    });
                }
            }
        }

        let mut habit_ids = HashSet::new();
        for habit in &self.negative_habits {
            if !habit_ids.insert(habit.id.as_str()) {
                issues.push(CatalogIssue::DuplicateId {
                    kind: "habit",
                    id: habit.id.clone(),
                });
            }
            if habit.penalty <= 0.0 {
                issues.push(CatalogIssue::NonPositivePenalty {
                    habit: habit.id.clone(),
                });
            }
        }

        let mut reward_ids = HashSet::new();
        for reward in &self.rewards {
            if !reward_ids.insert(reward.id.as_str()) {
                issues.push(CatalogIssue::DuplicateId {
                    kind: "reward",
                    id: reward.id.clone(),
                });
            }
        }

        issues
    }
}

fn task(id: &str, name: &str, points: f64) -> Task {
    Task {
        id: id.to_string(),
        name: name.to_string(),
        points,
        default_status: None,
    }
}

fn category(id: &str, name: &str, points: f64, tasks: Vec<Task>) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        icon: id.to_string(),
        points,
        tasks,
    }
}

fn habit(id: &str, name: &str, penalty: f64) -> NegativeHabit {
    NegativeHabit {
        id: id.to_string(),
        name: name.to_string(),
        penalty,
    }
}

fn reward(id: &str, name: &str, icon: &str, description: &str) -> Reward {
    Reward {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        description: description.to_string(),
    }
}

impl Default for Catalog {
    /// Five categories of two tasks each, 100 points in total.
    fn default() -> Self {
        Self {
            categories: vec![
                category(
                    "mindset",
                    "Mindset & Focus",
                    20.0,
                    vec![
                        task("meditation", "Meditation (10 min)", 10.0),
                        task("journaling", "Journaling", 10.0),
                    ],
                ),
                category(
                    "fitness",
                    "Fitness & Health",
                    20.0,
                    vec![
                        task("workout", "Workout (30 min)", 15.0),
                        task("hydration", "Drink 2L water", 5.0),
                    ],
                ),
                category(
                    "productivity",
                    "Productivity & Learning",
                    25.0,
                    vec![
                        task("study", "Study/Skill practice", 15.0),
                        task("reading", "Reading (30 min)", 10.0),
                    ],
                ),
                category(
                    "communication",
                    "Communication & Social",
                    15.0,
                    vec![
                        task("social", "Quality social time", 10.0),
                        task("gratitude", "Express gratitude", 5.0),
                    ],
                ),
                category(
                    "discipline",
                    "Discipline & Habits",
                    20.0,
                    vec![
                        task("sleep", "Sleep early (before 11 PM)", 10.0),
                        task("routine", "Follow morning routine", 10.0),
                    ],
                ),
            ],
            negative_habits: vec![
                habit("mindless-scroll", "Scroll >1 hr mindlessly", 5.0),
                habit("skip-workout", "Skip workout", 10.0),
                habit("sleep-late", "Sleep late (>1:30 AM)", 10.0),
                habit("negative-talk", "Negative self-talk", 5.0),
            ],
            rewards: vec![
                reward("cheat-meal", "Cheat Meal", "meal", "Enjoy your favorite meal guilt-free!"),
                reward("solo-movie", "Solo Movie", "movie", "Watch a movie by yourself"),
                reward(
                    "small-purchase",
                    "Small Purchase",
                    "purchase",
                    "Treat yourself to something nice",
                ),
            ],
        }
    }
}

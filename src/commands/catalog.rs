//! Catalog listing and invariant check.

use super::{CommandResult, pts};
use crate::models::Catalog;
use crate::{Error, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CatalogResult {
    #[serde(flatten)]
    pub catalog: Catalog,
    pub max_points: f64,
}

impl CommandResult for CatalogResult {
    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for category in &self.catalog.categories {
            lines.push(format!(
                "{} [{}] {} pts",
                category.name,
                category.id,
                pts(category.points)
            ));
            for task in &category.tasks {
                lines.push(format!("  {} - {} ({} pts)", task.id, task.name, pts(task.points)));
            }
        }
        if !self.catalog.negative_habits.is_empty() {
            lines.push("Negative habits (hardcore mode):".to_string());
            for habit in &self.catalog.negative_habits {
                lines.push(format!("  {} - {} (-{})", habit.id, habit.name, pts(habit.penalty)));
            }
        }
        if !self.catalog.rewards.is_empty() {
            lines.push("Rewards:".to_string());
            for reward in &self.catalog.rewards {
                lines.push(format!("  {} - {}", reward.id, reward.name));
            }
        }
        lines.push(format!("Max daily points: {}", pts(self.max_points)));
        lines.join("\n")
    }
}

pub fn catalog_show(catalog: &Catalog) -> CatalogResult {
    CatalogResult {
        catalog: catalog.clone(),
        max_points: catalog.max_points(),
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogCheckResult {
    pub valid: bool,
    pub categories: usize,
    pub tasks: usize,
    pub max_points: f64,
}

impl CommandResult for CatalogCheckResult {
    fn to_human(&self) -> String {
        format!(
            "Catalog OK: {} categories, {} tasks, {} max points",
            self.categories,
            self.tasks,
            pts(self.max_points)
        )
    }
}

/// Validate the catalog; any issue is an error listing all of them.
pub fn catalog_check(catalog: &Catalog) -> Result<CatalogCheckResult> {
    let issues = catalog.validate();
    if !issues.is_empty() {
        let details = issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::InvalidInput(format!(
            "catalog has {} issue(s): {}",
            issues.len(),
            details
        )));
    }
    Ok(CatalogCheckResult {
        valid: true,
        categories: catalog.categories.len(),
        tasks: catalog.categories.iter().map(|c| c.tasks.len()).sum(),
        max_points: catalog.max_points(),
    })
}

//! `lu config` - show, read and write config.kdl.

use super::CommandResult;
use crate::config::{Resolved, ResolvedConfig, load_config, save_config};
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One effective setting and where it came from.
#[derive(Debug, Serialize)]
pub struct SettingView {
    pub key: &'static str,
    pub value: Option<String>,
    pub source: Option<String>,
}

impl SettingView {
    fn resolved<T>(key: &'static str, r: &Resolved<T>, show: impl Fn(&T) -> String) -> Self {
        Self {
            key,
            value: Some(show(&r.value)),
            source: Some(r.source.to_string()),
        }
    }

    fn optional<T>(
        key: &'static str,
        r: Option<&Resolved<T>>,
        show: impl Fn(&T) -> String,
    ) -> Self {
        match r {
            Some(r) => Self::resolved(key, r, show),
            None => Self {
                key,
                value: None,
                source: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigShowResult {
    pub path: PathBuf,
    pub settings: Vec<SettingView>,
}

impl CommandResult for ConfigShowResult {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Config file: {}", self.path.display())];
        for setting in &self.settings {
            match (&setting.value, &setting.source) {
                (Some(value), Some(source)) => {
                    lines.push(format!("  {} = {} ({})", setting.key, value, source))
                }
                _ => lines.push(format!("  {} (not set)", setting.key)),
            }
        }
        lines.join("\n")
    }
}

/// Effective configuration with sources. The API key is masked.
pub fn config_show(path: &Path, config: &ResolvedConfig) -> ConfigShowResult {
    let display_path = |p: &PathBuf| p.display().to_string();
    let settings = vec![
        SettingView::resolved("output-format", &config.output_format, |f| f.to_string()),
        SettingView::resolved("data-dir", &config.data_dir, display_path),
        SettingView::resolved("backend", &config.backend, |b| b.to_string()),
        SettingView::optional("catalog", config.catalog.as_ref(), display_path),
        SettingView::resolved("coach-endpoint", &config.coach_endpoint, String::clone),
        SettingView::resolved("coach-model", &config.coach_model, String::clone),
        SettingView::resolved("action-log", &config.action_log, bool::to_string),
        SettingView {
            key: "api-key",
            value: config.masked_api_key(),
            source: config.api_key.as_ref().map(|r| r.source.to_string()),
        },
    ];
    ConfigShowResult {
        path: path.to_path_buf(),
        settings,
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigGetResult {
    pub key: String,
    pub value: Option<String>,
}

impl CommandResult for ConfigGetResult {
    fn to_human(&self) -> String {
        match &self.value {
            Some(value) => value.clone(),
            None => format!("{} is not set", self.key),
        }
    }
}

/// Value stored in config.kdl for `key` (not the effective value).
pub fn config_get(path: &Path, key: &str) -> Result<ConfigGetResult> {
    let config = load_config(path)?;
    Ok(ConfigGetResult {
        key: key.to_string(),
        value: config.get(key)?,
    })
}

#[derive(Debug, Serialize)]
pub struct ConfigSetResult {
    pub key: String,
    pub value: String,
    pub path: PathBuf,
}

impl CommandResult for ConfigSetResult {
    fn to_human(&self) -> String {
        format!("Set {} = {} in {}", self.key, self.value, self.path.display())
    }
}

/// Validate and store one key in config.kdl.
pub fn config_set(path: &Path, key: &str, value: &str) -> Result<ConfigSetResult> {
    if key == "api-key" {
        return Err(Error::Config(format!(
            "the API key is never stored in config; set {} instead",
            crate::config::API_KEY_ENV
        )));
    }
    let mut config = load_config(path)?;
    config.set(key, value)?;
    save_config(path, &config)?;
    tracing::info!(key, "config updated");

    Ok(ConfigSetResult {
        key: key.to_string(),
        value: value.to_string(),
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use tempfile::TempDir;

    #[test]
    fn test_set_then_get() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.kdl");

        config_set(&path, "output-format", "human").unwrap();
        config_set(&path, "coach-model", "gemini-1.5-flash").unwrap();

        assert_eq!(
            config_get(&path, "output-format").unwrap().value.as_deref(),
            Some("human")
        );
        assert_eq!(config_get(&path, "catalog").unwrap().value, None);

        let stored = load_config(&path).unwrap();
        assert_eq!(stored.output_format, Some(OutputFormat::Human));
        assert_eq!(stored.coach_model.as_deref(), Some("gemini-1.5-flash"));
    }

    #[test]
    fn test_set_rejects_api_key_and_unknown_keys() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.kdl");

        assert!(matches!(
            config_set(&path, "api-key", "secret"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            config_set(&path, "colour", "red"),
            Err(Error::Config(_))
        ));
        assert!(!path.exists());
    }
}

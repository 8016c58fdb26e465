//! KDL schema definition for config.kdl.
//!
//! This module provides:
//! - A Rust struct representing the KDL schema
//! - Serialization/deserialization to/from KDL format
//! - Validation and per-key get/set for `lu config`
//! - Default values

use crate::storage::BackendType;
use crate::{Error, Result};
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Keys accepted in config.kdl and by `lu config get/set`.
pub const CONFIG_KEYS: [&str; 7] = [
    "output-format",
    "data-dir",
    "backend",
    "catalog",
    "coach-endpoint",
    "coach-model",
    "action-log",
];

/// User preferences stored in config.kdl.
///
/// Secrets never live here; the coach API key is read from `LU_API_KEY`.
///
/// # KDL Schema
///
/// ```kdl
/// output-format "human"  // or "json"
/// data-dir "/home/me/.habits"
/// backend "file"         // or "memory"
/// catalog "/home/me/.habits/catalog.json"
/// coach-endpoint "https://generativelanguage.googleapis.com/v1beta"
/// coach-model "gemini-pro"
/// action-log #true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelUpConfig {
    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Directory holding the record files
    pub data_dir: Option<PathBuf>,

    /// Record store backend
    pub backend: Option<BackendType>,

    /// JSON file replacing the built-in catalog
    pub catalog: Option<PathBuf>,

    /// Base URL of the text-completion API
    pub coach_endpoint: Option<String>,

    /// Model name passed to the text-completion API
    pub coach_model: Option<String>,

    /// Whether commands are appended to the action log
    pub action_log: Option<bool>,
}

fn first_value<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a KdlValue> {
    doc.get(name)
        .and_then(|node| node.entries().first())
        .map(|entry| entry.value())
}

fn first_string(doc: &KdlDocument, name: &str) -> Option<String> {
    first_value(doc, name)
        .and_then(|v| v.as_string())
        .map(str::to_string)
}

fn string_node(name: &str, value: &str) -> KdlNode {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(KdlValue::String(value.to_string())));
    node
}

impl LevelUpConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(ref endpoint) = self.coach_endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(format!(
                    "coach-endpoint must be an http(s) URL, got {}",
                    endpoint
                ));
            }
        }
        if let Some(ref model) = self.coach_model {
            if model.trim().is_empty() {
                return Err("coach-model must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    ///
    /// Unknown nodes and values of the wrong type are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        Self {
            output_format: first_string(doc, "output-format").and_then(|s| OutputFormat::parse(&s)),
            data_dir: first_string(doc, "data-dir").map(PathBuf::from),
            backend: first_string(doc, "backend").and_then(|s| BackendType::parse(&s)),
            catalog: first_string(doc, "catalog").map(PathBuf::from),
            coach_endpoint: first_string(doc, "coach-endpoint"),
            coach_model: first_string(doc, "coach-model"),
            action_log: first_value(doc, "action-log").and_then(|v| v.as_bool()),
        }
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();
        let nodes = doc.nodes_mut();

        if let Some(format) = self.output_format {
            nodes.push(string_node("output-format", format.as_str()));
        }
        if let Some(ref dir) = self.data_dir {
            nodes.push(string_node("data-dir", &dir.to_string_lossy()));
        }
        if let Some(backend) = self.backend {
            nodes.push(string_node("backend", backend.as_str()));
        }
        if let Some(ref catalog) = self.catalog {
            nodes.push(string_node("catalog", &catalog.to_string_lossy()));
        }
        if let Some(ref endpoint) = self.coach_endpoint {
            nodes.push(string_node("coach-endpoint", endpoint));
        }
        if let Some(ref model) = self.coach_model {
            nodes.push(string_node("coach-model", model));
        }
        if let Some(enabled) = self.action_log {
            let mut node = KdlNode::new("action-log");
            node.push(KdlEntry::new(KdlValue::Bool(enabled)));
            nodes.push(node);
        }

        doc
    }

    /// Current value of a key as a string, if set.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "output-format" => self.output_format.map(|f| f.as_str().to_string()),
            "data-dir" => self.data_dir.as_ref().map(|p| p.display().to_string()),
            "backend" => self.backend.map(|b| b.as_str().to_string()),
            "catalog" => self.catalog.as_ref().map(|p| p.display().to_string()),
            "coach-endpoint" => self.coach_endpoint.clone(),
            "coach-model" => self.coach_model.clone(),
            "action-log" => self.action_log.map(|b| b.to_string()),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a key from its string form, validating the value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "output-format" => {
                self.output_format = Some(OutputFormat::parse(value).ok_or_else(|| {
                    Error::Config(format!("output-format must be json or human, got {}", value))
                })?);
            }
            "data-dir" => self.data_dir = Some(PathBuf::from(value)),
            "backend" => {
                self.backend = Some(BackendType::parse(value).ok_or_else(|| {
                    Error::Config(format!("backend must be file or memory, got {}", value))
                })?);
            }
            "catalog" => self.catalog = Some(PathBuf::from(value)),
            "coach-endpoint" => self.coach_endpoint = Some(value.to_string()),
            "coach-model" => self.coach_model = Some(value.to_string()),
            "action-log" => {
                self.action_log = Some(parse_bool(value).ok_or_else(|| {
                    Error::Config(format!("action-log must be true or false, got {}", value))
                })?);
            }
            _ => return Err(unknown_key(key)),
        }
        self.validate().map_err(Error::Config)
    }
}

fn unknown_key(key: &str) -> Error {
    Error::Config(format!(
        "unknown config key '{}' (known: {})",
        key,
        CONFIG_KEYS.join(", ")
    ))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

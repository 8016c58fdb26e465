//! Action logging for levelup commands.
//!
//! Every command run is appended to `action.log` in the data directory as one
//! JSON object per line. Disabled with `action-log false` in config.kdl.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the log inside the data directory.
pub const ACTION_LOG_FILE: &str = "action.log";

/// Argument keys whose values are never written to the log.
const REDACTED_KEYS: [&str; 6] = ["password", "token", "key", "secret", "entry", "message"];

/// Represents a single action log entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionLog {
    /// ISO 8601 timestamp when the action occurred
    pub timestamp: DateTime<Utc>,

    /// Command name (e.g., "mark", "coach mood", "status")
    pub command: String,

    /// Command arguments as JSON
    pub args: serde_json::Value,

    /// Whether the command succeeded
    pub success: bool,

    /// Error message if the command failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Command execution duration in milliseconds
    pub duration_ms: u64,

    /// User who executed the command
    pub user: String,
}

/// Path of the action log for a data directory.
pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(ACTION_LOG_FILE)
}

/// Append an entry for a finished command.
///
/// Never fails: write errors are logged at `warn` so a broken log cannot
/// break the command that produced it.
pub fn log_action(
    path: &Path,
    command: &str,
    args: serde_json::Value,
    success: bool,
    error: Option<String>,
    duration_ms: u64,
) {
    let entry = ActionLog {
        timestamp: Utc::now(),
        command: command.to_string(),
        args: sanitize_args(&args),
        success,
        error,
        duration_ms,
        user: get_current_user(),
    };

    if let Err(e) = write_log_entry(path, &entry) {
        tracing::warn!(path = %path.display(), error = %e, "failed to write action log");
    }
}

/// Write a log entry to the log file.
fn write_log_entry(path: &Path, entry: &ActionLog) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", json)?;

    Ok(())
}

/// Sanitize arguments to remove sensitive data.
fn sanitize_args(args: &serde_json::Value) -> serde_json::Value {
    match args {
        serde_json::Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, value) in map {
                let key_lower = key.to_lowercase();
                if REDACTED_KEYS.iter().any(|k| key_lower.contains(k)) {
                    sanitized.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    sanitized.insert(key.clone(), sanitize_args(value));
                }
            }
            serde_json::Value::Object(sanitized)
        }
        serde_json::Value::Array(arr) => {
            if arr.len() > 10 {
                serde_json::Value::String(format!("[Array with {} items]", arr.len()))
            } else {
                serde_json::Value::Array(arr.iter().map(sanitize_args).collect())
            }
        }
        serde_json::Value::String(s) => {
            // Paths are reduced to their basename
            let sanitized = if s.contains('/') || s.contains('\\') {
                s.rsplit(['/', '\\']).next().unwrap_or(s).to_string()
            } else {
                s.clone()
            };

            if sanitized.chars().count() > 100 {
                let head: String = sanitized.chars().take(97).collect();
                serde_json::Value::String(format!(
                    "{}... ({} chars)",
                    head,
                    sanitized.chars().count()
                ))
            } else {
                serde_json::Value::String(sanitized)
            }
        }
        _ => args.clone(),
    }
}

/// Get the current user's username.
fn get_current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_simple_string() {
        assert_eq!(sanitize_args(&json!("fitness")), json!("fitness"));
    }

    #[test]
    fn test_sanitize_file_path() {
        assert_eq!(
            sanitize_args(&json!("/home/me/habits/catalog.json")),
            json!("catalog.json")
        );
        assert_eq!(
            sanitize_args(&json!("C:\\Users\\me\\catalog.json")),
            json!("catalog.json")
        );
    }

    #[test]
    fn test_sanitize_redacts_sensitive_keys() {
        let args = json!({
            "api_key": "AIzaSy...",
            "entry": "Felt awful about work today",
            "message": "private chat",
            "category": "fitness"
        });
        let sanitized = sanitize_args(&args);
        assert_eq!(sanitized["api_key"], "[REDACTED]");
        assert_eq!(sanitized["entry"], "[REDACTED]");
        assert_eq!(sanitized["message"], "[REDACTED]");
        assert_eq!(sanitized["category"], "fitness");
    }

    #[test]
    fn test_sanitize_long_string_and_array() {
        let long = "x".repeat(150);
        let sanitized = sanitize_args(&json!(long));
        assert_eq!(
            sanitized,
            json!(format!("{}... (150 chars)", "x".repeat(97)))
        );

        let items: Vec<u32> = (0..11).collect();
        assert_eq!(sanitize_args(&json!(items)), json!("[Array with 11 items]"));
        assert_eq!(sanitize_args(&json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn test_log_action_appends_jsonl() {
        let temp = TempDir::new().unwrap();
        let path = log_path(&temp.path().join("data"));

        log_action(&path, "mark", json!({"category": "fitness"}), true, None, 3);
        log_action(
            &path,
            "claim",
            json!({"reward": "cheat-meal"}),
            false,
            Some("no reward available".to_string()),
            1,
        );

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: ActionLog = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.command, "mark");
        assert!(first.success);
        assert!(first.error.is_none());

        let second: ActionLog = serde_json::from_str(lines[1]).unwrap();
        assert!(!second.success);
        assert_eq!(second.error.as_deref(), Some("no reward available"));
    }

    #[test]
    fn test_log_action_unwritable_path_is_silent() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, "").unwrap();
        // Parent is a regular file; must not panic
        log_action(&blocker.join("action.log"), "status", json!({}), true, None, 0);
    }
}

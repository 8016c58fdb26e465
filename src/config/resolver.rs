//! Unified precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`LU_DATA_DIR`)
//! 3. config.kdl (`~/.config/levelup/config.kdl`, or `LU_CONFIG`)
//! 4. Built-in defaults
//!
//! The coach API key is only ever read from `LU_API_KEY`.

use crate::config::schema::{LevelUpConfig, OutputFormat};
use crate::storage::{BackendType, default_data_dir};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "LU_CONFIG";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LU_DATA_DIR";
/// Environment variable holding the coach API key.
pub const API_KEY_ENV: &str = "LU_API_KEY";

/// Default text-completion endpoint.
pub const DEFAULT_COACH_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default text-completion model.
pub const DEFAULT_COACH_MODEL: &str = "gemini-pro";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    ConfigFile,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub output_format: Resolved<OutputFormat>,
    pub data_dir: Resolved<PathBuf>,
    pub backend: Resolved<BackendType>,
    /// Alternate catalog file; `None` means the built-in catalog
    pub catalog: Option<Resolved<PathBuf>>,
    pub coach_endpoint: Resolved<String>,
    pub coach_model: Resolved<String>,
    pub action_log: Resolved<bool>,
    /// Never persisted; only present when `LU_API_KEY` is set
    pub api_key: Option<Resolved<String>>,
}

impl ResolvedConfig {
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir.value
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|r| r.value.as_str())
    }

    /// API key for display: first and last four characters only.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_ref().map(|r| mask_key(&r.value))
    }
}

/// Keep the first four characters, plus the last four when the key is long
/// enough that they reveal nothing else.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(4).collect();
    if chars.len() <= 12 {
        format!("{}...", head)
    } else {
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Output format override from CLI flag
    pub output_format: Option<OutputFormat>,
    /// Data directory override from CLI flag
    pub data_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set output format override.
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Set data directory override.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Path of config.kdl: `LU_CONFIG` if set, else `<config dir>/levelup/config.kdl`.
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = env_value(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    let dir = dirs::config_dir()
        .ok_or_else(|| Error::Other("Could not determine config directory".to_string()))?;
    Ok(dir.join("levelup").join("config.kdl"))
}

/// Read config.kdl. A missing file is an empty config.
pub fn load_config(path: &Path) -> Result<LevelUpConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LevelUpConfig::default()),
        Err(e) => return Err(e.into()),
    };
    let doc: kdl::KdlDocument = content.parse()?;
    let config = LevelUpConfig::from_kdl(&doc);
    config
        .validate()
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(config)
}

/// Write config.kdl, creating its parent directory.
pub fn save_config(path: &Path, config: &LevelUpConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, config.to_kdl().to_string())?;
    tracing::debug!(path = %path.display(), "config written");
    Ok(())
}

/// Resolve configuration with full precedence chain.
///
/// Precedence (highest to lowest):
/// 1. CLI flags (from `overrides`)
/// 2. Environment variables
/// 3. config.kdl (`file`)
/// 4. Built-in defaults
pub fn resolve_config(file: &LevelUpConfig, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let output_format = if let Some(format) = overrides.output_format {
        Resolved::new(format, ValueSource::CliFlag)
    } else if let Some(format) = file.output_format {
        Resolved::new(format, ValueSource::ConfigFile)
    } else {
        Resolved::new(OutputFormat::default(), ValueSource::Default)
    };

    let data_dir = if let Some(ref dir) = overrides.data_dir {
        Resolved::new(dir.clone(), ValueSource::CliFlag)
    } else if let Some(dir) = env_value(DATA_DIR_ENV) {
        Resolved::new(
            PathBuf::from(dir),
            ValueSource::EnvVar(DATA_DIR_ENV.to_string()),
        )
    } else if let Some(ref dir) = file.data_dir {
        Resolved::new(dir.clone(), ValueSource::ConfigFile)
    } else {
        Resolved::new(default_data_dir()?, ValueSource::Default)
    };

    let backend = match file.backend {
        Some(backend) => Resolved::new(backend, ValueSource::ConfigFile),
        None => Resolved::new(BackendType::default(), ValueSource::Default),
    };

    let catalog = file
        .catalog
        .clone()
        .map(|path| Resolved::new(path, ValueSource::ConfigFile));

    let coach_endpoint = match file.coach_endpoint {
        Some(ref endpoint) => Resolved::new(endpoint.clone(), ValueSource::ConfigFile),
        None => Resolved::new(DEFAULT_COACH_ENDPOINT.to_string(), ValueSource::Default),
    };

    let coach_model = match file.coach_model {
        Some(ref model) => Resolved::new(model.clone(), ValueSource::ConfigFile),
        None => Resolved::new(DEFAULT_COACH_MODEL.to_string(), ValueSource::Default),
    };

    let action_log = match file.action_log {
        Some(enabled) => Resolved::new(enabled, ValueSource::ConfigFile),
        None => Resolved::new(true, ValueSource::Default),
    };

    let api_key = env_value(API_KEY_ENV)
        .map(|key| Resolved::new(key, ValueSource::EnvVar(API_KEY_ENV.to_string())));

    Ok(ResolvedConfig {
        output_format,
        data_dir,
        backend,
        catalog,
        coach_endpoint,
        coach_model,
        action_log,
        api_key,
    })
}

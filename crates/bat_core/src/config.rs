//! Application configuration loading.
//!
//! # Responsibility
//! - Deserialize application config from JSON with full defaults.
//! - Apply `BAT_LOG_*` environment overrides.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - Log levels are normalized to `trace|debug|info|warn|error`.

use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_LOG_LEVEL: &str = "BAT_LOG_LEVEL";
pub const ENV_LOG_OUTPUT: &str = "BAT_LOG_OUTPUT";
pub const ENV_LOG_DIR: &str = "BAT_LOG_DIR";

/// Log line encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogOutput {
    /// Timestamped, human-readable lines.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

impl LogOutput {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                field: "logging.output",
                value: other.to_string(),
            }),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    pub output: LogOutput,
    /// Absolute directory for rotating log files; stdout when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            output: LogOutput::Human,
            log_dir: None,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Parses config from a JSON document and normalizes it.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.normalized()
    }

    /// Reads config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
        Self::from_json_str(&raw)
    }

    /// Applies overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, keyed by `BAT_LOG_*` variable names.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(output) = lookup(ENV_LOG_OUTPUT) {
            self.logging.output = LogOutput::parse(&output)?;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            let trimmed = dir.trim();
            self.logging.log_dir = if trimmed.is_empty() {
                None
            } else {
                Some(PathBuf::from(trimmed))
            };
        }
        self.normalized()
    }

    fn normalized(mut self) -> Result<Self, ConfigError> {
        let level = normalize_level(&self.logging.level).map_err(|_| {
            ConfigError::InvalidValue {
                field: "logging.level",
                value: self.logging.level.clone(),
            }
        })?;
        self.logging.level = level.to_string();
        Ok(self)
    }
}

/// Configuration loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    InvalidValue {
        field: &'static str,
        value: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidValue { field, value } => {
                write!(f, "invalid value for `{field}`: `{value}`")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, LogOutput, ENV_LOG_DIR, ENV_LOG_LEVEL, ENV_LOG_OUTPUT};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_object_uses_defaults() {
        let config = AppConfig::from_json_str("{}").expect("empty config should parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.logging.output, LogOutput::Human);
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn parses_and_normalizes_logging_section() {
        let config = AppConfig::from_json_str(
            r#"{"logging": {"level": " WARNING ", "output": "json", "log_dir": "/var/log/bat"}}"#,
        )
        .expect("config should parse");
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.output, LogOutput::Json);
        assert_eq!(config.logging.log_dir, Some(PathBuf::from("/var/log/bat")));
    }

    #[test]
    fn rejects_unknown_level() {
        let err = AppConfig::from_json_str(r#"{"logging": {"level": "verbose"}}"#)
            .expect_err("unknown level must fail");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "logging.level",
                ..
            }
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = AppConfig::from_json_str("{").expect_err("malformed json must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let config = AppConfig::default()
            .with_overrides(lookup_from(&[
                (ENV_LOG_LEVEL, "TRACE"),
                (ENV_LOG_OUTPUT, "json"),
                (ENV_LOG_DIR, "/tmp/bat-logs"),
            ]))
            .expect("overrides should apply");
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.output, LogOutput::Json);
        assert_eq!(config.logging.log_dir, Some(PathBuf::from("/tmp/bat-logs")));
    }

    #[test]
    fn blank_log_dir_override_falls_back_to_stdout() {
        let mut base = AppConfig::default();
        base.logging.log_dir = Some(PathBuf::from("/var/log/bat"));
        let config = base
            .with_overrides(lookup_from(&[(ENV_LOG_DIR, "  ")]))
            .expect("overrides should apply");
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn rejects_unknown_output_override() {
        let err = AppConfig::default()
            .with_overrides(lookup_from(&[(ENV_LOG_OUTPUT, "xml")]))
            .expect_err("unknown output must fail");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "logging.output",
                ..
            }
        ));
    }
}

//! Configuration for the Daybook application
//!
//! Sources are applied in order of increasing precedence: built-in defaults,
//! an optional YAML or JSON file, then `DAYBOOK_*` environment variables.
//! Command-line flags are applied last by the CLI itself.

use crate::error::{DaybookError, Result};
use chrono::Locale;
use daybook_common::get_default_database_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaybookConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Default tracing level, overridden by `RUST_LOG`
    pub log_level: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
    /// Locale used for formatted dates, e.g. `en_US` or `de_DE`
    pub locale: String,
}

impl Default for DaybookConfig {
    fn default() -> Self {
        Self {
            database_path: get_default_database_path(),
            log_level: "info".to_string(),
            json_logs: false,
            locale: "en_US".to_string(),
        }
    }
}

impl DaybookConfig {
    /// Configuration with a custom database path and default everything else
    #[must_use]
    pub fn new<P: AsRef<Path>>(database_path: P) -> Self {
        Self {
            database_path: database_path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Defaults overridden by the `DAYBOOK_*` environment variables
    ///
    /// # Errors
    /// Returns `DaybookError::Configuration` if `DAYBOOK_JSON_LOGS` is not a boolean
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("DAYBOOK_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(level) = std::env::var("DAYBOOK_LOG_LEVEL") {
            config.log_level = level.to_lowercase();
        }
        if let Ok(json) = std::env::var("DAYBOOK_JSON_LOGS") {
            config.json_logs = parse_flag(&json).ok_or_else(|| {
                DaybookError::configuration(format!("Invalid DAYBOOK_JSON_LOGS value: {json}"))
            })?;
        }
        if let Ok(locale) = std::env::var("DAYBOOK_LOCALE") {
            config.locale = locale;
        }

        Ok(config)
    }

    /// Read a configuration file; `.json` files are JSON, anything else YAML
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DaybookError::configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(|e| {
                DaybookError::configuration(format!("Failed to parse JSON config: {e}"))
            })
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                DaybookError::configuration(format!("Failed to parse YAML config: {e}"))
            })
        }
    }

    /// Write the configuration as YAML
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Overlay the non-default values of `other`
    pub fn merge_with(&mut self, other: &DaybookConfig) {
        let defaults = Self::default();
        if other.database_path != defaults.database_path {
            self.database_path = other.database_path.clone();
        }
        if other.log_level != defaults.log_level {
            self.log_level = other.log_level.clone();
        }
        if other.json_logs {
            self.json_logs = true;
        }
        if other.locale != defaults.locale {
            self.locale = other.locale.clone();
        }
    }

    /// Defaults, then `file` if given, then the environment; validated
    ///
    /// # Errors
    /// Returns an error if any source is unreadable or the result is invalid
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = file {
            debug!("Loading configuration from file: {}", path.display());
            config.merge_with(&Self::from_file(path)?);
        }
        config.merge_with(&Self::from_env()?);
        config.validate()?;

        info!("Configuration loaded, database at {}", config.database_path.display());
        Ok(config)
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    /// Returns `DaybookError::Configuration` naming the offending field
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(DaybookError::configuration("Database path cannot be empty"));
        }
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(DaybookError::configuration(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }
        self.chrono_locale()?;
        Ok(())
    }

    /// The configured locale for date formatting
    ///
    /// # Errors
    /// Returns `DaybookError::Configuration` for unknown locale names
    pub fn chrono_locale(&self) -> Result<Locale> {
        Locale::try_from(self.locale.as_str())
            .map_err(|_| DaybookError::configuration(format!("Unknown locale: {}", self.locale)))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = DaybookConfig::default();
        assert!(config.database_path.ends_with("daybook.sqlite"));
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("YES"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("sometimes"), None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = DaybookConfig::new("/tmp/daybook.sqlite");
        config.log_level = "loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(DaybookError::Configuration { .. })
        ));

        let mut config = DaybookConfig::new("/tmp/daybook.sqlite");
        config.locale = "xx_NOWHERE".to_string();
        assert!(config.validate().is_err());

        assert!(DaybookConfig::new("").validate().is_err());
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("daybook.yaml");
        let mut config = DaybookConfig::new(dir.path().join("events.sqlite"));
        config.locale = "de_DE".to_string();
        config.json_logs = true;

        config.to_file(&path).unwrap();
        assert_eq!(DaybookConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("daybook.yml");
        std::fs::write(&path, "log_level: debug\n").unwrap();

        let config = DaybookConfig::from_file(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.locale, "en_US");
    }

    #[test]
    fn test_merge_with_prefers_non_defaults() {
        let mut base = DaybookConfig::new("/data/daybook.sqlite");
        let mut overlay = DaybookConfig::default();
        overlay.log_level = "warn".to_string();

        base.merge_with(&overlay);
        assert_eq!(base.database_path, PathBuf::from("/data/daybook.sqlite"));
        assert_eq!(base.log_level, "warn");
    }
}

//! Process configuration resolved from the environment.
//!
//! # Invariants
//! - Blank variables are treated as unset.
//! - Resolution never fails; invalid log levels are rejected later by
//!   logging init, not here.

use notebase_core::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "NOTEBASE_DB_PATH";
pub const LOG_DIR_ENV: &str = "NOTEBASE_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "NOTEBASE_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "notebase.sqlite3";

/// Runtime settings for the tool server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite database file, created and migrated on open.
    pub db_path: PathBuf,
    /// Absolute directory for rolling log files. `None` logs to stderr.
    pub log_dir: Option<String>,
    pub log_level: String,
}

impl AppConfig {
    /// Reads settings from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: read(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_dir: read(LOG_DIR_ENV),
            log_level: read(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]);
        assert_eq!(
            config.db_path,
            std::env::temp_dir().join("notebase.sqlite3")
        );
        assert_eq!(config.log_dir, None);
        assert_eq!(config.log_level, notebase_core::default_log_level());
    }

    #[test]
    fn values_are_trimmed_and_blank_means_unset() {
        let config = config_from(&[
            (DB_PATH_ENV, " /tmp/custom.sqlite3 "),
            (LOG_DIR_ENV, "   "),
            (LOG_LEVEL_ENV, "warn"),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/tmp/custom.sqlite3"));
        assert_eq!(config.log_dir, None);
        assert_eq!(config.log_level, "warn");
    }
}

//! Runtime configuration for store and logging bootstrap.
//!
//! # Responsibility
//! - Provide defaults for database location and log settings.
//! - Apply `STREAK_*` environment overrides with validation.
//!
//! # Invariants
//! - Blank override values are ignored, not treated as errors.
//! - `log_dir`, when set, is absolute.

use crate::logging::{default_log_level, parse_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "STREAK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "STREAK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "STREAK_LOG_DIR";

/// Default database file name under the platform temp directory.
pub const DEFAULT_DB_FILE_NAME: &str = "streak_seeker.sqlite3";

/// Invalid configuration override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    RelativeLogDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(value) => write!(
                f,
                "{LOG_LEVEL_ENV}=`{value}` is not one of trace|debug|info|warn|error"
            ),
            Self::RelativeLogDir(value) => {
                write!(f, "{LOG_DIR_ENV} must be an absolute path, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Store and logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            db_path: Self::db_path_from_lookup(|_| None),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl StreakConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self {
            db_path: Self::db_path_from_lookup(&lookup),
            ..Self::default()
        };
        let value_of = |key: &str| non_blank(&lookup, key);

        if let Some(level) = value_of(LOG_LEVEL_ENV) {
            config.log_level =
                parse_level(&level).map_err(|_| ConfigError::InvalidLogLevel(level))?;
        }
        if let Some(dir) = value_of(LOG_DIR_ENV) {
            if !Path::new(&dir).is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }

    /// Database path alone, from the process environment.
    ///
    /// Never fails: the path has no validation, so a bad log override
    /// elsewhere does not redirect the store to the default file.
    pub fn db_path_from_env() -> PathBuf {
        Self::db_path_from_lookup(|key| std::env::var(key).ok())
    }

    /// Database path alone, from an arbitrary key lookup.
    pub fn db_path_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
        non_blank(&lookup, DB_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
    }
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = StreakConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StreakConfig::default());
        assert!(config.db_path.ends_with(DEFAULT_DB_FILE_NAME));
    }

    #[test]
    fn overrides_are_trimmed_and_normalized() {
        let log_dir = std::env::temp_dir().join("streak-logs");
        let log_dir_str = log_dir.to_str().unwrap();
        let config = StreakConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, " /data/habits.sqlite3 "),
            (LOG_LEVEL_ENV, "WARNING"),
            (LOG_DIR_ENV, log_dir_str),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/data/habits.sqlite3"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(log_dir));
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let err = StreakConfig::from_lookup(lookup(&[(LOG_LEVEL_ENV, "verbose")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidLogLevel("verbose".to_string()));

        let err = StreakConfig::from_lookup(lookup(&[(LOG_DIR_ENV, "logs/dev")])).unwrap_err();
        assert!(matches!(err, ConfigError::RelativeLogDir(_)));
    }

    #[test]
    fn db_path_resolves_without_log_validation() {
        let pairs = [(DB_PATH_ENV, " /data/habits.sqlite3 "), (LOG_LEVEL_ENV, "verbose")];
        assert!(StreakConfig::from_lookup(lookup(&pairs)).is_err());
        assert_eq!(
            StreakConfig::db_path_from_lookup(lookup(&pairs)),
            PathBuf::from("/data/habits.sqlite3")
        );
        assert_eq!(
            StreakConfig::db_path_from_lookup(lookup(&[(DB_PATH_ENV, "  ")])),
            StreakConfig::default().db_path
        );
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = StreakConfig::from_lookup(lookup(&[(DB_PATH_ENV, "   ")])).unwrap();
        assert_eq!(config.db_path, StreakConfig::default().db_path);
    }
}

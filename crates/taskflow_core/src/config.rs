//! Runtime configuration resolved from environment variables.
//!
//! # Invariants
//! - Resolution never fails; unset, blank, or invalid values use defaults.
//! - Relative log directories are ignored because logging requires
//!   absolute paths.

use crate::logging::{default_log_level, normalize_level};
use log::warn;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "TASKFLOW_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "TASKFLOW_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TASKFLOW_LOG_DIR";
pub const ENV_UNDO_WINDOW_MS: &str = "TASKFLOW_UNDO_WINDOW_MS";

pub const DEFAULT_DB_FILE_NAME: &str = "taskflow.sqlite3";
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_millis(4_000);

/// Upper bound for the undo window; longer values are clamped.
const MAX_UNDO_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    /// `None` leaves file logging to the host, which passes its own directory.
    pub log_dir: Option<PathBuf>,
    pub undo_window: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
            undo_window: DEFAULT_UNDO_WINDOW,
        }
    }
}

impl AppConfig {
    /// Resolves configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`, one call per variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(raw) => normalize_level(&raw).unwrap_or_else(|err| {
                warn!("event=config_load module=config status=fallback key={ENV_LOG_LEVEL} error={err}");
                defaults.log_level
            }),
            None => defaults.log_level,
        };

        let log_dir = read(ENV_LOG_DIR)
            .map(PathBuf::from)
            .filter(|path| path.is_absolute());

        let undo_window = match read(ENV_UNDO_WINDOW_MS) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms).min(MAX_UNDO_WINDOW),
                Err(_) => {
                    warn!("event=config_load module=config status=fallback key={ENV_UNDO_WINDOW_MS}");
                    defaults.undo_window
                }
            },
            None => defaults.undo_window,
        };

        Self {
            db_path,
            log_level,
            log_dir,
            undo_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AppConfig, DEFAULT_UNDO_WINDOW, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL, ENV_UNDO_WINDOW_MS,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, " /data/tasks.db "),
            (ENV_LOG_LEVEL, "WARNING"),
            (ENV_LOG_DIR, "/var/log/taskflow"),
            (ENV_UNDO_WINDOW_MS, "2500"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/data/tasks.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/taskflow")));
        assert_eq!(config.undo_window, Duration::from_millis(2_500));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_LOG_LEVEL, "verbose"),
            (ENV_LOG_DIR, "relative/logs"),
            (ENV_UNDO_WINDOW_MS, "soon"),
        ]));
        assert_eq!(config.log_level, AppConfig::default().log_level);
        assert_eq!(config.log_dir, None);
        assert_eq!(config.undo_window, DEFAULT_UNDO_WINDOW);
    }

    #[test]
    fn undo_window_is_clamped() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_UNDO_WINDOW_MS, "999999999")]));
        assert_eq!(config.undo_window, Duration::from_secs(60));
    }
}

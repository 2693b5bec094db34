//! Environment-driven core configuration.
//!
//! # Responsibility
//! - Resolve database path and logging settings for hosts that embed core.
//!
//! # Invariants
//! - Blank environment values fall back to defaults.
//! - Resolution never fails; validation of the log directory happens in
//!   `logging::init_logging`.

use crate::logging::default_log_level;
use std::path::PathBuf;

/// Overrides the database file location.
pub const ENV_DB_PATH: &str = "CONTACTNOTE_DB_PATH";
/// Overrides the log level (`trace|debug|info|warn|error`).
pub const ENV_LOG_LEVEL: &str = "CONTACTNOTE_LOG_LEVEL";
/// Enables file logging into this absolute directory.
pub const ENV_LOG_DIR: &str = "CONTACTNOTE_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "contactnote.sqlite3";

/// Resolved settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// `None` leaves file logging disabled.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            db_path: non_blank(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: non_blank(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: non_blank(ENV_LOG_DIR).map(PathBuf::from),
        }
    }
}

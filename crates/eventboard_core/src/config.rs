//! Environment-driven runtime configuration.
//!
//! # Invariants
//! - `EVENTBOARD_DB_URI` is mandatory; a missing or blank value is fatal and
//!   must stop the process before it serves traffic.
//! - Optional values that are blank are treated as unset.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DB_URI_ENV: &str = "EVENTBOARD_DB_URI";
pub const LOG_LEVEL_ENV: &str = "EVENTBOARD_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "EVENTBOARD_LOG_DIR";

/// Fatal configuration problem detected at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingVar(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVar(name) => write!(
                f,
                "environment variable `{name}` must be set (for example in .env)"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Process configuration resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backing-store address: a SQLite file path or `:memory:`.
    pub db_uri: String,
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files; stderr when unset.
    pub log_dir: Option<String>,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Ok(Self {
            db_uri: non_blank(DB_URI_ENV).ok_or(ConfigError::MissingVar(DB_URI_ENV))?,
            log_level: non_blank(LOG_LEVEL_ENV),
            log_dir: non_blank(LOG_DIR_ENV),
        })
    }
}

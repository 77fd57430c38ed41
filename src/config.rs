//! # Application Configuration
//!
//! Configuration is read once at startup from environment variables, after
//! an optional `.env` file has been loaded with `dotenvy`, and handed to
//! constructors explicitly. Nothing reads the environment after boot.
//!
//! ## Environment Variables
//!
//! | Variable          | Required | Default        | Meaning                                      |
//! |-------------------|----------|----------------|----------------------------------------------|
//! | `APP_ENV`         | yes      |                | `production` / `development` (error detail)  |
//! | `APP_BASEHREF`    | no       | empty          | prefix applied to every declared route       |
//! | `APP_ADDR`        | no       | `0.0.0.0:8080` | listen address for `serve`                   |
//! | `APP_WORKERS`     | no       | `4`            | worker threads for `serve`                   |
//! | `APP_GUARD_TOKEN` | no       |                | token expected by the `token_guard` guard    |
//! | `APP_LOG_LEVEL`   | no       | by `APP_ENV`   | `trace`..`error` or an `EnvFilter` directive |
//! | `APP_LOG_FORMAT`  | no       | by `APP_ENV`   | `json` or `pretty`                           |

use std::path::Path;

use thiserror::Error;

use crate::error_page::ErrorMode;
use crate::logging::{LogConfig, LogFormat};

/// Default listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
/// Default worker thread count.
pub const DEFAULT_WORKERS: usize = 4;

/// Configuration problems found at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank
    #[error("required environment variable {0} is missing or empty")]
    Missing(&'static str),
    /// A variable has a value that cannot be used
    #[error("environment variable {name} has invalid value `{value}`: {reason}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Process-wide settings, built once and passed by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Development or production behavior
    pub mode: ErrorMode,
    /// Prefix for all routes, e.g. `/app`
    pub base_href: String,
    /// Listen address
    pub addr: String,
    /// Worker threads serving requests
    pub workers: usize,
    /// Expected `authorization` value for the token guard
    pub guard_token: Option<String>,
    /// Logging settings
    pub log: LogConfig,
}

impl AppConfig {
    /// Load `.env` from `dir` if present, then read the environment.
    ///
    /// Variables already set in the process environment take precedence
    /// over the file.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for missing or invalid variables.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        // A missing .env is fine; the environment may be set by the host
        dotenvy::from_path(dir.join(".env")).ok();
        Self::from_env()
    }

    /// Read the process environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for missing or invalid variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; used by tests.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for missing or invalid variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let env = get("APP_ENV").ok_or(ConfigError::Missing("APP_ENV"))?;
        let mode: ErrorMode = env.parse().map_err(|reason| ConfigError::Invalid {
            name: "APP_ENV",
            value: env.clone(),
            reason,
        })?;

        let workers = match get("APP_WORKERS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "APP_WORKERS",
                        value: raw,
                        reason: "expected a positive integer".to_string(),
                    })
                }
            },
            None => DEFAULT_WORKERS,
        };

        let mut log = match mode {
            ErrorMode::Development => LogConfig::default_dev(),
            ErrorMode::Production => LogConfig::default_prod(),
        };
        if let Some(level) = get("APP_LOG_LEVEL") {
            log.log_level = level;
        }
        if let Some(format) = get("APP_LOG_FORMAT") {
            log.format = LogFormat::parse(&format);
        }

        Ok(Self {
            mode,
            base_href: get("APP_BASEHREF").unwrap_or_default(),
            addr: get("APP_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            workers,
            guard_token: get("APP_GUARD_TOKEN"),
            log,
        })
    }

    /// Whether responses may carry diagnostic detail.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.mode == ErrorMode::Development
    }
}

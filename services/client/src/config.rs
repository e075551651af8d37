//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;

use session_core::token_clock::DEFAULT_SESSION_LIFETIME_HOURS;
use session_core::{HydrationPolicy, StoreSettings};
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub state_path: PathBuf,
    pub log_level: Level,
    pub session_lifetime_hours: i64,
    pub request_timeout: Duration,
    pub verify_on_hydrate: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test builds so tests stay hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("API_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8190".to_string())
            .trim_end_matches('/')
            .to_string();
        if api_base_url.is_empty() {
            return Err(ConfigError::MissingVar("API_BASE_URL".to_string()));
        }

        let state_path = lookup("SESSION_STATE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.session/auth.json"));

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let session_lifetime_hours = match lookup("SESSION_LIFETIME_HOURS") {
            None => DEFAULT_SESSION_LIFETIME_HOURS,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "SESSION_LIFETIME_HOURS".to_string(),
                        format!("'{}' is not a positive number of hours", raw),
                    )
                })?,
        };

        let timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            None => 15,
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
        };

        let verify_on_hydrate = match lookup("VERIFY_ON_HYDRATE").as_deref() {
            None => false,
            Some("1") | Some("true") | Some("yes") => true,
            Some("0") | Some("false") | Some("no") => false,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "VERIFY_ON_HYDRATE".to_string(),
                    format!("'{}' is not a boolean", other),
                ))
            }
        };

        Ok(Self {
            api_base_url,
            state_path,
            log_level,
            session_lifetime_hours,
            request_timeout: Duration::from_secs(timeout_secs),
            verify_on_hydrate,
        })
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            session_lifetime: chrono::Duration::hours(self.session_lifetime_hours),
            hydration: if self.verify_on_hydrate {
                HydrationPolicy::Online
            } else {
                HydrationPolicy::Offline
            },
        }
    }
}

//! services/app/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

use crate::intake::IntakeTiming;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub data_dir: PathBuf,
    pub api_base_url: Option<String>,
    pub log_level: Level,
    pub typing_delay: Duration,
    pub completion_delay: Duration,
    pub finish_delay: Duration,
    pub animal_cache_ttl: Duration,
    pub verify_passwords: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Storage and remote API ---
        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let api_base_url = lookup("API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Intake presentation timing ---
        let typing_delay = Duration::from_millis(parse_or(&lookup, "TYPING_DELAY_MS", 1000)?);
        let completion_delay =
            Duration::from_millis(parse_or(&lookup, "COMPLETION_DELAY_MS", 1000)?);
        let finish_delay = Duration::from_millis(parse_or(&lookup, "FINISH_DELAY_MS", 1500)?);

        let animal_cache_ttl =
            Duration::from_secs(parse_or(&lookup, "ANIMAL_CACHE_TTL_SECS", 300)?);
        let verify_passwords = parse_or(&lookup, "VERIFY_PASSWORDS", false)?;

        Ok(Self {
            data_dir,
            api_base_url,
            log_level,
            typing_delay,
            completion_delay,
            finish_delay,
            animal_cache_ttl,
            verify_passwords,
        })
    }

    pub fn intake_timing(&self) -> IntakeTiming {
        IntakeTiming {
            typing: self.typing_delay,
            completion: self.completion_delay,
            finish: self.finish_delay,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
    }
}

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::stats::AssembleOptions;
use crate::streak::CALENDAR_SPAN_DAYS;

const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ACCESS_TOKEN environment variable not set")]
    MissingToken,

    #[error("USER_NAME environment variable not set")]
    MissingUser,

    #[error("{name} must be a non-negative integer in range, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub token: String,
    pub username: String,
    pub api_url: String,
    pub output_dir: PathBuf,
    /// Streak reported when every streak source fails.
    pub streak_fallback: u32,
    pub commit_delay: Duration,
}

impl Config {
    /// Read configuration from the process environment, loading `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = non_empty("ACCESS_TOKEN").ok_or(ConfigError::MissingToken)?;
        let username = non_empty("USER_NAME").ok_or(ConfigError::MissingUser)?;

        let number = |name: &'static str, default: u64| match non_empty(name) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { name, value }),
        };

        let streak_fallback = number("STREAK_FALLBACK", 0)?;
        let streak_fallback = u32::try_from(streak_fallback)
            .ok()
            .filter(|days| i64::from(*days) <= CALENDAR_SPAN_DAYS)
            .ok_or_else(|| ConfigError::InvalidNumber {
                name: "STREAK_FALLBACK",
                value: streak_fallback.to_string(),
            })?;

        Ok(Config {
            token,
            username: username.trim().to_string(),
            api_url: non_empty("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            output_dir: non_empty("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            streak_fallback,
            commit_delay: Duration::from_millis(number("COMMIT_FALLBACK_DELAY_MS", 100)?),
        })
    }

    pub fn assemble_options(&self) -> AssembleOptions {
        AssembleOptions {
            streak_fallback: self.streak_fallback,
            commit_delay: self.commit_delay,
        }
    }
}

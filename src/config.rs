use std::env;

use crate::error::AppError;
use crate::seed::MetricsMode;

/// Application configuration read from environment variables.
///
/// `.env` is loaded by the binaries (via `dotenvy`) before this runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Path to the redb database file (`DATABASE_URL`, default `data.db`).
    pub database_url: String,
    /// HTTP port (`PORT`, default 8080).
    pub port: u16,
    /// Initial counters for seeded rules (`SEED_MODE`, default `production`).
    pub seed_mode: MetricsMode,
    /// JSON file replacing the built-in catalogue (`SEED_FILE`).
    pub seed_file: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; `from_env` uses the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "data.db".to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| AppError::Config(format!("PORT must be a port number, got `{raw}`")))?,
            None => 8080,
        };

        let seed_mode = match lookup("SEED_MODE") {
            Some(raw) => raw.parse()?,
            None => MetricsMode::Zeroed,
        };

        let seed_file = lookup("SEED_FILE").filter(|v| !v.trim().is_empty());

        Ok(Self {
            database_url,
            port,
            seed_mode,
            seed_file,
        })
    }
}

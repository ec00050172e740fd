//! Application configuration.
//!
//! Configuration is read from environment variables, optionally seeded from
//! a `.env` file in the working directory:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | DATABASE_URL | postgres://localhost/studyone | PostgreSQL connection string |
//! | DATA_DIR | ./data | Root of the markdown content backend |
//! | FETCH_TIMEOUT_SECS | 10 | Webpage fetch timeout |
//! | FETCH_USER_AGENT | desktop Chrome | User-Agent for webpage fetches |
//! | MAX_FOLDER_DEPTH | 64 | Maximum folder nesting |
//! | DB_MAX_CONNECTIONS | 10 | Connection pool size |
//! | DB_ACQUIRE_TIMEOUT_SECS | 30 | Wait for a pooled connection |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::defaults;
use crate::error::{Error, Result};

/// Runtime configuration shared by the binaries.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub data_dir: PathBuf,
    pub fetch_timeout: Duration,
    pub fetch_user_agent: String,
    pub max_folder_depth: usize,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::DATABASE_URL.to_string(),
            data_dir: PathBuf::from(defaults::DATA_DIR),
            fetch_timeout: Duration::from_secs(defaults::FETCH_TIMEOUT_SECS),
            fetch_user_agent: defaults::FETCH_USER_AGENT.to_string(),
            max_folder_depth: defaults::MAX_FOLDER_DEPTH,
            db_max_connections: defaults::DB_MAX_CONNECTIONS,
            db_acquire_timeout: Duration::from_secs(defaults::DB_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Load `.env` (if present) and then read the environment.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_env()
    }

    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(dir) = lookup("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "FETCH_TIMEOUT_SECS")? {
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(agent) = lookup("FETCH_USER_AGENT") {
            config.fetch_user_agent = agent;
        }
        if let Some(depth) = parse_var::<usize>(&lookup, "MAX_FOLDER_DEPTH")? {
            config.max_folder_depth = depth;
        }
        if let Some(n) = parse_var::<u32>(&lookup, "DB_MAX_CONNECTIONS")? {
            config.db_max_connections = n;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "DB_ACQUIRE_TIMEOUT_SECS")? {
            config.db_acquire_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the services unusable.
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(Error::Config("DATABASE_URL must not be empty".to_string()));
        }
        if self.fetch_timeout.is_zero() {
            return Err(Error::Config(
                "FETCH_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        if self.max_folder_depth == 0 {
            return Err(Error::Config(
                "MAX_FOLDER_DEPTH must be greater than zero".to_string(),
            ));
        }
        if self.db_max_connections == 0 {
            return Err(Error::Config(
                "DB_MAX_CONNECTIONS must be greater than zero".to_string(),
            ));
        }
        if self.db_acquire_timeout.is_zero() {
            return Err(Error::Config(
                "DB_ACQUIRE_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{} has invalid value '{}': {}", key, raw, e))),
    }
}

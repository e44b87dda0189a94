//! Database configuration
//!
//! There is no built-in connection string: the URL comes from the caller,
//! the environment (`DATABASE_URL`) or a TOML file, and is required.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use sqlx::ConnectOptions;

use crate::error::{DbError, Result};

/// Default maximum connections for the pool.
/// Kept low for single-user tooling.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default time to wait for a pooled connection.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

const ENV_DATABASE_URL: &str = "DATABASE_URL";
const ENV_MAX_CONNECTIONS: &str = "USERDB_MAX_CONNECTIONS";
const ENV_ACQUIRE_TIMEOUT: &str = "USERDB_ACQUIRE_TIMEOUT_SECS";
const ENV_APPLICATION_NAME: &str = "USERDB_APPLICATION_NAME";
const ENV_LOG_STATEMENTS: &str = "USERDB_LOG_STATEMENTS";

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_acquire_timeout_secs() -> u64 {
    DEFAULT_ACQUIRE_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

/// Connection settings for [`PgDataSource`](crate::db::PgDataSource)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Reported to the server as `application_name`
    #[serde(default)]
    pub application_name: Option<String>,

    /// Let sqlx log executed statements through `tracing`
    #[serde(default = "default_true")]
    pub log_statements: bool,
}

impl DbConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            application_name: None,
            log_statements: true,
        }
    }

    /// Load from process environment.
    ///
    /// `DATABASE_URL` is required. Optional overrides:
    /// `USERDB_MAX_CONNECTIONS`, `USERDB_ACQUIRE_TIMEOUT_SECS`,
    /// `USERDB_APPLICATION_NAME`, `USERDB_LOG_STATEMENTS`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(ENV_DATABASE_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| DbError::config(format!("{ENV_DATABASE_URL} not set")))?;

        let mut config = Self::new(database_url);

        if let Some(raw) = lookup(ENV_MAX_CONNECTIONS) {
            config.max_connections = parse_var(ENV_MAX_CONNECTIONS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ACQUIRE_TIMEOUT) {
            config.acquire_timeout_secs = parse_var(ENV_ACQUIRE_TIMEOUT, &raw)?;
        }
        if let Some(name) = lookup(ENV_APPLICATION_NAME) {
            config.application_name = Some(name);
        }
        if let Some(raw) = lookup(ENV_LOG_STATEMENTS) {
            config.log_statements = parse_var(ENV_LOG_STATEMENTS, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document.
    ///
    /// ```toml
    /// database_url = "postgres://localhost/users"
    /// max_connections = 10
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| DbError::config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DbError::config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(DbError::config("database_url cannot be empty"));
        }
        if self.max_connections == 0 {
            return Err(DbError::config("max_connections must be at least 1"));
        }
        Ok(())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Build sqlx connect options from the URL plus overrides.
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        let mut options = PgConnectOptions::from_str(&self.database_url)
            .map_err(|e| DbError::config(format!("invalid database_url: {e}")))?;

        if let Some(name) = &self.application_name {
            options = options.application_name(name);
        }
        if !self.log_statements {
            options = options.disable_statement_logging();
        }

        Ok(options)
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| DbError::config(format!("invalid value for {key}: '{raw}'")))
}

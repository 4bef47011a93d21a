//! Backend configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CRUSTLINE_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `CRUSTLINE_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `CRUSTLINE_DB_ACQUIRE_TIMEOUT_SECS` - Seconds to wait for a connection (default: 10)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::db::DEFAULT_ACQUIRE_TIMEOUT;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Backing-store connection settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// `PostgreSQL` database connection URL (may contain a password)
    pub database_url: SecretString,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a numeric
    /// setting does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("CRUSTLINE_DATABASE_URL")?;
        Self::from_url(database_url)
    }

    /// Configuration for a local server addressed the way the legacy
    /// terminal was launched: database name, port and user.
    ///
    /// Pool settings still come from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a numeric setting does not parse.
    pub fn for_local(dbname: &str, port: u16, user: &str) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let url = format!("postgres://{user}@localhost:{port}/{dbname}");
        Self::from_url(SecretString::from(url))
    }

    /// Configuration for an explicit connection URL.
    ///
    /// Pool settings still come from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a numeric setting does not parse.
    pub fn from_url(database_url: SecretString) -> Result<Self, ConfigError> {
        let max_connections = parse_env_or(
            "CRUSTLINE_DB_MAX_CONNECTIONS",
            DEFAULT_MAX_CONNECTIONS,
        )?;
        let acquire_timeout = get_optional_env("CRUSTLINE_DB_ACQUIRE_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "CRUSTLINE_DB_ACQUIRE_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT);

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse an optional environment variable, using `default` when unset.
fn parse_env_or(key: &str, default: u32) -> Result<u32, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |raw| parse_count(key, &raw))
}

fn parse_count(key: &str, raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be at least 1".to_string(),
        )),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_parse_count_valid() {
        assert_eq!(parse_count("K", " 4 ").unwrap(), 4);
    }

    #[test]
    fn test_parse_count_rejects_zero() {
        let err = parse_count("K", "0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "K"));
    }

    #[test]
    fn test_parse_count_rejects_text() {
        assert!(parse_count("K", "many").is_err());
    }

    #[test]
    fn test_for_local_builds_url() {
        let config = BackendConfig::for_local("pizza_db", 5432, "chef").unwrap();
        assert_eq!(
            config.database_url.expose_secret(),
            "postgres://chef@localhost:5432/pizza_db"
        );
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = BackendConfig {
            database_url: SecretString::from("postgres://u:hunter2@db/x"),
            max_connections: 2,
            acquire_timeout: Duration::from_secs(1),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }
}

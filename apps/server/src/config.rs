//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults suitable for a single-pharmacy deployment.

use std::env;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Batches expiring within this many days show up in the stock report
    pub expiry_warning_days: i64,

    /// Row cap for recent-sales and notification listings
    pub list_limit: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ServerConfig {
            http_port: env::var("APOTEK_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("APOTEK_PORT".to_string()))?,

            database_path: env::var("APOTEK_DB")
                .unwrap_or_else(|_| "apotek.db".to_string())
                .into(),

            expiry_warning_days: env::var("APOTEK_EXPIRY_WARNING_DAYS")
                .unwrap_or_else(|_| apotek_core::EXPIRY_WARNING_DAYS.to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("APOTEK_EXPIRY_WARNING_DAYS".to_string())
                })?,

            list_limit: env::var("APOTEK_LIST_LIMIT")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("APOTEK_LIST_LIMIT".to_string()))?,
        };

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Env vars unset in the test runner
        let config = ServerConfig::load().unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.database_path, PathBuf::from("apotek.db"));
        assert_eq!(config.list_limit, 50);
    }
}

//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::i18n::Locale;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Connection pool size
    pub db_max_connections: u32,

    /// Locale for error messages when `Accept-Language` names none we support
    pub default_locale: Locale,

    /// Requests running longer than this are answered with 408
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_port: 8080,
            database_path: PathBuf::from("./data/kardex.db"),
            db_max_connections: 5,
            default_locale: Locale::En,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            http_port: parse_var("KARDEX_HTTP_PORT", defaults.http_port)?,

            database_path: env::var("KARDEX_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            db_max_connections: parse_var(
                "KARDEX_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,

            default_locale: match env::var("KARDEX_DEFAULT_LOCALE") {
                Ok(value) => Locale::parse(&value)
                    .ok_or_else(|| ConfigError::InvalidValue("KARDEX_DEFAULT_LOCALE".to_string()))?,
                Err(_) => defaults.default_locale,
            },

            request_timeout: Duration::from_secs(parse_var(
                "KARDEX_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("KARDEX_DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
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
        let config = ApiConfig::default();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.default_locale, Locale::En);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_var_falls_back_when_unset() {
        let port: u16 = parse_var("KARDEX_TEST_UNSET_VARIABLE", 9090).unwrap();
        assert_eq!(port, 9090);
    }
}

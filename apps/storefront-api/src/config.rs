//! Storefront API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable              | Default          |
//! |-----------------------|------------------|
//! | `PORT`                | `3000`           |
//! | `BIND_ADDR`           | `0.0.0.0`        |
//! | `DATABASE_PATH`       | `storefront.db`  |
//! | `DB_MAX_CONNECTIONS`  | `5`              |
//! | `DB_BUSY_TIMEOUT_MS`  | `5000`           |
//! | `JWT_SECRET`          | dev secret (required in production) |
//! | `JWT_EXPIRES_IN_SECS` | `604800` (7 days)|
//! | `APP_ENV`             | `development`    |
//! | `ARGON2_MEMORY_KIB`   | `19456`          |
//! | `ARGON2_ITERATIONS`   | `2`              |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use storefront_db::DbConfig;

const DEV_JWT_SECRET: &str = "storefront-dev-secret-change-in-production";

/// Deployment environment. Controls how much error detail clients see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl FromStr for AppEnv {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "production" | "prod" => Ok(AppEnv::Production),
            _ => Err(ConfigError::InvalidValue("APP_ENV".to_string())),
        }
    }
}

/// Storefront API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP port
    pub port: u16,

    /// Interface to bind
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// How long writers wait for the SQLite write lock
    pub db_busy_timeout: Duration,

    /// HS256 signing secret
    pub jwt_secret: String,

    /// Bearer token lifetime in seconds
    pub jwt_expires_in_secs: i64,

    pub app_env: AppEnv,

    /// argon2 memory cost
    pub argon2_memory_kib: u32,

    /// argon2 time cost
    pub argon2_iterations: u32,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = match lookup("APP_ENV") {
            Some(v) => v.parse()?,
            None => AppEnv::Development,
        };

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None if app_env == AppEnv::Production => {
                return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()))
            }
            None => DEV_JWT_SECRET.to_string(),
        };

        let config = ApiConfig {
            port: parse_or(&lookup, "PORT", 3000)?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("storefront.db")),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            db_busy_timeout: Duration::from_millis(parse_or(&lookup, "DB_BUSY_TIMEOUT_MS", 5000)?),
            jwt_secret,
            jwt_expires_in_secs: parse_or(&lookup, "JWT_EXPIRES_IN_SECS", 604_800)?,
            app_env,
            argon2_memory_kib: parse_or(&lookup, "ARGON2_MEMORY_KIB", 19_456)?,
            argon2_iterations: parse_or(&lookup, "ARGON2_ITERATIONS", 2)?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.jwt_expires_in_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_EXPIRES_IN_SECS".to_string()));
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.app_env == AppEnv::Development
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Pool settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.db_max_connections)
            .busy_timeout(self.db_busy_timeout)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.database_path, PathBuf::from("storefront.db"));
        assert_eq!(config.db_busy_timeout, Duration::from_millis(5000));
        assert_eq!(config.jwt_expires_in_secs, 604_800);
        assert!(config.is_development());
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("DATABASE_PATH", "/var/lib/shop.db"),
            ("DB_BUSY_TIMEOUT_MS", "250"),
            ("APP_ENV", "production"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.db_config().busy_timeout, Duration::from_millis(250));
        assert_eq!(config.app_env, AppEnv::Production);
        assert_eq!(config.jwt_secret, "s3cret");
    }

    #[test]
    fn test_production_requires_secret() {
        let err = ApiConfig::from_lookup(lookup_from(&[("APP_ENV", "production")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref k) if k == "JWT_SECRET"));
    }

    #[test]
    fn test_invalid_numbers() {
        let err = ApiConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref k) if k == "PORT"));

        assert!(ApiConfig::from_lookup(lookup_from(&[("DB_MAX_CONNECTIONS", "0")])).is_err());
        assert!(ApiConfig::from_lookup(lookup_from(&[("APP_ENV", "staging")])).is_err());
    }
}

//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use postboard_infra::{DatabaseConfig, JwtConfig};

use crate::telemetry::TelemetryConfig;

/// Parse a variable, ignoring values that do not fit `T`.
fn parsed<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    var(key).and_then(|s| s.parse().ok())
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on in-memory repositories.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub telemetry: TelemetryConfig,
    pub production: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let database = var("DATABASE_URL").map(|url| {
            let defaults = DatabaseConfig::new(url);
            DatabaseConfig {
                max_connections: parsed(&var, "DB_MAX_CONNECTIONS")
                    .unwrap_or(defaults.max_connections),
                min_connections: parsed(&var, "DB_MIN_CONNECTIONS")
                    .unwrap_or(defaults.min_connections),
                connect_timeout: parsed(&var, "DB_CONNECT_TIMEOUT_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.connect_timeout),
                sqlx_logging: var("DB_SQL_LOGGING")
                    .map(|v| v != "false" && v != "0")
                    .unwrap_or(defaults.sqlx_logging),
                ..defaults
            }
        });

        let jwt_defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: var("JWT_SECRET").unwrap_or(jwt_defaults.secret),
            expiration_hours: var("JWT_EXPIRATION_HOURS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(jwt_defaults.expiration_hours),
            issuer: var("JWT_ISSUER").unwrap_or(jwt_defaults.issuer),
        };

        Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database,
            jwt,
            telemetry: TelemetryConfig::from_lookup(&var),
            production: var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false),
        }
    }

    /// Emit warnings for settings that are unsafe to deploy with.
    pub fn warn_insecure_defaults(&self) {
        if self.jwt.uses_default_secret() {
            if self.production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(config.database.is_none());
        assert_eq!(config.jwt, JwtConfig::default());
        assert!(!config.production);
        assert!(!config.telemetry.json_logs);
    }

    #[test]
    fn test_database_settings() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/postboard"),
            ("DB_MAX_CONNECTIONS", "50"),
            ("DB_SQL_LOGGING", "false"),
        ]);

        let db = config.database.unwrap();
        assert_eq!(db.url, "postgres://localhost/postboard");
        assert_eq!(db.max_connections, 50);
        assert_eq!(db.min_connections, 2);
        assert!(!db.sqlx_logging);
    }

    #[test]
    fn test_pool_sizes_out_of_range_fall_back() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/postboard"),
            ("DB_MAX_CONNECTIONS", "4294967296"),
            ("DB_MIN_CONNECTIONS", "-1"),
        ]);

        let db = config.database.unwrap();
        assert_eq!(db.max_connections, 20);
        assert_eq!(db.min_connections, 2);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRATION_HOURS", "2"),
            ("RUST_ENV", "production"),
            ("LOG_FORMAT", "JSON"),
        ]);

        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt.secret, "s3cret");
        assert_eq!(config.jwt.expiration_hours, 2);
        assert!(config.production);
        assert!(config.telemetry.json_logs);
    }
}

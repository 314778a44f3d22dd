// Application configuration loaded from the environment at startup

use thiserror::Error;

/// Errors raised while loading configuration.
/// A missing signing secret is fatal at startup, never a per-request error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {message}")]
    InvalidVar { var: &'static str, message: String },
}

/// Token signing configuration.
///
/// Access and refresh tokens are signed with independent secrets so that
/// possession of one token cannot be used to forge the other.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

/// Default access-token lifetime: 5 minutes.
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 300;
/// Default refresh-token lifetime: 30 days.
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 30 * 24 * 60 * 60;

impl AuthConfig {
    /// Load signing secrets and TTLs from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let access_secret = require_var("JWT_ACCESS_SECRET")?;
        let refresh_secret = require_var("JWT_REFRESH_SECRET")?;

        if access_secret == refresh_secret {
            return Err(ConfigError::InvalidVar {
                var: "JWT_REFRESH_SECRET",
                message: "refresh secret must differ from access secret".to_string(),
            });
        }

        Ok(Self {
            access_secret,
            refresh_secret,
            access_token_ttl_secs: optional_secs("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)?,
            refresh_token_ttl_secs: optional_secs(
                "REFRESH_TOKEN_TTL_SECS",
                DEFAULT_REFRESH_TTL_SECS,
            )?,
        })
    }
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: String,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: require_var("DATABASE_URL")?,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT").unwrap_or_else(|_| "8080".to_string()),
            auth: AuthConfig::from_env()?,
        })
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn optional_secs(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.parse::<i64>().map_err(|e| ConfigError::InvalidVar {
            var: name,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

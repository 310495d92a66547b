//! Configuration Module
//!
//! Centralized configuration management for the library service. Every value
//! is read from the environment (optionally seeded from a `.env` file by the
//! binaries) once at startup and then passed explicitly to the components
//! that need it.

use thiserror::Error;

use crate::database::DatabaseConfig;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("Required environment variable {0} is not set")]
    MissingVariable(String),

    /// A value is present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Environment variable helpers
pub mod env {
    use super::ConfigError;
    use std::env;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get environment variable as boolean with default
    pub fn get_bool(key: &str, default: bool) -> bool {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u32 with default
    pub fn get_u32(key: &str, default: u32) -> u32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u16 with default
    pub fn get_u16(key: &str, default: u16) -> u16 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u64 with default
    pub fn get_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as i64 with default
    pub fn get_i64(key: &str, default: i64) -> i64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get an optional, non-empty environment variable
    pub fn get_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    /// Check if environment variable is set
    pub fn is_set(key: &str) -> bool {
        env::var(key).is_ok()
    }

    /// Get required environment variable
    pub fn get_required(key: &str) -> Result<String, ConfigError> {
        get_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
    }
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,

    /// Absent when `DATABASE_URL` is not set; the in-memory store is used instead
    pub database: Option<DatabaseConfig>,

    pub jwt: JwtConfig,

    /// Absent when `SMTP_HOST` is not set; mail is logged instead of delivered
    pub email: Option<EmailConfig>,

    pub auth: AuthConfig,

    pub cookies: CookieConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// JWT configuration
///
/// Secrets have no fallback: a missing secret is a startup error.
#[derive(Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expires_hours: i64,
    pub refresh_token_expires_days: i64,
    pub verification_token_expires_minutes: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_token_expires_hours", &self.access_token_expires_hours)
            .field("refresh_token_expires_days", &self.refresh_token_expires_days)
            .field(
                "verification_token_expires_minutes",
                &self.verification_token_expires_minutes,
            )
            .finish()
    }
}

/// Email service configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_name: String,
    pub from_email: String,
}

/// Account flow settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Public base URL used to build verification links
    pub app_base_url: String,

    /// Reject logins from accounts whose email is not verified yet
    pub require_verified_email: bool,
}

/// Settings applied to the token cookies
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub secure: bool,
    pub domain: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::get_string("SERVER_HOST", "0.0.0.0"),
            port: env::get_u16("SERVER_PORT", 3000),
            cors_origins: env::get_string("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// Longest accepted access token lifetime (30 days)
const MAX_ACCESS_TOKEN_HOURS: i64 = 24 * 30;
/// Longest accepted refresh token lifetime
const MAX_REFRESH_TOKEN_DAYS: i64 = 365;
/// Longest accepted verification link lifetime (7 days)
const MAX_VERIFICATION_TOKEN_MINUTES: i64 = 7 * 24 * 60;

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            access_secret: env::get_required("JWT_ACCESS_SECRET")?,
            refresh_secret: env::get_required("JWT_REFRESH_SECRET")?,
            access_token_expires_hours: env::get_i64("JWT_ACCESS_EXPIRES_HOURS", 24),
            refresh_token_expires_days: env::get_i64("JWT_REFRESH_EXPIRES_DAYS", 7),
            verification_token_expires_minutes: env::get_i64(
                "EMAIL_VERIFICATION_EXPIRES_MINUTES",
                60,
            ),
        })
    }

    /// Build a config from explicit secrets with the default lifetimes
    pub fn with_secrets(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_token_expires_hours: 24,
            refresh_token_expires_days: 7,
            verification_token_expires_minutes: 60,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.is_empty() {
            return Err(ConfigError::Invalid("JWT access secret cannot be empty".into()));
        }

        if self.refresh_secret.is_empty() {
            return Err(ConfigError::Invalid("JWT refresh secret cannot be empty".into()));
        }

        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::Invalid(
                "JWT access and refresh secrets must be different".into(),
            ));
        }

        if self.access_token_expires_hours <= 0
            || self.refresh_token_expires_days <= 0
            || self.verification_token_expires_minutes <= 0
        {
            return Err(ConfigError::Invalid("Token lifetimes must be positive".into()));
        }

        if self.access_token_expires_hours > MAX_ACCESS_TOKEN_HOURS {
            return Err(ConfigError::Invalid(format!(
                "JWT_ACCESS_EXPIRES_HOURS cannot exceed {}",
                MAX_ACCESS_TOKEN_HOURS
            )));
        }
        if self.refresh_token_expires_days > MAX_REFRESH_TOKEN_DAYS {
            return Err(ConfigError::Invalid(format!(
                "JWT_REFRESH_EXPIRES_DAYS cannot exceed {}",
                MAX_REFRESH_TOKEN_DAYS
            )));
        }
        if self.verification_token_expires_minutes > MAX_VERIFICATION_TOKEN_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "EMAIL_VERIFICATION_EXPIRES_MINUTES cannot exceed {}",
                MAX_VERIFICATION_TOKEN_MINUTES
            )));
        }

        Ok(())
    }
}

impl EmailConfig {
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        if !env::is_set("SMTP_HOST") {
            return Ok(None);
        }

        Ok(Some(Self {
            smtp_host: env::get_required("SMTP_HOST")?,
            smtp_port: env::get_u16("SMTP_PORT", 587),
            smtp_username: env::get_required("SMTP_USERNAME")?,
            smtp_password: env::get_required("SMTP_PASSWORD")?,
            from_name: env::get_string("SMTP_FROM_NAME", "Library Service"),
            from_email: env::get_required("SMTP_FROM_EMAIL")?,
        }))
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            app_base_url: env::get_string("APP_BASE_URL", "http://localhost:3000"),
            require_verified_email: env::get_bool("AUTH_REQUIRE_VERIFIED_EMAIL", false),
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secure: env::get_bool("COOKIE_SECURE", true),
            domain: env::get_optional("COOKIE_DOMAIN"),
        }
    }
}

impl AppConfig {
    /// Load complete application configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env()?,
            email: EmailConfig::from_env()?,
            auth: AuthConfig::default(),
            cookies: CookieConfig::default(),
        })
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("Server port must be greater than 0".into()));
        }

        if let Some(database) = &self.database {
            if database.max_connections == 0 {
                return Err(ConfigError::Invalid(
                    "Database max_connections must be greater than 0".into(),
                ));
            }

            if database.min_connections > database.max_connections {
                return Err(ConfigError::Invalid(
                    "Database min_connections cannot be greater than max_connections".into(),
                ));
            }
        }

        self.jwt.validate()?;

        if !self.auth.app_base_url.starts_with("http://")
            && !self.auth.app_base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(
                "APP_BASE_URL must start with http:// or https://".into(),
            ));
        }

        Ok(())
    }
}

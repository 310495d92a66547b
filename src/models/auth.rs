//! Authentication Models
//!
//! JWT claim sets, issued token pairs and the per-request user context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::{User, UserRole};

/// Discriminator stored in the `type` claim of every token
pub const ACCESS_TOKEN_TYPE: &str = "access";
pub const REFRESH_TOKEN_TYPE: &str = "refresh";
pub const EMAIL_VERIFICATION_TOKEN_TYPE: &str = "email_verification";

/// JWT token pair containing access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token for API authentication
    pub access_token: String,

    /// Long-lived refresh token for obtaining new access tokens
    pub refresh_token: String,

    /// Token type (always "Bearer" for JWT)
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Refresh token lifetime in seconds
    pub refresh_expires_in: i64,
}

impl TokenPair {
    pub fn new(
        access_token: String,
        refresh_token: String,
        expires_in: i64,
        refresh_expires_in: i64,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
            refresh_expires_in,
        }
    }
}

/// Result of a successful login or refresh
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub tokens: TokenPair,
    pub user: User,
}

/// Common accessors shared by every claim set
pub trait TokenClaims {
    /// Value the `type` claim must hold for this claim set
    const TOKEN_TYPE: &'static str;

    fn token_type(&self) -> &str;
}

/// JWT claims structure for access tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject - user ID
    pub sub: String,

    /// Role at the time of issue
    pub role: UserRole,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// JWT ID - unique token identifier
    pub jti: String,

    #[serde(rename = "type")]
    pub token_type: String,
}

impl AccessTokenClaims {
    pub fn new(
        user_id: Uuid,
        role: UserRole,
        expires_at: DateTime<Utc>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            role,
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        }
    }
}

impl TokenClaims for AccessTokenClaims {
    const TOKEN_TYPE: &'static str = ACCESS_TOKEN_TYPE;

    fn token_type(&self) -> &str {
        &self.token_type
    }
}

/// JWT claims structure for refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    /// Subject - user ID
    pub sub: String,

    pub exp: i64,
    pub iat: i64,
    pub jti: String,

    #[serde(rename = "type")]
    pub token_type: String,
}

impl RefreshTokenClaims {
    pub fn new(user_id: Uuid, expires_at: DateTime<Utc>, issued_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: REFRESH_TOKEN_TYPE.to_string(),
        }
    }

    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

impl TokenClaims for RefreshTokenClaims {
    const TOKEN_TYPE: &'static str = REFRESH_TOKEN_TYPE;

    fn token_type(&self) -> &str {
        &self.token_type
    }
}

/// JWT claims structure for email verification links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailVerificationClaims {
    /// Address being verified (normalized)
    pub email: String,

    pub exp: i64,
    pub iat: i64,

    #[serde(rename = "type")]
    pub token_type: String,
}

impl EmailVerificationClaims {
    pub fn new(email: &str, expires_at: DateTime<Utc>, issued_at: DateTime<Utc>) -> Self {
        Self {
            email: email.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            token_type: EMAIL_VERIFICATION_TOKEN_TYPE.to_string(),
        }
    }
}

impl TokenClaims for EmailVerificationClaims {
    const TOKEN_TYPE: &'static str = EMAIL_VERIFICATION_TOKEN_TYPE;

    fn token_type(&self) -> &str {
        &self.token_type
    }
}

/// User context extracted from a validated access token
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl UserContext {
    pub fn from_access_claims(claims: &AccessTokenClaims) -> Result<Self, uuid::Error> {
        Ok(Self {
            user_id: Uuid::parse_str(&claims.sub)?,
            role: claims.role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

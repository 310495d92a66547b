//! JWT Token Service
//!
//! Issues and verifies the signed tokens used by the account flows: access
//! and refresh pairs, and email verification tokens. Access and refresh
//! tokens use separate secrets. Verification tokens share the access secret
//! and are told apart by their `type` claim.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{ConfigError, JwtConfig};
use crate::models::{
    AccessTokenClaims, EmailVerificationClaims, RefreshTokenClaims, TokenClaims, TokenPair,
    UserContext, UserRole,
};

/// Token verification and issuance failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    /// Bad signature, malformed payload or wrong token type
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Well-formed but no longer the current refresh token for its user
    #[error("Token has been revoked")]
    Revoked,

    #[error("Token generation failed: {0}")]
    Generation(String),
}

/// JWT service for token issuance and validation
#[derive(Clone)]
pub struct JwtService {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    access_token_expires_in: Duration,
    refresh_token_expires_in: Duration,
    verification_token_expires_in: Duration,
}

impl JwtService {
    /// Create a new JWT service, refusing unusable secrets
    pub fn new(config: &JwtConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            access_encoding_key: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding_key: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding_key: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding_key: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_token_expires_in: Duration::hours(config.access_token_expires_hours),
            refresh_token_expires_in: Duration::days(config.refresh_token_expires_days),
            verification_token_expires_in: Duration::minutes(
                config.verification_token_expires_minutes,
            ),
        })
    }

    /// Lifetime of email verification tokens
    pub fn verification_token_ttl(&self) -> Duration {
        self.verification_token_expires_in
    }

    /// Generate a new access and refresh token pair for a user
    pub fn issue_token_pair(&self, user_id: Uuid, role: UserRole) -> Result<TokenPair, TokenError> {
        let now = Utc::now();

        let access_claims =
            AccessTokenClaims::new(user_id, role, now + self.access_token_expires_in, now);
        let access_token = Self::encode_claims(&access_claims, &self.access_encoding_key)?;

        let refresh_claims =
            RefreshTokenClaims::new(user_id, now + self.refresh_token_expires_in, now);
        let refresh_token = Self::encode_claims(&refresh_claims, &self.refresh_encoding_key)?;

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.access_token_expires_in.num_seconds(),
            self.refresh_token_expires_in.num_seconds(),
        ))
    }

    /// Generate an email verification token with the configured lifetime
    pub fn issue_verification_token(&self, email: &str) -> Result<String, TokenError> {
        self.issue_verification_token_with_ttl(email, self.verification_token_expires_in)
    }

    pub fn issue_verification_token_with_ttl(
        &self,
        email: &str,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = EmailVerificationClaims::new(email, now + ttl, now);
        Self::encode_claims(&claims, &self.access_encoding_key)
    }

    /// Validate an access token and extract user context
    pub fn verify_access_token(&self, token: &str) -> Result<UserContext, TokenError> {
        let claims: AccessTokenClaims = Self::decode_claims(token, &self.access_decoding_key)?;
        UserContext::from_access_claims(&claims)
            .map_err(|_| TokenError::Invalid("Invalid user ID in token".into()))
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshTokenClaims, TokenError> {
        Self::decode_claims(token, &self.refresh_decoding_key)
    }

    pub fn verify_verification_token(
        &self,
        token: &str,
    ) -> Result<EmailVerificationClaims, TokenError> {
        Self::decode_claims(token, &self.access_decoding_key)
    }

    fn encode_claims<C: Serialize>(claims: &C, key: &EncodingKey) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Decode a token, rejecting it past `exp` (no leeway) or when its
    /// `type` claim does not match `C`
    fn decode_claims<C>(token: &str, key: &DecodingKey) -> Result<C, TokenError>
    where
        C: TokenClaims + DeserializeOwned,
    {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        let claims = decode::<C>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })?;

        if claims.token_type() != C::TOKEN_TYPE {
            return Err(TokenError::Invalid(format!(
                "expected {} token, got {}",
                C::TOKEN_TYPE,
                claims.token_type()
            )));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new(&JwtConfig::with_secrets(
            "test_access_secret_key",
            "test_refresh_secret_key",
        ))
        .unwrap()
    }

    #[test]
    fn test_rejects_shared_or_missing_secrets() {
        assert!(JwtService::new(&JwtConfig::with_secrets("same", "same")).is_err());
        assert!(JwtService::new(&JwtConfig::with_secrets("", "refresh")).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_lifetimes() {
        let mut config = JwtConfig::with_secrets("access", "refresh");
        config.access_token_expires_hours = i64::MAX;
        assert!(JwtService::new(&config).is_err());

        let mut config = JwtConfig::with_secrets("access", "refresh");
        config.verification_token_expires_minutes = i64::MAX;
        assert!(JwtService::new(&config).is_err());
    }

    #[test]
    fn test_token_pair_round_trip() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let pair = service.issue_token_pair(user_id, UserRole::Admin).unwrap();
        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
        assert_ne!(pair.access_token, pair.refresh_token);
        assert_eq!(pair.expires_in, 24 * 3600);
        assert_eq!(pair.refresh_expires_in, 7 * 24 * 3600);

        let context = service.verify_access_token(&pair.access_token).unwrap();
        assert_eq!(context.user_id, user_id);
        assert!(context.is_admin());

        let refresh = service.verify_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(refresh.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_consecutive_pairs_differ() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let first = service.issue_token_pair(user_id, UserRole::User).unwrap();
        let second = service.issue_token_pair(user_id, UserRole::User).unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let service = create_test_service();
        let pair = service
            .issue_token_pair(Uuid::new_v4(), UserRole::User)
            .unwrap();
        let verification = service.issue_verification_token("a@x.com").unwrap();

        assert!(matches!(
            service.verify_access_token(&pair.refresh_token),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            service.verify_refresh_token(&pair.access_token),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            service.verify_verification_token(&pair.access_token),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            service.verify_access_token(&verification),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_verification_token_round_trip() {
        let service = create_test_service();
        let token = service.issue_verification_token("a@x.com").unwrap();

        let claims = service.verify_verification_token(&token).unwrap();
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_reports_expired() {
        let service = create_test_service();
        let token = service
            .issue_verification_token_with_ttl("a@x.com", Duration::seconds(-5))
            .unwrap();

        assert_eq!(
            service.verify_verification_token(&token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_foreign_signature_is_invalid() {
        let service = create_test_service();
        let other = JwtService::new(&JwtConfig::with_secrets("other_access", "other_refresh"))
            .unwrap();
        let pair = other.issue_token_pair(Uuid::new_v4(), UserRole::User).unwrap();

        assert!(matches!(
            service.verify_access_token(&pair.access_token),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            service.verify_access_token("not.a.jwt"),
            Err(TokenError::Invalid(_))
        ));
    }
}

//! Authentication Service
//!
//! Account registration, email verification and session issuance.
//!
//! A session is an access/refresh token pair. The only server-side session
//! state is the SHA-256 fingerprint of the latest refresh token, stored on
//! the user record. Refreshing requires the presented token to match that
//! fingerprint and rotates it; logging out clears it.

use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use super::email_service::{DeliveryError, EmailTemplates, Mailer};
use super::jwt::{JwtService, TokenError};
use crate::config::AuthConfig;
use crate::database::{RepositoryError, UserRepository};
use crate::models::{
    AuthSession, LoginRequest, NewUser, RegisterRequest, User, UserChanges, UserRecord, UserRole,
};
use crate::utils::error::AppError;
use crate::utils::security::{constant_time_compare, hash_token, PasswordHasher};
use crate::utils::validation::normalize_email;

/// Error types for authentication operations
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("This username is already taken")]
    DuplicateUsername,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    InvalidToken(#[from] TokenError),

    #[error("Email address has not been verified")]
    EmailNotVerified,

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(field) if field == "email" => AuthError::DuplicateEmail,
            RepositoryError::Duplicate(field) if field == "username" => {
                AuthError::DuplicateUsername
            }
            RepositoryError::NotFound => AuthError::UserNotFound,
            other => AuthError::Repository(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DuplicateEmail | AuthError::DuplicateUsername => {
                AppError::Conflict(err.to_string())
            }
            AuthError::UserNotFound => AppError::NotFound(err.to_string()),
            AuthError::InvalidCredentials => AppError::Authentication(err.to_string()),
            AuthError::InvalidToken(TokenError::Expired) => AppError::TokenExpired(err.to_string()),
            AuthError::InvalidToken(TokenError::Generation(msg)) => AppError::Internal(msg),
            AuthError::InvalidToken(_) => AppError::Authentication(err.to_string()),
            AuthError::EmailNotVerified => AppError::Forbidden(err.to_string()),
            AuthError::Delivery(e) => AppError::ExternalService(e.to_string()),
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::PasswordHash(msg) | AuthError::Task(msg) => AppError::Internal(msg),
            AuthError::Repository(e) => e.into(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication service
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt: Arc<JwtService>,
    mailer: Arc<dyn Mailer>,
    templates: EmailTemplates,
    hasher: PasswordHasher,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        jwt: Arc<JwtService>,
        mailer: Arc<dyn Mailer>,
        templates: EmailTemplates,
        hasher: PasswordHasher,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            jwt,
            mailer,
            templates,
            hasher,
            config,
        }
    }

    /// Creates a new account with the `user` role
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        request
            .validate()
            .map_err(|e| AuthError::Validation(format!("Invalid registration data: {}", e)))?;

        let email = normalize_email(&request.email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hash_password(request.password).await?;

        // A concurrent registration can still win the race; the store's
        // uniqueness violation maps to the same errors
        let record = self
            .users
            .create(NewUser {
                email,
                username: request.username,
                password_hash,
                role: UserRole::User,
            })
            .await?;

        info!("Registered user {} ({})", record.id, record.email);

        Ok(record.into())
    }

    /// Emails a verification link to the account registered under `email`
    pub async fn request_email_verification(&self, email: &str) -> AuthResult<()> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = self.jwt.issue_verification_token(&user.email)?;
        let link = format!(
            "{}/auth/verify-email?token={}",
            self.config.app_base_url.trim_end_matches('/'),
            token
        );

        let message = self.templates.verification_email(
            &user.username,
            &link,
            self.jwt.verification_token_ttl().num_minutes(),
        )?;

        self.mailer
            .send(&user.email, &message.subject, &message.html_body)
            .await?;

        info!("Verification email sent for user {}", user.id);

        Ok(())
    }

    /// Marks the address named by a verification token as verified
    ///
    /// Verifying an already verified account succeeds without changes.
    pub async fn verify_email(&self, token: &str) -> AuthResult<User> {
        let claims = self.jwt.verify_verification_token(token)?;

        let user = self
            .users
            .find_by_email(&claims.email)
            .await?
            .ok_or_else(Self::unknown_subject)?;

        if user.email_verified {
            return Ok(user.into());
        }

        let updated = self
            .users
            .update_by_id(user.id, UserChanges::verify_email())
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => Self::unknown_subject(),
                other => other.into(),
            })?;

        info!("Email verified for user {}", updated.id);

        Ok(updated.into())
    }

    /// Authenticates with email and password and starts a session
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> AuthResult<AuthSession> {
        request
            .validate()
            .map_err(|e| AuthError::Validation(format!("Invalid login data: {}", e)))?;

        let email = normalize_email(&request.email);
        let user = self.users.find_by_email(&email).await?;

        let digest = user.as_ref().map(|u| u.password_hash.clone());
        if !self.verify_password(request.password, digest).await? {
            warn!("Rejected login attempt for {}", email);
            return Err(AuthError::InvalidCredentials);
        }
        let user = user.ok_or(AuthError::InvalidCredentials)?;

        if self.config.require_verified_email && !user.email_verified {
            return Err(AuthError::EmailNotVerified);
        }

        let session = self.start_session(user).await?;
        info!("User {} logged in", session.user.id);

        Ok(session)
    }

    /// Exchanges the current refresh token for a new pair
    ///
    /// The stored fingerprint is swapped only if it still matches the
    /// presented token, so each refresh token is spent at most once and a
    /// concurrent logout cannot be undone.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        let claims = self.jwt.verify_refresh_token(refresh_token)?;
        let user_id = claims.user_id().map_err(|_| Self::unknown_subject())?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(Self::unknown_subject)?;

        let presented = hash_token(refresh_token);
        let current = matches!(
            &user.refresh_token_hash,
            Some(stored) if constant_time_compare(stored, &presented)
        );
        if !current {
            warn!("Rejected revoked refresh token for user {}", user.id);
            return Err(TokenError::Revoked.into());
        }

        let tokens = self.jwt.issue_token_pair(user.id, user.role)?;
        let Some(record) = self
            .users
            .rotate_refresh_token(user.id, &presented, &hash_token(&tokens.refresh_token))
            .await?
        else {
            warn!("Refresh token for user {} was spent concurrently", user.id);
            return Err(TokenError::Revoked.into());
        };

        debug!("Rotated refresh token for user {}", record.id);

        Ok(AuthSession {
            tokens,
            user: record.into(),
        })
    }

    /// Ends the user's session by forgetting its refresh token
    pub async fn logout(&self, user_id: Uuid) -> AuthResult<()> {
        match self
            .users
            .update_by_id(user_id, UserChanges::clear_refresh_token())
            .await
        {
            Ok(_) => {
                info!("User {} logged out", user_id);
                Ok(())
            }
            Err(RepositoryError::NotFound) => {
                debug!("Logout for unknown user {}", user_id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Issues a token pair and records the refresh token's fingerprint
    async fn start_session(&self, user: UserRecord) -> AuthResult<AuthSession> {
        let tokens = self.jwt.issue_token_pair(user.id, user.role)?;

        let record = self
            .users
            .update_by_id(
                user.id,
                UserChanges::set_refresh_token_hash(hash_token(&tokens.refresh_token)),
            )
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::InvalidCredentials,
                other => other.into(),
            })?;

        Ok(AuthSession {
            tokens,
            user: record.into(),
        })
    }

    async fn hash_password(&self, password: String) -> AuthResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Task(e.to_string()))?
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    }

    /// Verifies against `digest`, or against a dummy digest when there is no account
    async fn verify_password(&self, password: String, digest: Option<String>) -> AuthResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || match digest {
            Some(digest) => hasher.verify(&password, &digest),
            None => hasher.verify_dummy(&password),
        })
        .await
        .map_err(|e| AuthError::Task(e.to_string()))
    }

    fn unknown_subject() -> AuthError {
        AuthError::InvalidToken(TokenError::Invalid(
            "Token does not belong to an existing account".to_string(),
        ))
    }
}

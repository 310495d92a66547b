//! User Service Implementation
//!
//! Profile management for the authenticated account.

use std::sync::Arc;

use log::info;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::database::{RepositoryError, UserRepository};
use crate::models::{Address, UpdateProfileRequest, User, UserChanges};
use crate::utils::error::AppError;

/// Custom error types for the user service
#[derive(Error, Debug)]
pub enum UserServiceError {
    /// No user with the given id
    #[error("User not found")]
    UserNotFound,

    #[error("This username is already taken")]
    DuplicateUsername,

    /// Input validation failed with detailed error message
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for UserServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => UserServiceError::UserNotFound,
            RepositoryError::Duplicate(field) if field == "username" => {
                UserServiceError::DuplicateUsername
            }
            other => UserServiceError::Repository(other),
        }
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::UserNotFound => AppError::NotFound(err.to_string()),
            UserServiceError::DuplicateUsername => AppError::Conflict(err.to_string()),
            UserServiceError::ValidationError(msg) => AppError::Validation(msg),
            UserServiceError::Repository(e) => e.into(),
        }
    }
}

/// Result type for user service operations
pub type UserServiceResult<T> = Result<T, UserServiceError>;

/// User service for profile operations
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> UserServiceResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(User::from)
            .ok_or(UserServiceError::UserNotFound)
    }

    /// Applies the provided fields; absent fields are left unchanged
    ///
    /// An empty phone number clears it. A supplied address replaces the
    /// stored one entirely.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> UserServiceResult<User> {
        request
            .validate()
            .map_err(|e| UserServiceError::ValidationError(format!("Invalid profile data: {}", e)))?;

        let phone_number = request.phone_number.map(|phone| {
            let phone = phone.trim();
            (!phone.is_empty()).then(|| phone.to_string())
        });

        let changes = UserChanges {
            username: request.username,
            phone_number,
            address: request.address.map(|address| Some(Address::from(address))),
            ..UserChanges::default()
        };

        let record = self.users.update_by_id(user_id, changes).await?;
        info!("Updated profile for user {}", user_id);

        Ok(record.into())
    }

    pub async fn remove_address(&self, user_id: Uuid) -> UserServiceResult<User> {
        let changes = UserChanges {
            address: Some(None),
            ..UserChanges::default()
        };

        let record = self.users.update_by_id(user_id, changes).await?;
        Ok(record.into())
    }

    /// Deletes the account together with its address
    pub async fn delete_account(&self, user_id: Uuid) -> UserServiceResult<()> {
        if !self.users.delete_by_id(user_id).await? {
            return Err(UserServiceError::UserNotFound);
        }

        info!("Deleted account {}", user_id);
        Ok(())
    }

    /// Health check for the backing store
    pub async fn health_check(&self) -> UserServiceResult<()> {
        Ok(self.users.health_check().await?)
    }
}

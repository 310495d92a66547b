//! Database Module
//!
//! Connection management plus the repository traits the services persist
//! through. Each trait has a PostgreSQL implementation and an in-memory one
//! used by tests and by local runs without `DATABASE_URL`.

pub mod book_repository;
pub mod connection;
pub mod memory;
pub mod user_repository;

use thiserror::Error;

use crate::utils::error::AppError;

// Re-export commonly used types
pub use book_repository::{BookRepository, PgBookRepository};
pub use connection::{run_migrations, DatabaseConfig};
pub use memory::{MemoryBookRepository, MemoryUserRepository};
pub use user_repository::{PgUserRepository, UserRepository};

/// Errors surfaced by the repositories
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A unique key is already taken; carries the field name
    #[error("Duplicate value for {0}")]
    Duplicate(String),

    #[error("Record not found")]
    NotFound,

    /// A write broke a check constraint; carries what the constraint requires
    #[error("Constraint violated: {0}")]
    CheckViolation(String),

    /// A stored value could not be decoded into the domain type
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(field) => {
                AppError::Conflict(format!("A record with this {} already exists", field))
            }
            RepositoryError::NotFound => AppError::NotFound("Record not found".to_string()),
            RepositoryError::CheckViolation(msg) => AppError::Validation(msg),
            RepositoryError::InvalidData(msg) => AppError::Internal(msg),
            RepositoryError::Database(e) => AppError::Database(e),
        }
    }
}

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Unique constraints and the field each one protects
const UNIQUE_CONSTRAINTS: &[(&str, &str)] = &[
    ("users_email_key", "email"),
    ("users_username_key", "username"),
    ("books_isbn_key", "isbn"),
];

/// Check constraints and the rule each one enforces
const CHECK_CONSTRAINTS: &[(&str, &str)] = &[(
    "books_inventory_check",
    "available_copies must be between 0 and total_copies",
)];

/// Error for a violation of the named constraint, if it is one we know
fn constraint_error(constraint: &str) -> Option<RepositoryError> {
    if let Some((_, field)) = UNIQUE_CONSTRAINTS.iter().find(|(name, _)| *name == constraint) {
        return Some(RepositoryError::Duplicate((*field).to_string()));
    }
    CHECK_CONSTRAINTS
        .iter()
        .find(|(name, _)| *name == constraint)
        .map(|(_, rule)| RepositoryError::CheckViolation((*rule).to_string()))
}

/// Translate known constraint violations into typed repository errors
pub(crate) fn map_constraint_violation(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(mapped) = db_err.constraint().and_then(constraint_error) {
            return mapped;
        }
    }
    RepositoryError::Database(err)
}

//! Library Service
//!
//! REST API for a lending library: member accounts with email verification,
//! JWT sessions carried in HTTP-only cookies or bearer headers, profile
//! management and an admin-curated book catalog.
//!
//! # Features
//!
//! - **Accounts**: registration, Argon2id password hashing, email verification links
//! - **Sessions**: access/refresh token pairs with refresh rotation and logout revocation
//! - **Profiles**: username, phone number and postal address for the signed-in member
//! - **Catalog**: public browsing, admin-only writes with inventory checks
//! - **Flexible Router**: endpoint groups toggled through [`RouterBuilder`]
//! - **Storage**: PostgreSQL via SQLx, or an in-memory store for tests and local runs
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use library_service::{
//!     api::{AppState, RouterBuilder},
//!     config::{AuthConfig, CookieConfig, JwtConfig},
//!     database::{MemoryBookRepository, MemoryUserRepository},
//!     service::{AuthService, BookService, EmailTemplates, JwtService, LogMailer, UserService},
//!     utils::security::PasswordHasher,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let users = Arc::new(MemoryUserRepository::new());
//!     let jwt_service = Arc::new(JwtService::new(&JwtConfig::with_secrets(
//!         "access-secret",
//!         "refresh-secret",
//!     ))?);
//!
//!     let auth_service = AuthService::new(
//!         users.clone(),
//!         jwt_service.clone(),
//!         Arc::new(LogMailer),
//!         EmailTemplates::new("My Library")?,
//!         PasswordHasher::default(),
//!         AuthConfig::default(),
//!     );
//!
//!     let state = AppState {
//!         auth_service: Arc::new(auth_service),
//!         user_service: Arc::new(UserService::new(users)),
//!         book_service: Arc::new(BookService::new(Arc::new(MemoryBookRepository::new()))),
//!         jwt_service,
//!         cookies: CookieConfig::default(),
//!     };
//!
//!     // Only accounts and sessions, no catalog
//!     let app = RouterBuilder::with_auth_routes().build(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **API Layer**: handlers, cookie helpers, auth middleware and routing
//! - **Service Layer**: account, session, profile and catalog rules
//! - **Models**: domain records, token claims and request/response types
//! - **Database**: repository traits with PostgreSQL and in-memory implementations
//! - **Utils**: error mapping, password hashing and input validation

/// HTTP API layer with handlers and configurable routing
pub mod api;

/// Configuration loaded from the environment
pub mod config;

/// Connection management and repositories
pub mod database;

/// Data models and request/response structures
pub mod models;

/// Business logic for accounts, sessions and the catalog
pub mod service;

/// Shared utilities for security, validation, and error handling
pub mod utils;

// Re-export commonly used types for convenient access
pub use api::{create_routes, AppState, RouterBuilder};
pub use config::{AppConfig, AuthConfig, CookieConfig, EmailConfig, JwtConfig, ServerConfig};
pub use database::DatabaseConfig;
pub use models::{AuthSession, Book, TokenPair, User, UserContext, UserRole};
pub use service::{AuthService, BookService, JwtService, UserService};
pub use utils::error::{AppError, AppResult, ErrorResponse};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

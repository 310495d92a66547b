//! Service Layer
//!
//! Business logic for the library service: sessions, profiles and the catalog.

pub mod auth;
pub mod book;
pub mod email_service;
pub mod jwt;
pub mod user;

// Re-export services
pub use auth::{AuthError, AuthService};
pub use book::{BookService, BookServiceError};
pub use email_service::{DeliveryError, EmailTemplates, LogMailer, Mailer, SmtpMailer};
pub use jwt::{JwtService, TokenError};
pub use user::{UserService, UserServiceError};

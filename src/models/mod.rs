//! Data Models Module
//!
//! This module contains all data structures used throughout the library
//! service: accounts, token claims, catalog records and request/response types.

pub mod auth;
pub mod book;
pub mod requests;
pub mod user;

// Re-export commonly used types
pub use auth::*;
pub use book::*;
pub use requests::*;
pub use user::*;

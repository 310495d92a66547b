//! API Layer
//!
//! HTTP endpoints, session cookies and request authentication.

pub mod auth_handlers;
pub mod book_handlers;
pub mod cookies;
pub mod handlers;
pub mod middleware;
pub mod routes;

// Re-export commonly used types
pub use handlers::{AppState, SuccessResponse};
pub use middleware::{auth_middleware, extract_auth_user, require_admin, AuthUser};
pub use routes::{create_routes, RouterBuilder};

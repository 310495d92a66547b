//! API Route Definitions
//!
//! This module defines all HTTP routes and their corresponding handlers using a flexible
//! builder pattern. The RouterBuilder allows selective enabling/disabling of endpoint
//! groups, e.g. a catalog-only read replica or an auth-only deployment.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};

use super::auth_handlers::*;
use super::book_handlers::*;
use super::handlers::*;
use super::middleware::{auth_middleware, require_admin};

/// Builder for creating API routes with configurable endpoints
///
/// Routes that need an access token get [`auth_middleware`]; catalog writes
/// additionally get [`require_admin`].
#[derive(Debug, Default)]
pub struct RouterBuilder {
    /// GET /health
    health_check: bool,
    /// POST /auth/register
    register: bool,
    /// POST /auth/login
    login: bool,
    /// POST /auth/refresh
    refresh_token: bool,
    /// POST /auth/logout
    logout: bool,
    /// POST /auth/verify-email/request, GET and POST /auth/verify-email
    email_verification: bool,
    /// GET, PUT and DELETE /users/me, DELETE /users/me/address
    profile: bool,
    /// GET /books, GET /books/{id}
    book_catalog: bool,
    /// POST /books, PUT and DELETE /books/{id}
    book_admin: bool,
}

impl RouterBuilder {
    /// Creates a new router builder with all routes disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router builder with every endpoint enabled
    pub fn with_all_routes() -> Self {
        Self {
            health_check: true,
            register: true,
            login: true,
            refresh_token: true,
            logout: true,
            email_verification: true,
            profile: true,
            book_catalog: true,
            book_admin: true,
        }
    }

    /// Account and session endpoints without the catalog
    pub fn with_auth_routes() -> Self {
        Self {
            health_check: true,
            register: true,
            login: true,
            refresh_token: true,
            logout: true,
            email_verification: true,
            profile: true,
            book_catalog: false,
            book_admin: false,
        }
    }

    /// Public catalog browsing only
    pub fn with_readonly_routes() -> Self {
        Self {
            health_check: true,
            book_catalog: true,
            ..Self::default()
        }
    }

    /// Only the health check, for monitoring
    pub fn with_minimal_routes() -> Self {
        Self {
            health_check: true,
            ..Self::default()
        }
    }

    pub fn health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    pub fn register(mut self, enabled: bool) -> Self {
        self.register = enabled;
        self
    }

    pub fn login(mut self, enabled: bool) -> Self {
        self.login = enabled;
        self
    }

    pub fn refresh_token(mut self, enabled: bool) -> Self {
        self.refresh_token = enabled;
        self
    }

    pub fn logout(mut self, enabled: bool) -> Self {
        self.logout = enabled;
        self
    }

    /// Enables or disables the verification request and confirmation endpoints
    pub fn email_verification(mut self, enabled: bool) -> Self {
        self.email_verification = enabled;
        self
    }

    /// Enables or disables the `/users/me` endpoints
    pub fn profile(mut self, enabled: bool) -> Self {
        self.profile = enabled;
        self
    }

    pub fn book_catalog(mut self, enabled: bool) -> Self {
        self.book_catalog = enabled;
        self
    }

    /// Enables or disables catalog writes (admin role required)
    pub fn book_admin(mut self, enabled: bool) -> Self {
        self.book_admin = enabled;
        self
    }

    /// Builds the Axum router with the configured routes and binds the state
    pub fn build(self, state: AppState) -> Router {
        let mut public = Router::new();
        let mut protected = Router::new();
        let mut admin = Router::new();

        if self.health_check {
            public = public.route("/health", get(health_check));
        }

        if self.register {
            public = public.route("/auth/register", post(register));
        }

        if self.login {
            public = public.route("/auth/login", post(login));
        }

        if self.refresh_token {
            public = public.route("/auth/refresh", post(refresh_token));
        }

        if self.email_verification {
            public = public
                .route(
                    "/auth/verify-email/request",
                    post(request_email_verification),
                )
                .route(
                    "/auth/verify-email",
                    get(verify_email_link).post(verify_email),
                );
        }

        if self.book_catalog {
            public = public
                .route("/books", get(list_books))
                .route("/books/{id}", get(get_book));
        }

        if self.logout {
            protected = protected.route("/auth/logout", post(logout));
        }

        if self.profile {
            protected = protected
                .route(
                    "/users/me",
                    get(get_profile).put(update_profile).delete(delete_account),
                )
                .route("/users/me/address", delete(remove_address));
        }

        if self.book_admin {
            admin = admin
                .route("/books", post(create_book))
                .route("/books/{id}", put(update_book).delete(delete_book));
        }

        let mut router = public;

        // route_layer on an empty router is rejected by axum
        if self.logout || self.profile {
            router = router.merge(protected.route_layer(from_fn_with_state(
                state.jwt_service.clone(),
                auth_middleware,
            )));
        }

        if self.book_admin {
            router = router.merge(
                admin
                    .route_layer(from_fn(require_admin))
                    .route_layer(from_fn_with_state(
                        state.jwt_service.clone(),
                        auth_middleware,
                    )),
            );
        }

        router.with_state(state)
    }
}

/// Creates all API routes
pub fn create_routes(state: AppState) -> Router {
    RouterBuilder::with_all_routes().build(state)
}

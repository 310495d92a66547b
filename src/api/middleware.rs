//! Authentication Middleware
//!
//! Middleware for JWT authentication and role-based authorization.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use log::debug;

use super::cookies::{read_cookie, ACCESS_TOKEN_COOKIE};
use crate::models::UserContext;
use crate::service::{JwtService, TokenError};
use crate::utils::error::AppError;

/// Extension type for storing authenticated user context in request extensions
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserContext);

/// Access token from `Authorization: Bearer`, falling back to the cookie
fn access_token(headers: &HeaderMap) -> Result<String, AppError> {
    if let Some(header) = headers.get(AUTHORIZATION) {
        let value = header
            .to_str()
            .map_err(|_| AppError::Authentication("Invalid Authorization header".into()))?;

        return value
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Authentication("Invalid Authorization header format".into()));
    }

    read_cookie(headers, ACCESS_TOKEN_COOKIE)
        .ok_or_else(|| AppError::Authentication("Missing access token".into()))
}

/// Authentication middleware that validates the access token
///
/// On success the caller's [`UserContext`] is stored in the request
/// extensions as [`AuthUser`]. Expired tokens are reported as
/// `TOKEN_EXPIRED` so clients know to refresh.
pub async fn auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = access_token(&headers)?;

    let user_context = jwt_service.verify_access_token(&token).map_err(|e| match e {
        TokenError::Expired => AppError::TokenExpired("Access token has expired".into()),
        other => {
            debug!("Rejected access token: {}", other);
            AppError::Authentication("Invalid access token".into())
        }
    })?;

    request.extensions_mut().insert(AuthUser(user_context));

    Ok(next.run(request).await)
}

/// Authorization middleware admitting only admins
///
/// Must run after [`auth_middleware`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    if !extract_auth_user(&request)?.is_admin() {
        return Err(AppError::Forbidden("Administrator role required".into()));
    }

    Ok(next.run(request).await)
}

/// Helper function to extract authenticated user from request extensions
pub fn extract_auth_user(request: &Request) -> Result<&UserContext, AppError> {
    request
        .extensions()
        .get::<AuthUser>()
        .map(|auth_user| &auth_user.0)
        .ok_or_else(|| {
            AppError::Authentication("User context not found in request extensions".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::models::UserRole;
    use axum::{
        body::Body,
        http::{header::COOKIE, Method, StatusCode},
        middleware::{from_fn, from_fn_with_state},
        routing::get,
        Extension, Router,
    };
    use tower::util::ServiceExt;
    use uuid::Uuid;

    fn create_test_jwt_service() -> Arc<JwtService> {
        Arc::new(
            JwtService::new(&JwtConfig::with_secrets(
                "test_access_secret_key",
                "test_refresh_secret_key",
            ))
            .unwrap(),
        )
    }

    async fn whoami(Extension(AuthUser(user)): Extension<AuthUser>) -> String {
        user.user_id.to_string()
    }

    fn protected_app(jwt_service: Arc<JwtService>) -> Router {
        Router::new()
            .route("/me", get(whoami))
            .layer(from_fn_with_state(jwt_service, auth_middleware))
    }

    fn admin_app(jwt_service: Arc<JwtService>) -> Router {
        Router::new()
            .route("/admin", get(|| async { "OK" }))
            .layer(from_fn(require_admin))
            .layer(from_fn_with_state(jwt_service, auth_middleware))
    }

    fn get_request(uri: &str) -> axum::http::request::Builder {
        axum::http::Request::builder().method(Method::GET).uri(uri)
    }

    #[tokio::test]
    async fn test_auth_middleware_missing_token() {
        let app = protected_app(create_test_jwt_service());

        let response = app
            .oneshot(get_request("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_middleware_invalid_format() {
        let app = protected_app(create_test_jwt_service());

        let request = get_request("/me")
            .header(AUTHORIZATION, "Token abc")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_middleware_accepts_bearer_token() {
        let jwt_service = create_test_jwt_service();
        let user_id = Uuid::new_v4();
        let tokens = jwt_service.issue_token_pair(user_id, UserRole::User).unwrap();

        let request = get_request("/me")
            .header(AUTHORIZATION, format!("Bearer {}", tokens.access_token))
            .body(Body::empty())
            .unwrap();

        let response = protected_app(jwt_service).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_middleware_accepts_cookie() {
        let jwt_service = create_test_jwt_service();
        let tokens = jwt_service
            .issue_token_pair(Uuid::new_v4(), UserRole::User)
            .unwrap();

        let request = get_request("/me")
            .header(COOKIE, format!("access_token={}", tokens.access_token))
            .body(Body::empty())
            .unwrap();

        let response = protected_app(jwt_service).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_auth_middleware_rejects_refresh_token() {
        let jwt_service = create_test_jwt_service();
        let tokens = jwt_service
            .issue_token_pair(Uuid::new_v4(), UserRole::User)
            .unwrap();

        let request = get_request("/me")
            .header(AUTHORIZATION, format!("Bearer {}", tokens.refresh_token))
            .body(Body::empty())
            .unwrap();

        let response = protected_app(jwt_service).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_admin() {
        let jwt_service = create_test_jwt_service();
        let user = jwt_service
            .issue_token_pair(Uuid::new_v4(), UserRole::User)
            .unwrap();
        let admin = jwt_service
            .issue_token_pair(Uuid::new_v4(), UserRole::Admin)
            .unwrap();

        let app = admin_app(jwt_service);

        let response = app
            .clone()
            .oneshot(
                get_request("/admin")
                    .header(AUTHORIZATION, format!("Bearer {}", user.access_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(
                get_request("/admin")
                    .header(AUTHORIZATION, format!("Bearer {}", admin.access_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_extract_auth_user() {
        let mut request = get_request("/test").body(Body::empty()).unwrap();
        assert!(extract_auth_user(&request).is_err());

        let user_context = UserContext {
            user_id: Uuid::new_v4(),
            role: UserRole::Admin,
        };
        request
            .extensions_mut()
            .insert(AuthUser(user_context.clone()));

        let result = extract_auth_user(&request).unwrap();
        assert_eq!(result.user_id, user_context.user_id);
        assert!(result.is_admin());
    }
}

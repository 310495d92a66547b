//! HTTP Request Handlers
//!
//! Shared state, the response envelope, health and profile handlers.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use validator::Validate;

use super::cookies::{cleared_cookies, CookieHeaders};
use super::middleware::AuthUser;
use crate::{
    config::CookieConfig,
    models::{HealthCheckResponse, MessageResponse, UpdateProfileRequest, User},
    service::{AuthService, BookService, JwtService, UserService},
    utils::error::{AppError, AppResult},
    VERSION,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub book_service: Arc<BookService>,
    pub jwt_service: Arc<JwtService>,
    pub cookies: CookieConfig,
}

/// Standard success response wrapper
#[derive(serde::Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<HealthCheckResponse>>> {
    state.user_service.health_check().await?;

    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: VERSION.to_string(),
    };

    Ok(Json(SuccessResponse::new(response)))
}

/// Current user's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<User>>> {
    let profile = state.user_service.get_profile(user.user_id).await?;
    Ok(Json(SuccessResponse::new(profile)))
}

/// Update the current user's profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<SuccessResponse<User>>> {
    request.validate().map_err(handle_validation_error)?;

    let profile = state
        .user_service
        .update_profile(user.user_id, request)
        .await?;
    Ok(Json(SuccessResponse::new(profile)))
}

/// Remove the current user's address
pub async fn remove_address(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<SuccessResponse<User>>> {
    let profile = state.user_service.remove_address(user.user_id).await?;
    Ok(Json(SuccessResponse::new(profile)))
}

/// Delete the current user's account and end the session
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<(CookieHeaders, Json<SuccessResponse<MessageResponse>>)> {
    state.user_service.delete_account(user.user_id).await?;

    Ok((
        cleared_cookies(&state.cookies),
        Json(SuccessResponse::new(MessageResponse::new("Account deleted"))),
    ))
}

/// Handle validation errors from request parsing
pub fn handle_validation_error(err: validator::ValidationErrors) -> AppError {
    let mut messages = Vec::new();

    for (field, errors) in err.field_errors() {
        for error in errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for field '{}'", field));
            messages.push(format!("{}: {}", field, message));
        }
    }

    // Nested structs (e.g. the address) only show up in the full report
    if messages.is_empty() {
        return AppError::Validation(err.to_string());
    }

    messages.sort();
    AppError::Validation(messages.join(", "))
}

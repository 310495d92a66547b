//! Authentication Handlers
//!
//! Registration, login, token refresh, logout and email verification.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use log::debug;
use validator::Validate;

use super::cookies::{
    cleared_cookies, read_cookie, session_cookies, CookieHeaders, REFRESH_TOKEN_COOKIE,
};
use super::handlers::{handle_validation_error, AppState, SuccessResponse};
use super::middleware::AuthUser;
use crate::models::{
    AuthSession, LoginRequest, MessageResponse, RefreshTokenRequest, RegisterRequest,
    RequestVerificationRequest, User, VerifyEmailRequest,
};
use crate::service::AuthError;
use crate::utils::error::{AppError, AppResult};

/// Create a new account
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse<User>>)> {
    request.validate().map_err(handle_validation_error)?;

    let user = state.auth_service.register(request).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(user))))
}

/// Sign in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<(CookieHeaders, Json<SuccessResponse<AuthSession>>)> {
    request.validate().map_err(handle_validation_error)?;

    let session = state.auth_service.login(request).await?;
    Ok((
        session_cookies(&session.tokens, &state.cookies),
        Json(SuccessResponse::new(session)),
    ))
}

/// Exchange a refresh token for a new token pair
///
/// The token is taken from a JSON body `{"refresh_token": "..."}` when one
/// is sent, otherwise from the `refresh_token` cookie.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(CookieHeaders, Json<SuccessResponse<AuthSession>>)> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshTokenRequest::default()
    } else {
        serde_json::from_slice::<RefreshTokenRequest>(&body)
            .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?
    };
    request.validate().map_err(handle_validation_error)?;

    let token = request
        .refresh_token
        .or_else(|| read_cookie(&headers, REFRESH_TOKEN_COOKIE))
        .ok_or_else(|| AppError::Authentication("Missing refresh token".into()))?;

    let session = state.auth_service.refresh(&token).await?;
    Ok((
        session_cookies(&session.tokens, &state.cookies),
        Json(SuccessResponse::new(session)),
    ))
}

/// End the current session
pub async fn logout(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<(CookieHeaders, Json<SuccessResponse<MessageResponse>>)> {
    state.auth_service.logout(user.user_id).await?;

    Ok((
        cleared_cookies(&state.cookies),
        Json(SuccessResponse::new(MessageResponse::new("Logged out"))),
    ))
}

/// Send a verification link
///
/// Always answers 202 so the endpoint cannot be used to probe for accounts.
pub async fn request_email_verification(
    State(state): State<AppState>,
    Json(request): Json<RequestVerificationRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse<MessageResponse>>)> {
    request.validate().map_err(handle_validation_error)?;

    match state
        .auth_service
        .request_email_verification(&request.email)
        .await
    {
        Ok(()) => {}
        Err(AuthError::UserNotFound) => {
            debug!("Verification requested for unknown email {}", request.email);
        }
        Err(e) => return Err(e.into()),
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(SuccessResponse::new(MessageResponse::new(
            "If the address is registered, a verification email has been sent",
        ))),
    ))
}

/// Confirm an email address from the emailed link
pub async fn verify_email_link(
    State(state): State<AppState>,
    Query(request): Query<VerifyEmailRequest>,
) -> AppResult<Json<SuccessResponse<User>>> {
    confirm_email(&state, request).await
}

/// Confirm an email address with a token posted as JSON
pub async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> AppResult<Json<SuccessResponse<User>>> {
    confirm_email(&state, request).await
}

async fn confirm_email(
    state: &AppState,
    request: VerifyEmailRequest,
) -> AppResult<Json<SuccessResponse<User>>> {
    request.validate().map_err(handle_validation_error)?;

    let user = state.auth_service.verify_email(&request.token).await?;
    Ok(Json(SuccessResponse::new(user)))
}

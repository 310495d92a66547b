//! Catalog Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::handlers::{handle_validation_error, AppState, SuccessResponse};
use crate::models::{Book, CreateBookRequest, MessageResponse, UpdateBookRequest};
use crate::utils::error::AppResult;

pub async fn list_books(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<Vec<Book>>>> {
    let books = state.book_service.list_books().await?;
    Ok(Json(SuccessResponse::new(books)))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Book>>> {
    let book = state.book_service.get_book(book_id).await?;
    Ok(Json(SuccessResponse::new(book)))
}

/// Add a title to the catalog (admin only)
pub async fn create_book(
    State(state): State<AppState>,
    Json(request): Json<CreateBookRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse<Book>>)> {
    request.validate().map_err(handle_validation_error)?;

    let book = state.book_service.create_book(request).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(book))))
}

/// Update a catalog entry (admin only)
pub async fn update_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
    Json(request): Json<UpdateBookRequest>,
) -> AppResult<Json<SuccessResponse<Book>>> {
    request.validate().map_err(handle_validation_error)?;

    let book = state.book_service.update_book(book_id, request).await?;
    Ok(Json(SuccessResponse::new(book)))
}

/// Remove a catalog entry (admin only)
pub async fn delete_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<MessageResponse>>> {
    state.book_service.delete_book(book_id).await?;
    Ok(Json(SuccessResponse::new(MessageResponse::new("Book deleted"))))
}

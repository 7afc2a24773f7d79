//! User directory handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};

use parley_core::pagination::Page;
use parley_types::user::{User, UserId};

use crate::http::error::{AppError, parse_id};
use crate::http::extractors::auth::CurrentUser;
use crate::http::extractors::query::PageQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/users - Page through all users.
pub async fn list_users(
    State(state): State<AppState>,
    _current: CurrentUser,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Page<User>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let Query(query) = query?;

    let page = state.user_directory.list_users(query.page()).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::page(page, "/api/v1/users", request_id, elapsed)))
}

/// GET /api/v1/users/{id} - Get a single user.
pub async fn get_user(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let id: UserId = parse_id(&id, "user")?;

    let user = state.user_directory.get_user(&id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let href = format!("/api/v1/users/{}", user.id);
    Ok(Json(ApiResponse::success(user, request_id, elapsed).with_link("self", &href)))
}

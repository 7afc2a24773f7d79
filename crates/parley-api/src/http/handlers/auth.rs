//! Signup, login and logout handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::Serialize;

use parley_types::auth::{LoginRequest, LoginResponse, SignupRequest};
use parley_types::user::User;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LogoutResult {
    pub message: &'static str,
}

/// POST /api/v1/auth/signup - Register a new account.
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let Json(body) = body?;

    let user = state.auth_service.signup(body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let href = format!("/api/v1/users/{}", user.id);
    let resp = ApiResponse::success(user, request_id, elapsed)
        .with_link("self", &href)
        .with_link("login", "/api/v1/auth/login");

    Ok((StatusCode::CREATED, Json(resp)))
}

/// POST /api/v1/auth/login - Exchange credentials for an access token.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let Json(body) = body?;

    let login = state.auth_service.login(body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let href = format!("/api/v1/conversation/user/{}", login.user.id);
    let resp = ApiResponse::success(login, request_id, elapsed).with_link("conversations", &href);

    Ok(Json(resp))
}

/// POST /api/v1/logout - Revoke the token used on this request.
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ApiResponse<LogoutResult>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    state.auth_service.logout(&current.0).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let body = LogoutResult {
        message: "Successfully logged out",
    };
    Ok(Json(ApiResponse::success(body, request_id, elapsed)))
}

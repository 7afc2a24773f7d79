//! Message handlers: send, page through, and poll for new messages.

use std::time::Instant;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use parley_core::pagination::Page;
use parley_types::conversation::ConversationId;
use parley_types::message::{Message, MessageId, SendMessageRequest};

use crate::http::error::{AppError, parse_id};
use crate::http::extractors::auth::CurrentUser;
use crate::http::extractors::query::PageQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/conversation/{id}/message/send - Post a message.
pub async fn send_message(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Message>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let id: ConversationId = parse_id(&id, "conversation")?;
    let Json(body) = body?;

    let message = state
        .conversation_service
        .send_message(&current.identity().id, &id, &body.content)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let poll = format!("/api/v1/conversation/{id}/poll/{}", message.id);
    let resp = ApiResponse::success(message, request_id, elapsed)
        .with_link("messages", &format!("/api/v1/conversation/{id}/message"))
        .with_link("poll", &poll);

    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/conversation/{id}/message - Page through messages, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Page<Message>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let id: ConversationId = parse_id(&id, "conversation")?;
    let Query(query) = query?;

    let page = state
        .conversation_service
        .list_messages(&current.identity().id, &id, query.page())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let base = format!("/api/v1/conversation/{id}/message");
    Ok(Json(ApiResponse::page(page, &base, request_id, elapsed)))
}

/// GET /api/v1/conversation/{id}/poll/{last_msg_id} - Messages newer than
/// `last_msg_id`, oldest first.
pub async fn poll_messages(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, last_msg_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let id: ConversationId = parse_id(&id, "conversation")?;
    let last_msg_id: MessageId = parse_id(&last_msg_id, "message")?;

    let messages = state
        .conversation_service
        .poll_messages(&current.identity().id, &id, &last_msg_id)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    // Clients poll again from the newest message they now hold.
    let cursor = messages.last().map(|m| m.id).unwrap_or(last_msg_id);
    let next = format!("/api/v1/conversation/{id}/poll/{cursor}");
    Ok(Json(ApiResponse::success(messages, request_id, elapsed).with_link("next", &next)))
}

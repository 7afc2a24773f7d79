//! Conversation handlers: creation, detail, and per-user listing.

use std::time::Instant;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use parley_core::conversation::service::{ConversationSummary, ConversationView};
use parley_core::pagination::Page;
use parley_types::conversation::{
    ConversationId, CreateGroupRequest, CreatePersonalRequest,
};
use parley_types::user::UserId;

use crate::http::error::{AppError, parse_id};
use crate::http::extractors::auth::CurrentUser;
use crate::http::extractors::query::PageQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

fn conversation_response(
    view: ConversationView,
    request_id: String,
    elapsed: u64,
) -> ApiResponse<ConversationView> {
    let base = format!("/api/v1/conversation/{}", view.id);
    ApiResponse::success(view, request_id, elapsed)
        .with_link("self", &base)
        .with_link("messages", &format!("{base}/message"))
        .with_link("send", &format!("{base}/message/send"))
}

/// POST /api/v1/conversation/personal - Start a personal conversation.
///
/// 201 when created, 200 with the existing conversation when the pair
/// already has one.
pub async fn create_personal(
    State(state): State<AppState>,
    current: CurrentUser,
    body: Result<Json<CreatePersonalRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ConversationView>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let Json(body) = body?;

    let outcome = state
        .conversation_service
        .create_personal(&current.identity().id, &body.participant_ids())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let status = if outcome.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let resp = conversation_response(outcome.into_inner(), request_id, elapsed);
    Ok((status, Json(resp)))
}

/// POST /api/v1/conversation/group - Create a group owned by the caller.
pub async fn create_group(
    State(state): State<AppState>,
    current: CurrentUser,
    body: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ConversationView>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let Json(body) = body?;

    let view = state
        .conversation_service
        .create_group(
            &current.identity().id,
            body.group_name.as_deref(),
            &body.participant_ids(),
        )
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok((
        StatusCode::CREATED,
        Json(conversation_response(view, request_id, elapsed)),
    ))
}

/// GET /api/v1/conversation/{id} - Conversation detail. Members only.
pub async fn get_conversation(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ConversationView>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let id: ConversationId = parse_id(&id, "conversation")?;

    let view = state
        .conversation_service
        .get_conversation(&current.identity().id, &id)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(conversation_response(view, request_id, elapsed)))
}

/// GET /api/v1/conversation/user/{user_id} - The caller's conversations.
pub async fn list_user_conversations(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Page<ConversationSummary>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();
    let user_id: UserId = parse_id(&user_id, "user")?;
    let Query(query) = query?;

    let page = state
        .conversation_service
        .list_user_conversations(&current.identity().id, &user_id, query.page())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let base = format!("/api/v1/conversation/user/{user_id}");
    Ok(Json(ApiResponse::page(page, &base, request_id, elapsed)))
}

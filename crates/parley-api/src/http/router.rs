//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Auth
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        // Users
        .route("/users", get(handlers::user::list_users))
        .route("/users/{id}", get(handlers::user::get_user))
        // Conversations
        .route(
            "/conversation/personal",
            post(handlers::conversation::create_personal),
        )
        .route(
            "/conversation/group",
            post(handlers::conversation::create_group),
        )
        .route(
            "/conversation/user/{user_id}",
            get(handlers::conversation::list_user_conversations),
        )
        .route(
            "/conversation/{id}",
            get(handlers::conversation::get_conversation),
        )
        // Messages
        .route(
            "/conversation/{id}/message",
            get(handlers::message::list_messages),
        )
        .route(
            "/conversation/{id}/message/send",
            post(handlers::message::send_message),
        )
        .route(
            "/conversation/{id}/poll/{last_msg_id}",
            get(handlers::message::poll_messages),
        )
        // Health
        .route("/health", get(handlers::health::health));

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

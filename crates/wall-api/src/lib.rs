pub mod auth;
pub mod comments;
pub mod convert;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod rpc;
pub mod visits;
pub mod walls;

use axum::{
    Json, Router,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use wall_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;

/// Full HTTP surface of the wall backend.
pub fn router(state: AppState) -> Router {
    let auth = axum::middleware::from_fn_with_state(state.clone(), middleware::require_auth);

    Router::new()
        .route("/health", get(health))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/session", get(auth::session).route_layer(auth.clone()))
        .route("/profiles", post(auth::ensure_profile).route_layer(auth.clone()))
        // Records
        .route(
            "/walls",
            get(walls::list_walls).post(walls::create_wall).route_layer(auth.clone()),
        )
        .route(
            "/walls/{wall_id}",
            get(walls::get_wall).merge(delete(walls::delete_wall).route_layer(auth.clone())),
        )
        .route("/walls/{wall_id}/messages", post(messages::send_message))
        .route(
            "/walls/{wall_id}/messages/{message_id}",
            delete(messages::delete_message).route_layer(auth.clone()),
        )
        .route(
            "/messages/{message_id}/comments",
            post(comments::create_comment).route_layer(auth),
        )
        .route("/visits", get(visits::recent_visits))
        // Remote procedures
        .route("/rpc/check_wall_password", post(rpc::check_wall_password))
        .route("/rpc/get_wall_messages", post(rpc::get_wall_messages))
        .route("/rpc/get_wall_comments", post(rpc::get_wall_comments))
        .route("/rpc/upsert_wall_visit", post(visits::upsert_wall_visit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Run a blocking DB closure off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed"))
        })?
        .map_err(ApiError::from)
}

//! Named remote procedures. Password checks happen here and nowhere else:
//! the canonical wall password never leaves the server.

use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;

use wall_types::api::{CheckWallPasswordRequest, WallContentRequest};
use wall_types::models::{Comment, Message};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::MaybeClaims;
use crate::walls::{authorize_content, load_wall};
use crate::{convert, run_blocking};

/// `check_wall_password(wall_id, candidate) -> bool`
pub async fn check_wall_password(
    State(state): State<AppState>,
    Json(req): Json<CheckWallPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let wall_id = req.wall_id;
    let valid = run_blocking(&state, move |db| {
        db.check_wall_password(&req.wall_id.to_string(), &req.candidate)
    })
    .await?;

    debug!("Password check for wall {}: {}", wall_id, valid);
    Ok(Json(valid))
}

/// `get_wall_messages(wall_id, password?) -> Message[]`, newest first.
pub async fn get_wall_messages(
    State(state): State<AppState>,
    MaybeClaims(claims): MaybeClaims,
    Json(req): Json<WallContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let wall = load_wall(&state, req.wall_id).await?;
    authorize_content(&wall, claims.as_ref(), req.password.as_deref())?;

    let rows = run_blocking(&state, move |db| db.get_messages(&wall.id)).await?;
    let messages = rows
        .into_iter()
        .map(convert::message)
        .collect::<anyhow::Result<Vec<Message>>>()?;

    Ok(Json(messages))
}

/// `get_wall_comments(wall_id, password?) -> Comment[]`, oldest first.
/// Gated exactly like the messages they belong to.
pub async fn get_wall_comments(
    State(state): State<AppState>,
    MaybeClaims(claims): MaybeClaims,
    Json(req): Json<WallContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let wall = load_wall(&state, req.wall_id).await?;
    authorize_content(&wall, claims.as_ref(), req.password.as_deref())?;

    let rows = run_blocking(&state, move |db| db.get_comments_for_wall(&wall.id)).await?;
    let comments = rows
        .into_iter()
        .map(convert::comment)
        .collect::<anyhow::Result<Vec<Comment>>>()?;

    Ok(Json(comments))
}

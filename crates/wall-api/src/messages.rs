use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use wall_types::api::{Claims, SendMessageRequest};
use wall_types::models::Message;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::MaybeClaims;
use crate::walls::{authorize_content, load_wall, require_owner};
use crate::{convert, run_blocking};

const MAX_MESSAGE_LEN: usize = 5000;

/// Anonymous submission. No account needed; protected walls require the
/// password unless the sender owns the wall.
pub async fn send_message(
    State(state): State<AppState>,
    Path(wall_id): Path<Uuid>,
    MaybeClaims(claims): MaybeClaims,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::BadRequest("message is empty".into()));
    }
    if content.chars().count() > MAX_MESSAGE_LEN {
        return Err(ApiError::BadRequest("message is too long".into()));
    }

    let wall = load_wall(&state, wall_id).await?;
    authorize_content(&wall, claims.as_ref(), req.password.as_deref())?;

    let message = Message {
        id: Uuid::new_v4(),
        wall_id,
        content,
        created_at: convert::now(),
    };

    let (mid, wid, body) = (message.id.to_string(), wall_id.to_string(), message.content.clone());
    let created_at = convert::format_timestamp(&message.created_at);
    run_blocking(&state, move |db| db.insert_message(&mid, &wid, &body, &created_at)).await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Owner-only moderation. The message must belong to the wall in the path.
pub async fn delete_message(
    State(state): State<AppState>,
    Path((wall_id, message_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let wall = load_wall(&state, wall_id).await?;
    require_owner(&wall, &claims)?;

    let mid = message_id.to_string();
    let row = run_blocking(&state, move |db| db.get_message(&mid))
        .await?
        .ok_or(ApiError::NotFound("message"))?;
    let message = convert::message(row)?;
    if message.wall_id != wall_id {
        return Err(ApiError::NotFound("message"));
    }

    let mid = message_id.to_string();
    run_blocking(&state, move |db| db.delete_message(&mid)).await?;

    info!("Message {} on wall {} deleted by owner", message_id, wall_id);
    Ok(StatusCode::NO_CONTENT)
}

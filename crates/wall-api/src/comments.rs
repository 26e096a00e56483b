use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use wall_types::api::{Claims, CreateCommentRequest};
use wall_types::models::Comment;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::walls::{authorize_content, load_wall};
use crate::{convert, run_blocking};

/// Comments are always attributed to the authenticated caller, who must be
/// able to read the wall the message is on.
pub async fn create_comment(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::BadRequest("comment is empty".into()));
    }

    let mid = message_id.to_string();
    let row = run_blocking(&state, move |db| db.get_message(&mid))
        .await?
        .ok_or(ApiError::NotFound("message"))?;
    let message = convert::message(row)?;
    let wall = load_wall(&state, message.wall_id).await?;
    authorize_content(&wall, Some(&claims), req.password.as_deref())?;

    let comment = Comment {
        id: Uuid::new_v4(),
        message_id,
        user_id: claims.sub,
        content,
        created_at: convert::now(),
    };

    let (cid, mid, uid, body) = (
        comment.id.to_string(),
        message_id.to_string(),
        claims.sub.to_string(),
        comment.content.clone(),
    );
    let created_at = convert::format_timestamp(&comment.created_at);
    run_blocking(&state, move |db| db.insert_comment(&cid, &mid, &uid, &body, &created_at)).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

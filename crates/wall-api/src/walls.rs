use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use wall_db::models::WallRow;
use wall_types::api::{Claims, CreateWallRequest};
use wall_types::models::Wall;

use crate::auth::AppState;
use crate::convert;
use crate::error::ApiError;
use crate::run_blocking;

const MAX_TITLE_LEN: usize = 200;

/// Walls owned by the caller, newest first.
pub async fn list_walls(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = claims.sub.to_string();
    let rows = run_blocking(&state, move |db| db.get_walls_by_owner(&owner)).await?;

    let walls = rows
        .iter()
        .map(convert::wall)
        .collect::<anyhow::Result<Vec<Wall>>>()?;

    Ok(Json(walls))
}

pub async fn create_wall(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateWallRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::BadRequest("title is too long".into()));
    }

    // Blank passwords make a public wall.
    let password = req
        .password
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let wall = Wall {
        id: Uuid::new_v4(),
        title,
        owner_id: claims.sub,
        protected: password.is_some(),
        created_at: convert::now(),
    };

    let (id, title, owner) = (wall.id.to_string(), wall.title.clone(), claims.sub.to_string());
    let created_at = convert::format_timestamp(&wall.created_at);
    run_blocking(&state, move |db| {
        db.insert_wall(&id, &title, password.as_deref(), &owner, &created_at)
    })
    .await?;

    info!("Wall {} created by {}", wall.id, claims.sub);
    Ok((StatusCode::CREATED, Json(wall)))
}

/// Public wall lookup. Carries the protected flag, never the password.
pub async fn get_wall(
    State(state): State<AppState>,
    Path(wall_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = load_wall(&state, wall_id).await?;
    Ok(Json(convert::wall(&row)?))
}

pub async fn delete_wall(
    State(state): State<AppState>,
    Path(wall_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = load_wall(&state, wall_id).await?;
    require_owner(&row, &claims)?;

    let id = wall_id.to_string();
    run_blocking(&state, move |db| db.delete_wall(&id)).await?;

    info!("Wall {} deleted by {}", wall_id, claims.sub);
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn load_wall(state: &AppState, wall_id: Uuid) -> Result<WallRow, ApiError> {
    let id = wall_id.to_string();
    run_blocking(state, move |db| db.get_wall(&id))
        .await?
        .ok_or(ApiError::NotFound("wall"))
}

pub(crate) fn is_owner(row: &WallRow, claims: Option<&Claims>) -> bool {
    claims.is_some_and(|c| c.sub.to_string() == row.user_id)
}

pub(crate) fn require_owner(row: &WallRow, claims: &Claims) -> Result<(), ApiError> {
    if is_owner(row, Some(claims)) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("only the wall owner may do this".into()))
    }
}

/// Read gate for protected content: public walls pass, owners pass, and
/// everyone else must present the stored password.
pub(crate) fn authorize_content(
    row: &WallRow,
    claims: Option<&Claims>,
    password: Option<&str>,
) -> Result<(), ApiError> {
    match row.password.as_deref() {
        None => Ok(()),
        Some(_) if is_owner(row, claims) => Ok(()),
        Some(stored) if password == Some(stored) => Ok(()),
        Some(_) => Err(ApiError::IncorrectPassword),
    }
}

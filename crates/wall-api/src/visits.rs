use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use wall_db::models::Visitor;
use wall_types::api::{RecentVisitsQuery, UpsertWallVisitRequest};
use wall_types::models::WallVisit;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::MaybeClaims;
use crate::walls::load_wall;
use crate::{convert, run_blocking};

const DEFAULT_RECENT_LIMIT: u32 = 5;
const MAX_RECENT_LIMIT: u32 = 50;

enum Identity {
    Account(String),
    Anonymous(String),
}

/// `upsert_wall_visit(wall_id, title, is_authenticated, user_id?, visitor_id?)`
///
/// An account id in the body must match the bearer token; anonymous
/// callers identify themselves with a visitor id instead.
pub async fn upsert_wall_visit(
    State(state): State<AppState>,
    MaybeClaims(claims): MaybeClaims,
    Json(req): Json<UpsertWallVisitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identity = match (req.user_id, req.visitor_id) {
        (Some(user_id), _) => {
            if claims.as_ref().map(|c| c.sub) != Some(user_id) {
                return Err(ApiError::Forbidden("visit must be recorded for the caller".into()));
            }
            Identity::Account(user_id.to_string())
        }
        (None, Some(visitor_id)) => Identity::Anonymous(visitor_id.to_string()),
        (None, None) => return Err(ApiError::BadRequest("user_id or visitor_id is required".into())),
    };

    let wall = load_wall(&state, req.wall_id).await?;

    let new_id = Uuid::new_v4().to_string();
    let visited_at = convert::format_timestamp(&convert::now());
    run_blocking(&state, move |db| {
        let visitor = match &identity {
            Identity::Account(id) => Visitor::Account(id),
            Identity::Anonymous(id) => Visitor::Anonymous(id),
        };
        db.upsert_wall_visit(&new_id, &wall.id, &req.title, req.is_authenticated, visitor, &visited_at)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Latest visits by the caller's account or by the given visitor id.
pub async fn recent_visits(
    State(state): State<AppState>,
    MaybeClaims(claims): MaybeClaims,
    Query(query): Query<RecentVisitsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.map(|c| c.sub.to_string());
    let visitor_id = query.visitor_id.map(|v| v.to_string());
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT).min(MAX_RECENT_LIMIT);

    let rows = run_blocking(&state, move |db| {
        db.get_recent_visits(user_id.as_deref(), visitor_id.as_deref(), limit)
    })
    .await?;

    let visits = rows
        .into_iter()
        .map(convert::visit)
        .collect::<anyhow::Result<Vec<WallVisit>>>()?;

    Ok(Json(visits))
}

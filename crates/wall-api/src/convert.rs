//! Row → wire model conversion. Rows that fail to parse are logged and
//! rejected rather than patched with defaults.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use tracing::warn;
use uuid::Uuid;

use wall_db::models::{CommentRow, MessageRow, VisitRow, WallRow};
use wall_types::models::{Comment, Message, Wall, WallVisit};

/// Current time at the precision we store, so a record returned from a
/// create call compares equal to the same record read back later.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Timestamp format written by the API. Microsecond precision keeps
/// "most recent first" ordering stable for messages posted in a burst.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_id(raw: &str) -> Result<Uuid> {
    raw.parse().map_err(|e| {
        warn!("Corrupt id '{}': {}", raw, e);
        anyhow::anyhow!("corrupt id '{}'", raw)
    })
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite defaults store "YYYY-MM-DD HH:MM:SS" without timezone.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            anyhow::anyhow!("corrupt timestamp '{}'", raw)
        })
}

fn parse_optional_id(raw: Option<&str>) -> Result<Option<Uuid>> {
    raw.map(parse_id).transpose()
}

pub fn wall(row: &WallRow) -> Result<Wall> {
    Ok(Wall {
        id: parse_id(&row.id)?,
        title: row.title.clone(),
        owner_id: parse_id(&row.user_id).with_context(|| format!("owner of wall {}", row.id))?,
        protected: row.password.is_some(),
        created_at: parse_timestamp(&row.created_at)?,
    })
}

pub fn message(row: MessageRow) -> Result<Message> {
    Ok(Message {
        id: parse_id(&row.id)?,
        wall_id: parse_id(&row.link_id)?,
        content: row.content,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

pub fn comment(row: CommentRow) -> Result<Comment> {
    Ok(Comment {
        id: parse_id(&row.id)?,
        message_id: parse_id(&row.message_id)?,
        user_id: parse_id(&row.user_id)?,
        content: row.content,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

pub fn visit(row: VisitRow) -> Result<WallVisit> {
    Ok(WallVisit {
        id: parse_id(&row.id)?,
        wall_id: parse_id(&row.wall_id)?,
        title: row.title,
        last_visited: parse_timestamp(&row.last_visited)?,
        is_authenticated: row.is_authenticated,
        user_id: parse_optional_id(row.user_id.as_deref())?,
        visitor_id: parse_optional_id(row.visitor_id.as_deref())?,
    })
}

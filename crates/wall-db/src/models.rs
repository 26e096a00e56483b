/// Database row types. Each maps directly onto a SQLite row.
/// Distinct from wall-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct ProfileRow {
    pub id: String,
    pub username: String,
    pub created_at: String,
}

/// Row from `links`. `password` is stored as given; `None` means public.
pub struct WallRow {
    pub id: String,
    pub title: String,
    pub password: Option<String>,
    pub user_id: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub link_id: String,
    pub content: String,
    pub created_at: String,
}

pub struct CommentRow {
    pub id: String,
    pub message_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
}

pub struct VisitRow {
    pub id: String,
    pub wall_id: String,
    pub title: String,
    pub last_visited: String,
    pub is_authenticated: bool,
    pub user_id: Option<String>,
    pub visitor_id: Option<String>,
}

/// Viewer identity a visit is keyed on.
#[derive(Debug, Clone, Copy)]
pub enum Visitor<'a> {
    Account(&'a str),
    Anonymous(&'a str),
}

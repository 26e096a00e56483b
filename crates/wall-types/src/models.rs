use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A wall as seen by clients. The password never leaves the server;
/// `protected` is set exactly when one is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wall {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub protected: bool,
    pub created_at: DateTime<Utc>,
}

impl Wall {
    pub fn is_owned_by(&self, account_id: Option<Uuid>) -> bool {
        account_id == Some(self.owner_id)
    }
}

/// Anonymous message posted to a wall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub wall_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Comment on a message. Always attributed to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub message_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Recency record for the "recent walls" list. Exactly one of `user_id`
/// and `visitor_id` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallVisit {
    pub id: Uuid,
    pub wall_id: Uuid,
    pub title: String,
    pub last_visited: DateTime<Utc>,
    pub is_authenticated: bool,
    pub user_id: Option<Uuid>,
    pub visitor_id: Option<Uuid>,
}

use crate::Database;
use crate::models::{CommentRow, MessageRow, ProfileRow, UserRow, VisitRow, Visitor, WallRow};
use anyhow::Result;
use rusqlite::{Connection, Row};

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Profiles --

    /// Insert a profile unless one exists. Returns true if a row was created.
    pub fn ensure_profile(&self, id: &str, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO profiles (id, username) VALUES (?1, ?2)",
                (id, username),
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn get_profile(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, created_at FROM profiles WHERE id = ?1",
                [id],
                |row| {
                    Ok(ProfileRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }

    // -- Walls --

    pub fn insert_wall(
        &self,
        id: &str,
        title: &str,
        password: Option<&str>,
        owner_id: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO links (id, title, password, user_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, title, password, owner_id, created_at],
            )?;
            Ok(())
        })
    }

    pub fn get_wall(&self, id: &str) -> Result<Option<WallRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, title, password, user_id, created_at FROM links WHERE id = ?1",
                [id],
                wall_from_row,
            )
            .optional()
        })
    }

    /// Walls owned by an account, newest first.
    pub fn get_walls_by_owner(&self, owner_id: &str) -> Result<Vec<WallRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, password, user_id, created_at FROM links
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([owner_id], wall_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Deletes a wall along with its messages, comments and visits.
    /// Returns false if the wall did not exist.
    pub fn delete_wall(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM links WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    /// Compare a candidate against the stored wall password. Public walls
    /// accept any candidate; unknown walls accept none.
    pub fn check_wall_password(&self, wall_id: &str, candidate: &str) -> Result<bool> {
        Ok(match self.get_wall(wall_id)? {
            Some(WallRow { password: None, .. }) => true,
            Some(WallRow { password: Some(stored), .. }) => stored == candidate,
            None => false,
        })
    }

    // -- Messages --

    pub fn insert_message(&self, id: &str, wall_id: &str, content: &str, created_at: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, link_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, wall_id, content, created_at),
            )?;
            Ok(())
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, link_id, content, created_at FROM messages WHERE id = ?1",
                [id],
                message_from_row,
            )
            .optional()
        })
    }

    /// Messages on a wall, most recent first.
    pub fn get_messages(&self, wall_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, link_id, content, created_at FROM messages
                 WHERE link_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([wall_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_message(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        id: &str,
        message_id: &str,
        user_id: &str,
        content: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO message_comments (id, message_id, user_id, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, message_id, user_id, content, created_at),
            )?;
            Ok(())
        })
    }

    /// Every comment on every message of a wall, oldest first.
    pub fn get_comments_for_wall(&self, wall_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.message_id, c.user_id, c.content, c.created_at
                 FROM message_comments c
                 JOIN messages m ON c.message_id = m.id
                 WHERE m.link_id = ?1
                 ORDER BY c.created_at ASC, c.rowid ASC",
            )?;
            let rows = stmt
                .query_map([wall_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        message_id: row.get(1)?,
                        user_id: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Visits --

    /// Record a visit for (wall, visitor). Refreshes the existing row when
    /// there is one; `new_id` is only used on first visit.
    pub fn upsert_wall_visit(
        &self,
        new_id: &str,
        wall_id: &str,
        title: &str,
        is_authenticated: bool,
        visitor: Visitor<'_>,
        visited_at: &str,
    ) -> Result<()> {
        let (user_id, visitor_id) = match visitor {
            Visitor::Account(id) => (Some(id), None),
            Visitor::Anonymous(id) => (None, Some(id)),
        };

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let updated = tx.execute(
                "UPDATE wall_visits
                 SET title = ?1, last_visited = ?2, is_authenticated = ?3
                 WHERE wall_id = ?4 AND (user_id = ?5 OR visitor_id = ?6)",
                rusqlite::params![title, visited_at, is_authenticated, wall_id, user_id, visitor_id],
            )?;

            if updated == 0 {
                tx.execute(
                    "INSERT INTO wall_visits (id, wall_id, title, last_visited, is_authenticated, user_id, visitor_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![new_id, wall_id, title, visited_at, is_authenticated, user_id, visitor_id],
                )?;
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Most recent visits by an account or an anonymous visitor.
    pub fn get_recent_visits(
        &self,
        user_id: Option<&str>,
        visitor_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<VisitRow>> {
        if user_id.is_none() && visitor_id.is_none() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, wall_id, title, last_visited, is_authenticated, user_id, visitor_id
                 FROM wall_visits
                 WHERE user_id = ?1 OR visitor_id = ?2
                 ORDER BY last_visited DESC
                 LIMIT ?3",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, visitor_id, limit], |row| {
                    Ok(VisitRow {
                        id: row.get(0)?,
                        wall_id: row.get(1)?,
                        title: row.get(2)?,
                        last_visited: row.get(3)?,
                        is_authenticated: row.get(4)?,
                        user_id: row.get(5)?,
                        visitor_id: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT id, username, password, created_at FROM users WHERE {} = ?1", column);
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn wall_from_row(row: &Row<'_>) -> rusqlite::Result<WallRow> {
    Ok(WallRow {
        id: row.get(0)?,
        title: row.get(1)?,
        password: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        link_id: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

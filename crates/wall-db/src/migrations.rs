use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id          TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            username    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Walls. A NULL password means the wall is public.
        CREATE TABLE IF NOT EXISTS links (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            password    TEXT,
            user_id     TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_links_owner
            ON links(user_id, created_at);

        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            link_id     TEXT NOT NULL REFERENCES links(id) ON DELETE CASCADE,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_link
            ON messages(link_id, created_at);

        CREATE TABLE IF NOT EXISTS message_comments (
            id          TEXT PRIMARY KEY,
            message_id  TEXT NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_comments_message
            ON message_comments(message_id, created_at);

        CREATE TABLE IF NOT EXISTS wall_visits (
            id                TEXT PRIMARY KEY,
            wall_id           TEXT NOT NULL REFERENCES links(id) ON DELETE CASCADE,
            title             TEXT NOT NULL,
            last_visited      TEXT NOT NULL,
            is_authenticated  INTEGER NOT NULL DEFAULT 0,
            user_id           TEXT,
            visitor_id        TEXT,
            CHECK ((user_id IS NULL) <> (visitor_id IS NULL))
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_visits_user
            ON wall_visits(wall_id, user_id) WHERE user_id IS NOT NULL;

        CREATE UNIQUE INDEX IF NOT EXISTS idx_visits_visitor
            ON wall_visits(wall_id, visitor_id) WHERE visitor_id IS NOT NULL;
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

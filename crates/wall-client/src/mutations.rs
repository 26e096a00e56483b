//! Record mutations. Local checks run first and fail without a remote
//! call; the backend still enforces ownership on its own.

use tracing::{info, warn};
use uuid::Uuid;

use wall_types::models::{Comment, Message, Wall};

use crate::backend::DataBackend;
use crate::cache::KeyValueStore;
use crate::context::AppContext;
use crate::error::{ClientError, Result};
use crate::session::Session;
use crate::shell::Route;

const MAX_TITLE_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 5000;

fn require_session(session: Option<&Session>) -> Result<&Session> {
    session.ok_or(ClientError::AuthenticationRequired)
}

fn require_owner<'a>(session: Option<&'a Session>, wall: &Wall) -> Result<&'a Session> {
    let session = require_session(session)?;
    if wall.is_owned_by(Some(session.account_id())) {
        Ok(session)
    } else {
        Err(ClientError::Authorization)
    }
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ClientError::Validation(format!("{} cannot be empty", what)))
    } else {
        Ok(trimmed)
    }
}

impl<B: DataBackend, S: KeyValueStore> AppContext<B, S> {
    /// Ensure the profile row, then insert the wall. Not atomic: a failed
    /// insert leaves the profile behind, which is harmless.
    pub async fn create_wall(
        &self,
        session: Option<&Session>,
        title: &str,
        password: Option<&str>,
    ) -> Result<Wall> {
        let session = require_session(session)?;
        let title = non_empty(title, "Title")?;
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ClientError::Validation("Title is too long".into()));
        }
        let password = password.map(str::trim).filter(|p| !p.is_empty());

        self.backend.ensure_profile(session).await?;
        let wall = self.backend.create_wall(session, title, password).await?;

        info!("Created wall {} ({})", wall.id, if wall.protected { "protected" } else { "public" });
        Ok(wall)
    }

    /// No account needed. A session is only forwarded so owners can post
    /// to their own protected wall without the password.
    pub async fn create_message(
        &self,
        session: Option<&Session>,
        wall_id: Uuid,
        content: &str,
        password: Option<&str>,
    ) -> Result<Message> {
        let content = non_empty(content, "Message")?;
        if content.chars().count() > MAX_MESSAGE_LEN {
            return Err(ClientError::Validation("Message is too long".into()));
        }

        let message = self.backend.insert_message(session, wall_id, content, password).await?;
        self.threads.invalidate(wall_id);
        Ok(message)
    }

    pub async fn delete_message(&self, session: Option<&Session>, wall: &Wall, message_id: Uuid) -> Result<()> {
        let session = require_owner(session, wall)?;

        self.backend.delete_message(session, wall.id, message_id).await?;
        self.threads.invalidate(wall.id);
        info!("Deleted message {} from wall {}", message_id, wall.id);
        Ok(())
    }

    /// Needs an account, and the wall's password when it is protected and
    /// not the caller's own.
    pub async fn create_comment(
        &self,
        session: Option<&Session>,
        wall_id: Uuid,
        message_id: Uuid,
        content: &str,
        password: Option<&str>,
    ) -> Result<Comment> {
        let session = require_session(session)?;
        let content = non_empty(content, "Comment")?;

        let comment = self.backend.insert_comment(session, message_id, content, password).await?;
        self.threads.invalidate(wall_id);
        Ok(comment)
    }

    /// Delete the wall and everything under it. Returns where the viewer
    /// should go next.
    pub async fn delete_wall(&self, session: Option<&Session>, wall: &Wall) -> Result<Route> {
        let session = require_owner(session, wall)?;

        self.backend.delete_wall(session, wall.id).await?;
        self.threads.invalidate(wall.id);
        if let Err(e) = self.cache.forget(wall.id) {
            warn!("Failed to clear unlock state for deleted wall {}: {}", wall.id, e);
        }
        info!("Deleted wall {}", wall.id);
        Ok(Route::Landing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::testing::StubBackend;

    async fn context() -> (AppContext<StubBackend, MemoryStore>, Session) {
        let ctx = AppContext::new(StubBackend::default(), MemoryStore::default(), "https://walls.test/");
        let owner = ctx.backend.sign_up("owner", "correct horse").await.unwrap();
        (ctx, owner)
    }

    #[tokio::test]
    async fn create_wall_ensures_profile_first() {
        let (ctx, owner) = context().await;

        let wall = ctx.create_wall(Some(&owner), "  Feedback  ", Some("   ")).await.unwrap();
        assert_eq!(wall.title, "Feedback");
        assert!(!wall.protected);
        assert_eq!(ctx.backend.profiles(), 1);

        ctx.create_wall(Some(&owner), "Secret", Some("abc123")).await.unwrap();
        assert_eq!(ctx.backend.profiles(), 1);
    }

    #[tokio::test]
    async fn local_validation_makes_no_call() {
        let (ctx, owner) = context().await;

        assert!(matches!(
            ctx.create_wall(Some(&owner), "   ", None).await,
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(
            ctx.create_wall(None, "Feedback", None).await,
            Err(ClientError::AuthenticationRequired)
        ));
        assert!(matches!(
            ctx.create_message(None, Uuid::new_v4(), " \n ", None).await,
            Err(ClientError::Validation(_))
        ));
        assert_eq!(ctx.backend.writes(), 0);
    }

    #[tokio::test]
    async fn comment_requires_a_session() {
        let (ctx, owner) = context().await;
        let wall = ctx.create_wall(Some(&owner), "Feedback", None).await.unwrap();
        let message = ctx.create_message(None, wall.id, "Great job!", None).await.unwrap();
        let writes = ctx.backend.writes();

        assert!(matches!(
            ctx.create_comment(None, wall.id, message.id, "thanks", None).await,
            Err(ClientError::AuthenticationRequired)
        ));
        assert_eq!(ctx.backend.writes(), writes);

        let comment = ctx.create_comment(Some(&owner), wall.id, message.id, " thanks ", None).await.unwrap();
        assert_eq!(comment.user_id, owner.account_id());
        assert_eq!(comment.content, "thanks");
    }

    #[tokio::test]
    async fn comment_on_protected_wall_needs_the_password() {
        let (ctx, owner) = context().await;
        let reader = ctx.backend.sign_up("reader", "correct horse").await.unwrap();
        let wall = ctx.create_wall(Some(&owner), "Secret", Some("abc123")).await.unwrap();
        let message = ctx.create_message(None, wall.id, "hello", Some("abc123")).await.unwrap();

        assert!(matches!(
            ctx.create_comment(Some(&reader), wall.id, message.id, "me too", None).await,
            Err(ClientError::IncorrectPassword)
        ));
        assert!(matches!(
            ctx.create_comment(Some(&reader), wall.id, message.id, "me too", Some("wrong")).await,
            Err(ClientError::IncorrectPassword)
        ));

        ctx.create_comment(Some(&reader), wall.id, message.id, "me too", Some("abc123")).await.unwrap();
        ctx.create_comment(Some(&owner), wall.id, message.id, "thanks", None).await.unwrap();
        let threads = ctx.load_threads(Some(&owner), wall.id, None).await.unwrap();
        assert_eq!(threads[0].comments.len(), 2);
    }

    #[tokio::test]
    async fn non_owner_delete_is_stopped_locally() {
        let (ctx, owner) = context().await;
        let stranger = ctx.backend.sign_up("stranger", "correct horse").await.unwrap();
        let wall = ctx.create_wall(Some(&owner), "Feedback", None).await.unwrap();
        let message = ctx.create_message(None, wall.id, "hello", None).await.unwrap();
        let writes = ctx.backend.writes();

        assert!(matches!(
            ctx.delete_message(Some(&stranger), &wall, message.id).await,
            Err(ClientError::Authorization)
        ));
        assert!(matches!(
            ctx.delete_wall(None, &wall).await,
            Err(ClientError::AuthenticationRequired)
        ));
        assert_eq!(ctx.backend.writes(), writes);
        assert_eq!(ctx.backend.messages(wall.id).len(), 1);
    }

    #[tokio::test]
    async fn mutations_invalidate_cached_threads() {
        let (ctx, owner) = context().await;
        let wall = ctx.create_wall(Some(&owner), "Feedback", None).await.unwrap();

        assert!(ctx.load_threads(Some(&owner), wall.id, None).await.unwrap().is_empty());
        assert!(ctx.threads.get(wall.id).is_some());

        let message = ctx.create_message(None, wall.id, "Great job!", None).await.unwrap();
        assert!(ctx.threads.get(wall.id).is_none());

        let threads = ctx.load_threads(Some(&owner), wall.id, None).await.unwrap();
        assert_eq!(threads.len(), 1);

        ctx.delete_message(Some(&owner), &wall, message.id).await.unwrap();
        assert!(ctx.load_threads(Some(&owner), wall.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_message_is_surfaced() {
        let (ctx, _) = context().await;
        let wall = ctx.backend.add_wall(Uuid::new_v4(), "Feedback", None);

        ctx.backend.fail_writes(true);
        let err = ctx.create_message(None, wall.id, "hello", None).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn delete_wall_goes_home_and_forgets_unlock() {
        let (ctx, owner) = context().await;
        let wall = ctx.create_wall(Some(&owner), "Secret", Some("abc123")).await.unwrap();
        ctx.cache.remember_unlock(wall.id, Some("abc123")).unwrap();

        let next = ctx.delete_wall(Some(&owner), &wall).await.unwrap();
        assert_eq!(next, Route::Landing);
        assert!(!ctx.cache.is_unlocked(wall.id));
        assert!(ctx.backend.get_wall(wall.id).await.unwrap().is_none());
    }
}

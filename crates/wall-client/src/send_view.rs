use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use wall_types::models::Wall;

use crate::access::AccessDecision;
use crate::backend::DataBackend;
use crate::cache::KeyValueStore;
use crate::context::AppContext;
use crate::error::Result;
use crate::shell::Route;
use crate::threads::MessageThread;
use crate::view::{Gate, ViewState};

/// `/send/:id`: the public submission form with a read-only preview of
/// the wall behind the same gate as the wall view.
pub struct SendView<B, S> {
    gate: Gate<B, S>,
    draft: String,
}

impl<B: DataBackend, S: KeyValueStore> SendView<B, S> {
    pub fn new(ctx: Arc<AppContext<B, S>>, wall_id: Uuid) -> Self {
        Self {
            gate: Gate::new(ctx, wall_id),
            draft: String::new(),
        }
    }

    pub async fn load(&mut self) -> Result<AccessDecision> {
        self.gate.load().await
    }

    pub async fn unlock(&mut self, candidate: &str) -> Result<AccessDecision> {
        self.gate.unlock(candidate).await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.gate.refresh().await
    }

    pub async fn session_changed(&mut self) -> Result<AccessDecision> {
        self.gate.reevaluate().await
    }

    pub fn state(&self) -> ViewState {
        self.gate.state
    }

    pub fn wall(&self) -> Option<&Wall> {
        self.gate.wall.as_ref()
    }

    pub fn preview(&self) -> &[MessageThread] {
        &self.gate.threads
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Post the draft. On success the draft is cleared and the viewer goes
    /// to the wall; on failure the draft is kept for another try.
    pub async fn submit(&mut self) -> Result<Route> {
        let wall_id = self.gate.wall_id();
        let session = self.gate.ctx.session();

        let message = self
            .gate
            .ctx
            .create_message(session.as_ref(), wall_id, &self.draft, self.gate.access.password())
            .await?;

        debug!("Sent message {} to wall {}", message.id, wall_id);
        self.draft.clear();
        Ok(Route::Wall(wall_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::error::ClientError;
    use crate::testing::StubBackend;

    fn context() -> Arc<AppContext<StubBackend, MemoryStore>> {
        Arc::new(AppContext::new(StubBackend::default(), MemoryStore::default(), "https://walls.test"))
    }

    #[tokio::test]
    async fn submit_clears_draft_and_goes_to_the_wall() {
        let ctx = context();
        let wall = ctx.backend.add_wall(Uuid::new_v4(), "Feedback", None);

        let mut view = SendView::new(ctx.clone(), wall.id);
        assert_eq!(view.load().await.unwrap(), AccessDecision::Visible);

        view.set_draft("  Great job!  ");
        assert_eq!(view.submit().await.unwrap(), Route::Wall(wall.id));
        assert!(view.draft().is_empty());
        assert_eq!(ctx.backend.messages(wall.id)[0].content, "Great job!");
    }

    #[tokio::test]
    async fn failed_submit_keeps_the_draft() {
        let ctx = context();
        let wall = ctx.backend.add_wall(Uuid::new_v4(), "Feedback", None);
        let mut view = SendView::new(ctx.clone(), wall.id);
        view.load().await.unwrap();

        view.set_draft("   ");
        assert!(matches!(view.submit().await, Err(ClientError::Validation(_))));

        ctx.backend.fail_writes(true);
        view.set_draft("hello");
        assert!(matches!(view.submit().await, Err(ClientError::Backend(_))));
        assert_eq!(view.draft(), "hello");
    }

    #[tokio::test]
    async fn protected_wall_needs_unlock_before_sending() {
        let ctx = context();
        let wall = ctx.backend.add_wall(Uuid::new_v4(), "Secret", Some("abc123"));
        let mut view = SendView::new(ctx.clone(), wall.id);
        assert_eq!(view.load().await.unwrap(), AccessDecision::Locked);

        view.set_draft("let me in");
        assert!(matches!(view.submit().await, Err(ClientError::IncorrectPassword)));
        assert_eq!(view.draft(), "let me in");

        view.unlock("abc123").await.unwrap();
        assert_eq!(view.state(), ViewState::Ready);
        view.submit().await.unwrap();
        assert_eq!(view.preview().len(), 0);
        view.refresh().await.unwrap();
        assert_eq!(view.preview().len(), 1);
    }
}

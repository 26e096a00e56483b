use std::sync::Arc;

use uuid::Uuid;

use wall_types::models::Wall;

use crate::access::{AccessDecision, AccessState};
use crate::backend::DataBackend;
use crate::cache::KeyValueStore;
use crate::context::AppContext;
use crate::error::{ClientError, Result};
use crate::shell::Route;
use crate::threads::MessageThread;
use crate::view::{Gate, ViewState};

/// `/wall/:id`: header, messages newest first, comment threads and the
/// owner's moderation actions.
pub struct WallView<B, S> {
    gate: Gate<B, S>,
}

impl<B: DataBackend, S: KeyValueStore> WallView<B, S> {
    pub fn new(ctx: Arc<AppContext<B, S>>, wall_id: Uuid) -> Self {
        Self {
            gate: Gate::new(ctx, wall_id),
        }
    }

    /// Fetch the wall, decide access, fetch threads when readable and
    /// record the visit.
    pub async fn load(&mut self) -> Result<AccessDecision> {
        let decision = self.gate.load().await?;
        if let Some(wall) = &self.gate.wall {
            let session = self.gate.ctx.session();
            let authenticated = self.gate.access.state().is_authenticated();
            self.gate.ctx.record_visit(session.as_ref(), wall, authenticated).await;
        }
        Ok(decision)
    }

    pub async fn unlock(&mut self, candidate: &str) -> Result<AccessDecision> {
        self.gate.unlock(candidate).await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.gate.refresh().await
    }

    /// Re-run the access decision after a sign-in or sign-out.
    pub async fn session_changed(&mut self) -> Result<AccessDecision> {
        self.gate.reevaluate().await
    }

    pub fn state(&self) -> ViewState {
        self.gate.state
    }

    pub fn access_state(&self) -> AccessState {
        self.gate.access.state()
    }

    pub fn wall(&self) -> Option<&Wall> {
        self.gate.wall.as_ref()
    }

    pub fn threads(&self) -> &[MessageThread] {
        &self.gate.threads
    }

    pub fn can_delete_messages(&self) -> bool {
        let account_id = self.gate.ctx.session().map(|s| s.account_id());
        self.wall().is_some_and(|w| w.is_owned_by(account_id))
    }

    pub fn can_comment(&self) -> bool {
        self.gate.state == ViewState::Ready && self.gate.ctx.session().is_some()
    }

    pub fn share_url(&self) -> String {
        self.gate.ctx.share_url(self.gate.wall_id())
    }

    pub async fn delete_message(&mut self, message_id: Uuid) -> Result<()> {
        let wall = self.loaded_wall()?;
        let session = self.gate.ctx.session();
        self.gate.ctx.delete_message(session.as_ref(), &wall, message_id).await?;
        self.gate.refresh().await
    }

    pub async fn add_comment(&mut self, message_id: Uuid, content: &str) -> Result<()> {
        let session = self.gate.ctx.session();
        self.gate
            .ctx
            .create_comment(
                session.as_ref(),
                self.gate.wall_id(),
                message_id,
                content,
                self.gate.access.password(),
            )
            .await?;
        self.gate.refresh().await
    }

    /// On success the wall is gone; navigate to the returned route.
    pub async fn delete_wall(&mut self) -> Result<Route> {
        let wall = self.loaded_wall()?;
        let session = self.gate.ctx.session();
        let next = self.gate.ctx.delete_wall(session.as_ref(), &wall).await?;

        self.gate.wall = None;
        self.gate.threads.clear();
        self.gate.state = ViewState::Missing;
        Ok(next)
    }

    fn loaded_wall(&self) -> Result<Wall> {
        self.gate.wall.clone().ok_or_else(|| ClientError::NotFound("wall".into()))
    }
}

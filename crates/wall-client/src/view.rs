//! Loading and gating shared by the wall and send views.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use wall_types::models::Wall;

use crate::access::{AccessController, AccessDecision, AccessState};
use crate::backend::DataBackend;
use crate::cache::KeyValueStore;
use crate::context::AppContext;
use crate::error::{ClientError, Result};
use crate::threads::MessageThread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Wall record or its threads still outstanding.
    Loading,
    /// Protected and not unlocked: show the password form.
    Locked,
    Ready,
    /// The wall does not exist.
    Missing,
}

pub(crate) struct Gate<B, S> {
    pub ctx: Arc<AppContext<B, S>>,
    pub access: AccessController,
    pub wall: Option<Wall>,
    pub threads: Vec<MessageThread>,
    pub state: ViewState,
}

impl<B: DataBackend, S: KeyValueStore> Gate<B, S> {
    pub fn new(ctx: Arc<AppContext<B, S>>, wall_id: Uuid) -> Self {
        Self {
            ctx,
            access: AccessController::new(wall_id),
            wall: None,
            threads: Vec::new(),
            state: ViewState::Loading,
        }
    }

    pub fn wall_id(&self) -> Uuid {
        self.access.wall_id()
    }

    /// Opening a view always reads the wall's content fresh; the thread
    /// cache only serves re-renders within the open view.
    pub async fn load(&mut self) -> Result<AccessDecision> {
        self.state = ViewState::Loading;
        self.ctx.threads.invalidate(self.wall_id());
        self.wall = self.ctx.backend.get_wall(self.wall_id()).await?;
        self.reevaluate().await
    }

    /// Decide again with the current session and fetch threads if the
    /// wall became readable.
    pub async fn reevaluate(&mut self) -> Result<AccessDecision> {
        let account_id = self.ctx.session().map(|s| s.account_id());
        let decision = self.access.decide(self.wall.as_ref(), account_id, &self.ctx.cache);

        match decision {
            AccessDecision::Visible => self.fetch_threads().await,
            AccessDecision::Locked => {
                self.threads.clear();
                self.state = ViewState::Locked;
                Ok(decision)
            }
            AccessDecision::Redirect(_) => {
                self.threads.clear();
                self.state = ViewState::Missing;
                Ok(decision)
            }
        }
    }

    pub async fn unlock(&mut self, candidate: &str) -> Result<AccessDecision> {
        if self.wall.is_none() {
            return Err(ClientError::NotFound("wall".into()));
        }
        self.access.submit_password(&self.ctx.backend, &self.ctx.cache, candidate).await?;
        self.fetch_threads().await
    }

    /// Drop the cached threads and read them again.
    pub async fn refresh(&mut self) -> Result<()> {
        if self.access.state().is_visible() {
            self.ctx.threads.invalidate(self.wall_id());
            self.fetch_threads().await?;
        }
        Ok(())
    }

    async fn fetch_threads(&mut self) -> Result<AccessDecision> {
        let session = self.ctx.session();
        let fetched = self
            .ctx
            .load_threads(session.as_ref(), self.wall_id(), self.access.password())
            .await;

        match fetched {
            Ok(threads) => {
                debug!("Wall {} ready with {} threads", self.wall_id(), threads.len());
                self.threads = threads;
                self.state = ViewState::Ready;
                Ok(AccessDecision::Visible)
            }
            // The cached password no longer opens the wall.
            Err(ClientError::IncorrectPassword) if self.access.state() == AccessState::UnlockedVisible => {
                warn!("Cached password for wall {} was rejected", self.wall_id());
                self.access.lock(&self.ctx.cache)?;
                self.threads.clear();
                self.state = ViewState::Locked;
                Ok(AccessDecision::Locked)
            }
            Err(e) => Err(e),
        }
    }
}

use tracing::debug;
use uuid::Uuid;

use crate::backend::DataBackend;
use crate::cache::{KeyValueStore, SessionCache};
use crate::error::Result;
use crate::session::{Session, SessionHub};
use crate::threads::{MessageThread, ThreadCache, build_threads};

/// Everything the views share: the backend, the device cache, the single
/// session owner and the thread cache. Views hold it behind an `Arc`.
pub struct AppContext<B, S> {
    pub backend: B,
    pub cache: SessionCache<S>,
    pub sessions: SessionHub,
    pub threads: ThreadCache,
    public_url: String,
}

impl<B: DataBackend, S: KeyValueStore> AppContext<B, S> {
    pub fn new(backend: B, store: S, public_url: impl Into<String>) -> Self {
        Self {
            backend,
            cache: SessionCache::new(store),
            sessions: SessionHub::new(),
            threads: ThreadCache::default(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.sessions.current()
    }

    /// Link handed to anonymous senders.
    pub fn share_url(&self, wall_id: Uuid) -> String {
        format!("{}/send/{}", self.public_url, wall_id)
    }

    /// Messages (newest first) with their comments, served from the thread
    /// cache when a previous read is still valid.
    pub async fn load_threads(
        &self,
        session: Option<&Session>,
        wall_id: Uuid,
        password: Option<&str>,
    ) -> Result<Vec<MessageThread>> {
        if let Some(threads) = self.threads.get(wall_id) {
            return Ok(threads);
        }

        let (messages, comments) = tokio::try_join!(
            self.backend.get_wall_messages(session, wall_id, password),
            self.backend.get_wall_comments(session, wall_id, password),
        )?;
        debug!(
            "Fetched {} messages and {} comments for wall {}",
            messages.len(),
            comments.len(),
            wall_id
        );

        let threads = build_threads(messages, comments);
        self.threads.put(wall_id, threads.clone());
        Ok(threads)
    }
}

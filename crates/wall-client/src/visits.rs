use std::collections::HashSet;

use tracing::{debug, warn};

use wall_types::api::UpsertWallVisitRequest;
use wall_types::models::{Wall, WallVisit};

use crate::backend::DataBackend;
use crate::cache::KeyValueStore;
use crate::context::AppContext;
use crate::error::{ClientError, Result};
use crate::session::Session;

pub const RECENT_WALLS_LIMIT: usize = 5;

/// Keep the first (newest) visit per wall.
pub fn dedupe_by_wall(visits: Vec<WallVisit>) -> Vec<WallVisit> {
    let mut seen = HashSet::new();
    visits.into_iter().filter(|v| seen.insert(v.wall_id)).collect()
}

impl<B: DataBackend, S: KeyValueStore> AppContext<B, S> {
    /// Best-effort recency telemetry. Never fails the caller.
    /// `authenticated` says whether the viewer got past the wall's password
    /// gate, not whether they are signed in.
    pub async fn record_visit(&self, session: Option<&Session>, wall: &Wall, authenticated: bool) {
        if let Err(e) = self.try_record_visit(session, wall, authenticated).await {
            warn!("{}", e);
        }
    }

    async fn try_record_visit(&self, session: Option<&Session>, wall: &Wall, authenticated: bool) -> Result<()> {
        let (user_id, visitor_id) = match session {
            Some(session) => (Some(session.account_id()), None),
            None => (None, Some(self.cache.visitor_id().map_err(telemetry)?)),
        };

        let visit = UpsertWallVisitRequest {
            wall_id: wall.id,
            title: wall.title.clone(),
            is_authenticated: authenticated,
            user_id,
            visitor_id,
        };
        self.backend
            .upsert_wall_visit(session, &visit)
            .await
            .map_err(telemetry)?;

        debug!("Recorded visit to wall {}", wall.id);
        Ok(())
    }

    /// The viewer's latest walls, newest first, one entry per wall.
    pub async fn recent_walls(&self, session: Option<&Session>) -> Result<Vec<WallVisit>> {
        let visitor_id = match session {
            Some(_) => None,
            None => Some(self.cache.visitor_id()?),
        };

        // Ask for extra rows so deduplication still fills the list.
        let fetched = self
            .backend
            .recent_visits(session, visitor_id, (RECENT_WALLS_LIMIT * 2) as u32)
            .await?;

        let mut recent = dedupe_by_wall(fetched);
        recent.truncate(RECENT_WALLS_LIMIT);
        Ok(recent)
    }
}

fn telemetry(e: ClientError) -> ClientError {
    ClientError::Telemetry(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use crate::cache::MemoryStore;
    use crate::testing::StubBackend;

    fn visit(wall_id: Uuid, age_secs: i64) -> WallVisit {
        WallVisit {
            id: Uuid::new_v4(),
            wall_id,
            title: "wall".into(),
            last_visited: Utc::now() - Duration::seconds(age_secs),
            is_authenticated: false,
            user_id: None,
            visitor_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn dedupe_keeps_newest_per_wall() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let newest_a = visit(a, 1);
        let visits = vec![newest_a.clone(), visit(b, 5), visit(a, 10)];

        let deduped = dedupe_by_wall(visits);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0], newest_a);
        assert_eq!(deduped[1].wall_id, b);
    }

    #[tokio::test]
    async fn anonymous_visits_upsert_under_the_visitor_id() {
        let ctx = AppContext::new(StubBackend::default(), MemoryStore::default(), "https://walls.test");
        let wall = ctx.backend.add_wall(Uuid::new_v4(), "Feedback", None);

        ctx.record_visit(None, &wall, false).await;
        ctx.record_visit(None, &wall, true).await;

        let visits = ctx.backend.visits();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].visitor_id, Some(ctx.cache.visitor_id().unwrap()));
        assert!(visits[0].is_authenticated);

        let recent = ctx.recent_walls(None).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].wall_id, wall.id);
    }

    #[tokio::test]
    async fn signed_in_visits_use_the_account() {
        let ctx = AppContext::new(StubBackend::default(), MemoryStore::default(), "https://walls.test");
        let session = ctx.backend.sign_up("alice", "correct horse").await.unwrap();
        let wall = ctx.backend.add_wall(Uuid::new_v4(), "Feedback", None);

        ctx.record_visit(Some(&session), &wall, false).await;
        let visits = ctx.backend.visits();
        assert_eq!(visits[0].user_id, Some(session.account_id()));
        assert!(visits[0].visitor_id.is_none());
        assert!(!visits[0].is_authenticated);

        // The anonymous list is a different identity.
        assert!(ctx.recent_walls(None).await.unwrap().is_empty());
        assert_eq!(ctx.recent_walls(Some(&session)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recent_walls_caps_at_five() {
        let ctx = AppContext::new(StubBackend::default(), MemoryStore::default(), "https://walls.test");
        for i in 0..7 {
            let wall = ctx.backend.add_wall(Uuid::new_v4(), &format!("wall {}", i), None);
            ctx.record_visit(None, &wall, false).await;
        }
        assert_eq!(ctx.recent_walls(None).await.unwrap().len(), RECENT_WALLS_LIMIT);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let ctx = AppContext::new(StubBackend::default(), MemoryStore::default(), "https://walls.test");
        let wall = ctx.backend.add_wall(Uuid::new_v4(), "Feedback", None);

        ctx.backend.fail_visits(true);
        ctx.record_visit(None, &wall, false).await;
        assert!(ctx.backend.visits().is_empty());
    }
}

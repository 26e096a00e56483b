//! Top-level navigation: route parsing, the signed-in guard, sign-in flows
//! and the landing and create views.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};
use url::form_urlencoded;
use uuid::Uuid;

use wall_types::models::{Wall, WallVisit};

use crate::backend::DataBackend;
use crate::cache::KeyValueStore;
use crate::context::AppContext;
use crate::error::{ClientError, Result};
use crate::send_view::SendView;
use crate::session::Session;
use crate::wall_view::WallView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Create,
    Wall(Uuid),
    Send(Uuid),
    Login,
    NotFound,
}

impl Route {
    /// Parse a client path. Query strings and fragments are ignored.
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Landing,
            ["create"] => Route::Create,
            ["login"] => Route::Login,
            ["wall", id] => id.parse().map_or(Route::NotFound, Route::Wall),
            ["send", id] => id.parse().map_or(Route::NotFound, Route::Send),
            _ => Route::NotFound,
        }
    }

    pub fn requires_session(self) -> bool {
        matches!(self, Route::Create)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Landing => write!(f, "/"),
            Route::Create => write!(f, "/create"),
            Route::Wall(id) => write!(f, "/wall/{}", id),
            Route::Send(id) => write!(f, "/send/{}", id),
            Route::Login => write!(f, "/login"),
            Route::NotFound => write!(f, "/404"),
        }
    }
}

/// Data for `/`.
#[derive(Debug, Clone, Default)]
pub struct Landing {
    /// Walls owned by the signed-in account, newest first.
    pub owned: Vec<Wall>,
    pub recent: Vec<WallVisit>,
}

/// Application root. Owns the only session subscription; views receive
/// the session explicitly through the shared context.
pub struct Shell<B, S> {
    ctx: Arc<AppContext<B, S>>,
}

impl<B: DataBackend, S: KeyValueStore> Shell<B, S> {
    pub fn new(ctx: AppContext<B, S>) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn context(&self) -> &Arc<AppContext<B, S>> {
        &self.ctx
    }

    pub fn session(&self) -> Option<Session> {
        self.ctx.session()
    }

    pub fn session_changes(&self) -> watch::Receiver<Option<Session>> {
        self.ctx.sessions.subscribe()
    }

    /// Route for `path`, after applying the signed-in guard.
    pub fn resolve(&self, path: &str) -> Route {
        let route = Route::parse(path);
        if route.requires_session() && self.ctx.session().is_none() {
            return Route::Login;
        }
        route
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Session> {
        let session = self.ctx.backend.sign_in(username.trim(), password).await?;
        self.ctx.sessions.set(session.clone());
        Ok(session)
    }

    pub async fn sign_up(&self, username: &str, password: &str) -> Result<Session> {
        let session = self.ctx.backend.sign_up(username.trim(), password).await?;
        self.ctx.sessions.set(session.clone());
        Ok(session)
    }

    pub fn sign_out(&self) {
        self.ctx.sessions.sign_out();
    }

    /// Finish a redirect-based sign-in: the provider hands back
    /// `#access_token=...&...` and the token is exchanged for a session.
    pub async fn complete_redirect_sign_in(&self, fragment: &str) -> Result<Session> {
        let fragment = fragment.trim_start_matches('#');
        let token = form_urlencoded::parse(fragment.as_bytes())
            .find(|(key, _)| key == "access_token")
            .map(|(_, value)| value.into_owned())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ClientError::Validation("Sign-in redirect carried no access token".into()))?;

        let session = self.ctx.backend.session_from_token(&token).await?;
        self.ctx.sessions.set(session.clone());
        info!("Completed redirect sign-in for {}", session.account.username);
        Ok(session)
    }

    /// Owned walls need a session; the recent list is a convenience and an
    /// error there only empties it.
    pub async fn landing(&self) -> Result<Landing> {
        let session = self.ctx.session();

        let owned = match &session {
            Some(session) => self.ctx.backend.list_walls(session).await?,
            None => Vec::new(),
        };

        let recent = match self.ctx.recent_walls(session.as_ref()).await {
            Ok(recent) => recent,
            Err(e) => {
                warn!("Failed to load recent walls: {}", e);
                Vec::new()
            }
        };

        Ok(Landing { owned, recent })
    }

    /// `/create` submission. Returns the new wall's route.
    pub async fn create_wall(&self, title: &str, password: Option<&str>) -> Result<Route> {
        let session = self.ctx.session();
        let wall = self.ctx.create_wall(session.as_ref(), title, password).await?;
        Ok(Route::Wall(wall.id))
    }

    pub fn wall_view(&self, wall_id: Uuid) -> WallView<B, S> {
        WallView::new(self.ctx.clone(), wall_id)
    }

    pub fn send_view(&self, wall_id: Uuid) -> SendView<B, S> {
        SendView::new(self.ctx.clone(), wall_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::testing::StubBackend;

    fn shell() -> Shell<StubBackend, MemoryStore> {
        Shell::new(AppContext::new(StubBackend::default(), MemoryStore::default(), "https://walls.test"))
    }

    #[test]
    fn parses_client_routes() {
        let id = Uuid::new_v4();
        assert_eq!(Route::parse("/"), Route::Landing);
        assert_eq!(Route::parse(""), Route::Landing);
        assert_eq!(Route::parse("/create"), Route::Create);
        assert_eq!(Route::parse("/login?next=/create"), Route::Login);
        assert_eq!(Route::parse(&format!("/wall/{}", id)), Route::Wall(id));
        assert_eq!(Route::parse(&format!("/send/{}/", id)), Route::Send(id));
        assert_eq!(Route::parse("/wall/not-a-uuid"), Route::NotFound);
        assert_eq!(Route::parse("/walls"), Route::NotFound);
        assert_eq!(Route::Wall(id).to_string(), format!("/wall/{}", id));
    }

    #[tokio::test]
    async fn create_is_guarded() {
        let shell = shell();
        assert_eq!(shell.resolve("/create"), Route::Login);

        shell.sign_up("alice", "correct horse").await.unwrap();
        assert_eq!(shell.resolve("/create"), Route::Create);

        shell.sign_out();
        assert_eq!(shell.resolve("/create"), Route::Login);
    }

    #[tokio::test]
    async fn redirect_sign_in_reads_the_fragment() {
        let shell = shell();
        let session = shell.context().backend.sign_up("alice", "correct horse").await.unwrap();
        assert!(shell.session().is_none());

        let fragment = format!("#access_token={}&token_type=bearer&expires_in=3600", session.access_token);
        let restored = shell.complete_redirect_sign_in(&fragment).await.unwrap();
        assert_eq!(restored, session);
        assert_eq!(shell.session(), Some(session));

        assert!(matches!(
            shell.complete_redirect_sign_in("#error=access_denied").await,
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn landing_lists_owned_and_recent_walls() {
        let shell = shell();
        assert!(shell.landing().await.unwrap().owned.is_empty());

        shell.sign_up("alice", "correct horse").await.unwrap();
        let first = shell.create_wall("First", None).await.unwrap();
        let second = shell.create_wall("Second", Some("abc123")).await.unwrap();

        let Route::Wall(second_id) = second else {
            panic!("expected a wall route, got {}", second);
        };
        shell.wall_view(second_id).load().await.unwrap();

        let landing = shell.landing().await.unwrap();
        let owned: Vec<Route> = landing.owned.iter().map(|w| Route::Wall(w.id)).collect();
        assert_eq!(owned, [second, first]);
        assert_eq!(landing.recent.len(), 1);
        assert_eq!(landing.recent[0].wall_id, second_id);
    }
}

//! Per-wall visibility decisions.
//!
//! The controller never compares passwords itself. A wall becomes
//! readable for a non-owner only after the backend confirmed the password,
//! and the confirmed password is kept so protected reads can re-send it.

use tracing::{debug, info, warn};
use uuid::Uuid;

use wall_types::models::Wall;

use crate::backend::DataBackend;
use crate::cache::{KeyValueStore, SessionCache};
use crate::error::{ClientError, Result};
use crate::shell::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    Loading,
    PublicVisible,
    OwnerVisible,
    UnlockedVisible,
    Locked,
}

impl AccessState {
    pub fn is_visible(self) -> bool {
        matches!(
            self,
            AccessState::PublicVisible | AccessState::OwnerVisible | AccessState::UnlockedVisible
        )
    }

    /// Got past a password gate, by ownership or the password. Public walls
    /// have no gate to pass.
    pub fn is_authenticated(self) -> bool {
        matches!(self, AccessState::OwnerVisible | AccessState::UnlockedVisible)
    }
}

/// What a view should do after consulting the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Visible,
    Locked,
    Redirect(Route),
}

pub struct AccessController {
    wall_id: Uuid,
    state: AccessState,
    password: Option<String>,
}

impl AccessController {
    pub fn new(wall_id: Uuid) -> Self {
        Self {
            wall_id,
            state: AccessState::Loading,
            password: None,
        }
    }

    pub fn wall_id(&self) -> Uuid {
        self.wall_id
    }

    pub fn state(&self) -> AccessState {
        self.state
    }

    /// Verified password to send along with protected reads, if any.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Re-run the decision rule. Call whenever the wall record or the
    /// signed-in account changes.
    pub fn evaluate<S: KeyValueStore>(
        &mut self,
        wall: &Wall,
        account_id: Option<Uuid>,
        cache: &SessionCache<S>,
    ) -> AccessState {
        self.state = if !wall.protected {
            AccessState::PublicVisible
        } else if wall.is_owned_by(account_id) {
            if let Err(e) = cache.remember_unlock(wall.id, None) {
                warn!("Failed to persist owner unlock for wall {}: {}", wall.id, e);
            }
            AccessState::OwnerVisible
        } else if self.state == AccessState::UnlockedVisible && self.password.is_some() {
            AccessState::UnlockedVisible
        } else if cache.is_unlocked(wall.id) {
            match cache.cached_password(wall.id) {
                Some(password) => {
                    self.password = Some(password);
                    AccessState::UnlockedVisible
                }
                None => {
                    debug!("Dropping stale unlock flag for wall {}", wall.id);
                    if let Err(e) = cache.forget(wall.id) {
                        warn!("Failed to clear stale unlock for wall {}: {}", wall.id, e);
                    }
                    AccessState::Locked
                }
            }
        } else {
            AccessState::Locked
        };

        self.state
    }

    /// Decision for a possibly missing wall. A wall that does not exist
    /// (or no longer exists) sends the viewer back to the landing page.
    pub fn decide<S: KeyValueStore>(
        &mut self,
        wall: Option<&Wall>,
        account_id: Option<Uuid>,
        cache: &SessionCache<S>,
    ) -> AccessDecision {
        let Some(wall) = wall else {
            self.state = AccessState::Loading;
            return AccessDecision::Redirect(Route::Landing);
        };

        if self.evaluate(wall, account_id, cache).is_visible() {
            AccessDecision::Visible
        } else {
            AccessDecision::Locked
        }
    }

    /// Ask the backend whether `candidate` opens this wall. Only a positive
    /// answer touches the cache.
    pub async fn submit_password<B, S>(
        &mut self,
        backend: &B,
        cache: &SessionCache<S>,
        candidate: &str,
    ) -> Result<AccessState>
    where
        B: DataBackend,
        S: KeyValueStore,
    {
        if self.state.is_visible() {
            return Ok(self.state);
        }
        if candidate.is_empty() {
            return Err(ClientError::Validation("Password is required".into()));
        }

        let verified = match backend.check_wall_password(self.wall_id, candidate).await {
            Ok(verified) => verified,
            Err(e) => {
                warn!("Password check for wall {} failed: {}", self.wall_id, e);
                return Err(ClientError::Backend("Failed to verify password".into()));
            }
        };

        if !verified {
            debug!("Incorrect password for wall {}", self.wall_id);
            return Err(ClientError::IncorrectPassword);
        }

        if let Err(e) = cache.remember_unlock(self.wall_id, Some(candidate)) {
            warn!("Failed to persist unlock for wall {}: {}", self.wall_id, e);
        }
        self.password = Some(candidate.to_string());
        self.state = AccessState::UnlockedVisible;
        info!("Wall {} unlocked", self.wall_id);
        Ok(self.state)
    }

    /// Explicit invalidation: forget the device unlock and lock again.
    pub fn lock<S: KeyValueStore>(&mut self, cache: &SessionCache<S>) -> Result<()> {
        cache.forget(self.wall_id)?;
        self.password = None;
        if self.state == AccessState::UnlockedVisible {
            self.state = AccessState::Locked;
        }
        Ok(())
    }
}

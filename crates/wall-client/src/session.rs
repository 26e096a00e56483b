use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use wall_types::models::Account;

/// An authenticated backend session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub account: Account,
}

impl Session {
    pub fn account_id(&self) -> Uuid {
        self.account.id
    }
}

/// Single owner of the current session. Views read snapshots and
/// subscribe for changes; nothing else holds mutable session state.
pub struct SessionHub {
    tx: watch::Sender<Option<Session>>,
}

impl SessionHub {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    pub fn set(&self, session: Session) {
        info!("Signed in as {}", session.account.username);
        self.tx.send_replace(Some(session));
    }

    pub fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            info!("Signed out");
        }
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(name: &str) -> Session {
        Session {
            access_token: format!("token-{}", name),
            account: Account {
                id: Uuid::new_v4(),
                username: name.into(),
            },
        }
    }

    #[tokio::test]
    async fn subscribers_see_sign_in_and_sign_out() {
        let hub = SessionHub::new();
        let mut rx = hub.subscribe();
        assert!(hub.current().is_none());

        let alice = session("alice");
        hub.set(alice.clone());
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref(), Some(&alice));

        hub.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
        assert!(hub.current().is_none());
    }
}

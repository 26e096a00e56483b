//! In-memory backend for unit tests. Enforces the same ownership and
//! password rules as the HTTP service.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::Utc;
use uuid::Uuid;

use wall_types::api::UpsertWallVisitRequest;
use wall_types::models::{Account, Comment, Message, Profile, Wall, WallVisit};

use crate::backend::DataBackend;
use crate::error::{ClientError, Result};
use crate::session::Session;

#[derive(Default)]
struct Records {
    accounts: Vec<(Session, String)>,
    profiles: Vec<Profile>,
    walls: Vec<(Wall, Option<String>)>,
    messages: Vec<Message>,
    comments: Vec<Comment>,
    visits: Vec<WallVisit>,
}

#[derive(Default)]
pub(crate) struct StubBackend {
    records: Mutex<Records>,
    fail_password_checks: AtomicBool,
    fail_visits: AtomicBool,
    fail_writes: AtomicBool,
    password_checks: AtomicUsize,
    writes: AtomicUsize,
}

impl StubBackend {
    fn records(&self) -> std::sync::MutexGuard<'_, Records> {
        self.records.lock().unwrap()
    }

    pub fn add_wall(&self, owner_id: Uuid, title: &str, password: Option<&str>) -> Wall {
        let wall = Wall {
            id: Uuid::new_v4(),
            title: title.into(),
            owner_id,
            protected: password.is_some(),
            created_at: Utc::now(),
        };
        self.records().walls.push((wall.clone(), password.map(str::to_string)));
        wall
    }

    pub fn add_message(&self, wall_id: Uuid, content: &str) -> Message {
        let message = Message {
            id: Uuid::new_v4(),
            wall_id,
            content: content.into(),
            created_at: Utc::now(),
        };
        self.records().messages.push(message.clone());
        message
    }

    /// Change the stored password, as the owner would from another device.
    pub fn set_wall_password(&self, wall_id: Uuid, password: Option<&str>) {
        if let Some((wall, stored)) = self.records().walls.iter_mut().find(|(w, _)| w.id == wall_id) {
            wall.protected = password.is_some();
            *stored = password.map(str::to_string);
        }
    }

    pub fn fail_password_checks(&self, fail: bool) {
        self.fail_password_checks.store(fail, Ordering::SeqCst);
    }

    pub fn fail_visits(&self, fail: bool) {
        self.fail_visits.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn password_checks(&self) -> usize {
        self.password_checks.load(Ordering::SeqCst)
    }

    /// Number of mutating calls that reached the backend.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn visits(&self) -> Vec<WallVisit> {
        self.records().visits.clone()
    }

    pub fn messages(&self, wall_id: Uuid) -> Vec<Message> {
        self.records().messages.iter().filter(|m| m.wall_id == wall_id).cloned().collect()
    }

    pub fn profiles(&self) -> usize {
        self.records().profiles.len()
    }

    fn write(&self) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClientError::Backend("Request failed: connection reset".into()));
        }
        Ok(())
    }

    fn authorize_content(&self, session: Option<&Session>, wall_id: Uuid, password: Option<&str>) -> Result<()> {
        let records = self.records();
        let (wall, stored) = records
            .walls
            .iter()
            .find(|(w, _)| w.id == wall_id)
            .ok_or_else(|| ClientError::NotFound("wall".into()))?;

        match stored.as_deref() {
            None => Ok(()),
            Some(_) if wall.is_owned_by(session.map(Session::account_id)) => Ok(()),
            Some(stored) if password == Some(stored) => Ok(()),
            Some(_) => Err(ClientError::IncorrectPassword),
        }
    }

    fn require_owner(&self, session: &Session, wall_id: Uuid) -> Result<()> {
        let records = self.records();
        let (wall, _) = records
            .walls
            .iter()
            .find(|(w, _)| w.id == wall_id)
            .ok_or_else(|| ClientError::NotFound("wall".into()))?;
        if wall.is_owned_by(Some(session.account_id())) {
            Ok(())
        } else {
            Err(ClientError::Authorization)
        }
    }
}

impl DataBackend for StubBackend {
    async fn sign_up(&self, username: &str, password: &str) -> Result<Session> {
        let mut records = self.records();
        if records.accounts.iter().any(|(s, _)| s.account.username == username) {
            return Err(ClientError::Validation("Conflict: username is taken".into()));
        }
        let id = Uuid::new_v4();
        let session = Session {
            access_token: format!("token-{}", id),
            account: Account {
                id,
                username: username.into(),
            },
        };
        records.accounts.push((session.clone(), password.into()));
        Ok(session)
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<Session> {
        self.records()
            .accounts
            .iter()
            .find(|(s, p)| s.account.username == username && p == password)
            .map(|(s, _)| s.clone())
            .ok_or(ClientError::AuthenticationRequired)
    }

    async fn session_from_token(&self, access_token: &str) -> Result<Session> {
        self.records()
            .accounts
            .iter()
            .find(|(s, _)| s.access_token == access_token)
            .map(|(s, _)| s.clone())
            .ok_or(ClientError::AuthenticationRequired)
    }

    async fn ensure_profile(&self, session: &Session) -> Result<Profile> {
        self.write()?;
        let mut records = self.records();
        if let Some(profile) = records.profiles.iter().find(|p| p.id == session.account_id()) {
            return Ok(profile.clone());
        }
        let profile = Profile {
            id: session.account_id(),
            username: session.account.username.clone(),
            created_at: Utc::now(),
        };
        records.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn list_walls(&self, session: &Session) -> Result<Vec<Wall>> {
        let mut walls: Vec<Wall> = self
            .records()
            .walls
            .iter()
            .filter(|(w, _)| w.is_owned_by(Some(session.account_id())))
            .map(|(w, _)| w.clone())
            .collect();
        walls.reverse();
        Ok(walls)
    }

    async fn get_wall(&self, wall_id: Uuid) -> Result<Option<Wall>> {
        Ok(self
            .records()
            .walls
            .iter()
            .find(|(w, _)| w.id == wall_id)
            .map(|(w, _)| w.clone()))
    }

    async fn create_wall(&self, session: &Session, title: &str, password: Option<&str>) -> Result<Wall> {
        self.write()?;
        Ok(self.add_wall(session.account_id(), title, password))
    }

    async fn delete_wall(&self, session: &Session, wall_id: Uuid) -> Result<()> {
        self.write()?;
        self.require_owner(session, wall_id)?;

        let mut records = self.records();
        let message_ids: Vec<Uuid> = records
            .messages
            .iter()
            .filter(|m| m.wall_id == wall_id)
            .map(|m| m.id)
            .collect();
        records.walls.retain(|(w, _)| w.id != wall_id);
        records.messages.retain(|m| m.wall_id != wall_id);
        records.comments.retain(|c| !message_ids.contains(&c.message_id));
        records.visits.retain(|v| v.wall_id != wall_id);
        Ok(())
    }

    async fn insert_message(
        &self,
        session: Option<&Session>,
        wall_id: Uuid,
        content: &str,
        password: Option<&str>,
    ) -> Result<Message> {
        self.write()?;
        self.authorize_content(session, wall_id, password)?;
        Ok(self.add_message(wall_id, content))
    }

    async fn delete_message(&self, session: &Session, wall_id: Uuid, message_id: Uuid) -> Result<()> {
        self.write()?;
        self.require_owner(session, wall_id)?;

        let mut records = self.records();
        let before = records.messages.len();
        records.messages.retain(|m| !(m.id == message_id && m.wall_id == wall_id));
        if records.messages.len() == before {
            return Err(ClientError::NotFound("message".into()));
        }
        records.comments.retain(|c| c.message_id != message_id);
        Ok(())
    }

    async fn insert_comment(
        &self,
        session: &Session,
        message_id: Uuid,
        content: &str,
        password: Option<&str>,
    ) -> Result<Comment> {
        self.write()?;
        let wall_id = self
            .records()
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .map(|m| m.wall_id)
            .ok_or_else(|| ClientError::NotFound("message".into()))?;
        self.authorize_content(Some(session), wall_id, password)?;

        let comment = Comment {
            id: Uuid::new_v4(),
            message_id,
            user_id: session.account_id(),
            content: content.into(),
            created_at: Utc::now(),
        };
        self.records().comments.push(comment.clone());
        Ok(comment)
    }

    async fn check_wall_password(&self, wall_id: Uuid, candidate: &str) -> Result<bool> {
        self.password_checks.fetch_add(1, Ordering::SeqCst);
        if self.fail_password_checks.load(Ordering::SeqCst) {
            return Err(ClientError::Backend("Request failed: timed out".into()));
        }
        Ok(self
            .records()
            .walls
            .iter()
            .find(|(w, _)| w.id == wall_id)
            .is_some_and(|(_, stored)| stored.as_deref().is_none_or(|p| p == candidate)))
    }

    async fn get_wall_messages(
        &self,
        session: Option<&Session>,
        wall_id: Uuid,
        password: Option<&str>,
    ) -> Result<Vec<Message>> {
        self.authorize_content(session, wall_id, password)?;
        let mut messages = self.messages(wall_id);
        messages.reverse();
        Ok(messages)
    }

    async fn get_wall_comments(
        &self,
        session: Option<&Session>,
        wall_id: Uuid,
        password: Option<&str>,
    ) -> Result<Vec<Comment>> {
        self.authorize_content(session, wall_id, password)?;
        let message_ids: Vec<Uuid> = self.messages(wall_id).iter().map(|m| m.id).collect();
        Ok(self
            .records()
            .comments
            .iter()
            .filter(|c| message_ids.contains(&c.message_id))
            .cloned()
            .collect())
    }

    async fn upsert_wall_visit(&self, session: Option<&Session>, visit: &UpsertWallVisitRequest) -> Result<()> {
        if self.fail_visits.load(Ordering::SeqCst) {
            return Err(ClientError::Backend("Request failed: connection refused".into()));
        }
        if visit.user_id.is_some() && visit.user_id != session.map(Session::account_id) {
            return Err(ClientError::Authorization);
        }

        let mut records = self.records();
        let existing = records
            .visits
            .iter_mut()
            .find(|v| v.wall_id == visit.wall_id && v.user_id == visit.user_id && v.visitor_id == visit.visitor_id);
        match existing {
            Some(existing) => {
                existing.title = visit.title.clone();
                existing.is_authenticated = visit.is_authenticated;
                existing.last_visited = Utc::now();
            }
            None => records.visits.push(WallVisit {
                id: Uuid::new_v4(),
                wall_id: visit.wall_id,
                title: visit.title.clone(),
                last_visited: Utc::now(),
                is_authenticated: visit.is_authenticated,
                user_id: visit.user_id,
                visitor_id: visit.visitor_id,
            }),
        }
        Ok(())
    }

    async fn recent_visits(
        &self,
        session: Option<&Session>,
        visitor_id: Option<Uuid>,
        limit: u32,
    ) -> Result<Vec<WallVisit>> {
        let user_id = session.map(Session::account_id);
        let mut visits: Vec<WallVisit> = self
            .records()
            .visits
            .iter()
            .filter(|v| (user_id.is_some() && v.user_id == user_id) || (visitor_id.is_some() && v.visitor_id == visitor_id))
            .cloned()
            .collect();
        visits.sort_by(|a, b| b.last_visited.cmp(&a.last_visited));
        visits.truncate(limit as usize);
        Ok(visits)
    }
}

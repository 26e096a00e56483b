//! Contract between the client logic and whatever hosts the wall records.
//!
//! Every call that acts for a signed-in account takes the [`Session`]
//! explicitly; there is no ambient auth state inside a backend.

use std::future::Future;

use uuid::Uuid;

use wall_types::api::UpsertWallVisitRequest;
use wall_types::models::{Comment, Message, Profile, Wall, WallVisit};

use crate::error::Result;
use crate::session::Session;

pub trait DataBackend: Send + Sync {
    // -- Authentication --

    fn sign_up(&self, username: &str, password: &str) -> impl Future<Output = Result<Session>> + Send;

    fn sign_in(&self, username: &str, password: &str) -> impl Future<Output = Result<Session>> + Send;

    /// Resolve an access token handed over by a redirect-based provider.
    fn session_from_token(&self, access_token: &str) -> impl Future<Output = Result<Session>> + Send;

    fn ensure_profile(&self, session: &Session) -> impl Future<Output = Result<Profile>> + Send;

    // -- Records --

    /// Walls owned by the session account, newest first.
    fn list_walls(&self, session: &Session) -> impl Future<Output = Result<Vec<Wall>>> + Send;

    /// `Ok(None)` when no wall has this id.
    fn get_wall(&self, wall_id: Uuid) -> impl Future<Output = Result<Option<Wall>>> + Send;

    fn create_wall(
        &self,
        session: &Session,
        title: &str,
        password: Option<&str>,
    ) -> impl Future<Output = Result<Wall>> + Send;

    fn delete_wall(&self, session: &Session, wall_id: Uuid) -> impl Future<Output = Result<()>> + Send;

    fn insert_message(
        &self,
        session: Option<&Session>,
        wall_id: Uuid,
        content: &str,
        password: Option<&str>,
    ) -> impl Future<Output = Result<Message>> + Send;

    fn delete_message(
        &self,
        session: &Session,
        wall_id: Uuid,
        message_id: Uuid,
    ) -> impl Future<Output = Result<()>> + Send;

    /// `password` is required when the message's wall is protected and
    /// the session does not own it.
    fn insert_comment(
        &self,
        session: &Session,
        message_id: Uuid,
        content: &str,
        password: Option<&str>,
    ) -> impl Future<Output = Result<Comment>> + Send;

    // -- Remote procedures --

    fn check_wall_password(&self, wall_id: Uuid, candidate: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Newest first.
    fn get_wall_messages(
        &self,
        session: Option<&Session>,
        wall_id: Uuid,
        password: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Message>>> + Send;

    /// Oldest first.
    fn get_wall_comments(
        &self,
        session: Option<&Session>,
        wall_id: Uuid,
        password: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Comment>>> + Send;

    fn upsert_wall_visit(
        &self,
        session: Option<&Session>,
        visit: &UpsertWallVisitRequest,
    ) -> impl Future<Output = Result<()>> + Send;

    fn recent_visits(
        &self,
        session: Option<&Session>,
        visitor_id: Option<Uuid>,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<WallVisit>>> + Send;
}

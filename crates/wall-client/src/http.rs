use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use wall_types::api::{
    AuthResponse, CheckWallPasswordRequest, CreateCommentRequest, CreateWallRequest, ErrorBody,
    LoginRequest, RegisterRequest, SendMessageRequest, UpsertWallVisitRequest, WallContentRequest,
    codes,
};
use wall_types::models::{Account, Comment, Message, Profile, Wall, WallVisit};

use crate::backend::DataBackend;
use crate::error::{ClientError, Result};
use crate::session::Session;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`DataBackend`] over the wall HTTP API.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    http: Client,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ClientError::Validation(format!("Invalid API URL {}: {}", base_url, e)))?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Backend(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn request(&self, method: Method, path: &str, session: Option<&Session>) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match session {
            Some(session) => builder.bearer_auth(&session.access_token),
            None => builder,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = checked(builder.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<()> {
        checked(builder.send().await?).await?;
        Ok(())
    }

    async fn authenticate(&self, path: &str, body: &impl Serialize) -> Result<Session> {
        let builder = self.request(Method::POST, path, None).json(body);
        let auth: AuthResponse = self.fetch(builder).await?;
        Ok(Session {
            access_token: auth.token,
            account: Account {
                id: auth.user_id,
                username: auth.username,
            },
        })
    }

    async fn wall_content<T: DeserializeOwned>(
        &self,
        procedure: &str,
        session: Option<&Session>,
        wall_id: Uuid,
        password: Option<&str>,
    ) -> Result<Vec<T>> {
        let body = WallContentRequest {
            wall_id,
            password: password.map(str::to_string),
        };
        self.fetch(self.request(Method::POST, procedure, session).json(&body)).await
    }
}

async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.json::<ErrorBody>().await.ok();
    debug!("Backend answered {} ({:?})", status, body.as_ref().map(|b| b.code.as_str()));
    Err(error_from_response(status, body))
}

/// Map a non-2xx answer onto the client taxonomy. The machine code wins
/// over the status because 403 covers both ownership and wrong passwords.
pub(crate) fn error_from_response(status: StatusCode, body: Option<ErrorBody>) -> ClientError {
    let code = body.as_ref().map(|b| b.code.as_str());
    let message = body.as_ref().map(|b| b.error.clone());

    match (code, status) {
        (Some(codes::INCORRECT_PASSWORD), _) => ClientError::IncorrectPassword,
        (Some(codes::UNAUTHORIZED), _) | (None, StatusCode::UNAUTHORIZED) => ClientError::AuthenticationRequired,
        (Some(codes::FORBIDDEN), _) | (None, StatusCode::FORBIDDEN) => ClientError::Authorization,
        (Some(codes::NOT_FOUND), _) | (None, StatusCode::NOT_FOUND) => {
            let what = message
                .as_deref()
                .map(|m| m.trim_end_matches(" not found").to_string())
                .unwrap_or_else(|| "record".into());
            ClientError::NotFound(what)
        }
        (Some(codes::BAD_REQUEST), _) | (Some(codes::CONFLICT), _) => {
            ClientError::Validation(message.unwrap_or_else(|| status.to_string()))
        }
        _ => ClientError::Backend(message.unwrap_or_else(|| format!("Backend returned {}", status))),
    }
}

impl DataBackend for HttpBackend {
    async fn sign_up(&self, username: &str, password: &str) -> Result<Session> {
        let body = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.authenticate("/auth/register", &body).await
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<Session> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.authenticate("/auth/login", &body).await
    }

    async fn session_from_token(&self, access_token: &str) -> Result<Session> {
        let account: Account = self
            .fetch(self.http.get(format!("{}/auth/session", self.base_url)).bearer_auth(access_token))
            .await?;
        Ok(Session {
            access_token: access_token.to_string(),
            account,
        })
    }

    async fn ensure_profile(&self, session: &Session) -> Result<Profile> {
        self.fetch(self.request(Method::POST, "/profiles", Some(session))).await
    }

    async fn list_walls(&self, session: &Session) -> Result<Vec<Wall>> {
        self.fetch(self.request(Method::GET, "/walls", Some(session))).await
    }

    async fn get_wall(&self, wall_id: Uuid) -> Result<Option<Wall>> {
        let path = format!("/walls/{}", wall_id);
        match self.fetch(self.request(Method::GET, &path, None)).await {
            Ok(wall) => Ok(Some(wall)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_wall(&self, session: &Session, title: &str, password: Option<&str>) -> Result<Wall> {
        let body = CreateWallRequest {
            title: title.to_string(),
            password: password.map(str::to_string),
        };
        self.fetch(self.request(Method::POST, "/walls", Some(session)).json(&body)).await
    }

    async fn delete_wall(&self, session: &Session, wall_id: Uuid) -> Result<()> {
        let path = format!("/walls/{}", wall_id);
        self.execute(self.request(Method::DELETE, &path, Some(session))).await
    }

    async fn insert_message(
        &self,
        session: Option<&Session>,
        wall_id: Uuid,
        content: &str,
        password: Option<&str>,
    ) -> Result<Message> {
        let path = format!("/walls/{}/messages", wall_id);
        let body = SendMessageRequest {
            content: content.to_string(),
            password: password.map(str::to_string),
        };
        self.fetch(self.request(Method::POST, &path, session).json(&body)).await
    }

    async fn delete_message(&self, session: &Session, wall_id: Uuid, message_id: Uuid) -> Result<()> {
        let path = format!("/walls/{}/messages/{}", wall_id, message_id);
        self.execute(self.request(Method::DELETE, &path, Some(session))).await
    }

    async fn insert_comment(
        &self,
        session: &Session,
        message_id: Uuid,
        content: &str,
        password: Option<&str>,
    ) -> Result<Comment> {
        let path = format!("/messages/{}/comments", message_id);
        let body = CreateCommentRequest {
            content: content.to_string(),
            password: password.map(str::to_string),
        };
        self.fetch(self.request(Method::POST, &path, Some(session)).json(&body)).await
    }

    async fn check_wall_password(&self, wall_id: Uuid, candidate: &str) -> Result<bool> {
        let body = CheckWallPasswordRequest {
            wall_id,
            candidate: candidate.to_string(),
        };
        self.fetch(self.request(Method::POST, "/rpc/check_wall_password", None).json(&body))
            .await
    }

    async fn get_wall_messages(
        &self,
        session: Option<&Session>,
        wall_id: Uuid,
        password: Option<&str>,
    ) -> Result<Vec<Message>> {
        self.wall_content("/rpc/get_wall_messages", session, wall_id, password).await
    }

    async fn get_wall_comments(
        &self,
        session: Option<&Session>,
        wall_id: Uuid,
        password: Option<&str>,
    ) -> Result<Vec<Comment>> {
        self.wall_content("/rpc/get_wall_comments", session, wall_id, password).await
    }

    async fn upsert_wall_visit(&self, session: Option<&Session>, visit: &UpsertWallVisitRequest) -> Result<()> {
        self.execute(self.request(Method::POST, "/rpc/upsert_wall_visit", session).json(visit))
            .await
    }

    async fn recent_visits(
        &self,
        session: Option<&Session>,
        visitor_id: Option<Uuid>,
        limit: u32,
    ) -> Result<Vec<WallVisit>> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(visitor_id) = visitor_id {
            query.push(("visitor_id", visitor_id.to_string()));
        }
        self.fetch(self.request(Method::GET, "/visits", session).query(&query)).await
    }
}

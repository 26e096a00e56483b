//! Client configuration loaded from environment variables.

use std::path::PathBuf;

use crate::cache::FileStore;
use crate::context::AppContext;
use crate::error::{ClientError, Result};
use crate::http::HttpBackend;
use crate::shell::Shell;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Env: `WALL_API_URL`
    /// Default: `http://127.0.0.1:3000`
    pub api_url: String,

    /// Base for share links handed to senders.
    /// Env: `WALL_PUBLIC_URL`
    /// Default: same as the API URL
    pub public_url: String,

    /// Device-local session cache file.
    /// Env: `WALL_CACHE_PATH`
    /// Default: `wall-session.json`
    pub cache_path: PathBuf,
}

impl ClientConfig {
    /// Reads `.env` when present, then the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("WALL_API_URL").unwrap_or_else(|| "http://127.0.0.1:3000".into());
        url::Url::parse(&api_url)
            .map_err(|e| ClientError::Validation(format!("WALL_API_URL is not a URL: {}", e)))?;

        let public_url = lookup("WALL_PUBLIC_URL").unwrap_or_else(|| api_url.clone());
        let cache_path = lookup("WALL_CACHE_PATH")
            .unwrap_or_else(|| "wall-session.json".into())
            .into();

        Ok(Self {
            api_url,
            public_url,
            cache_path,
        })
    }

    /// HTTP backend plus file-backed cache, wrapped in a shell.
    pub fn build_shell(&self) -> Result<Shell<HttpBackend, FileStore>> {
        let backend = HttpBackend::new(&self.api_url)?;
        let store = FileStore::open(&self.cache_path)?;
        Ok(Shell::new(AppContext::new(backend, store, self.public_url.clone())))
    }
}

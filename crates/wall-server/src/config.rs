//! Server configuration loaded from environment variables.
//!
//! Everything except the JWT secret has a default suitable for local runs.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct Config {
    /// HMAC secret for session tokens.
    /// Env: `WALL_JWT_SECRET` (required)
    pub jwt_secret: String,

    /// SQLite database file.
    /// Env: `WALL_DB_PATH`
    /// Default: `walls.db`
    pub db_path: PathBuf,

    /// Env: `WALL_HOST` / `WALL_PORT`
    /// Default: `0.0.0.0:3000`
    pub addr: SocketAddr,

    /// Session token lifetime in days.
    /// Env: `WALL_TOKEN_TTL_DAYS`
    /// Default: `30`
    pub token_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("WALL_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("WALL_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = lookup("WALL_DB_PATH").unwrap_or_else(|| "walls.db".into()).into();

        let host = lookup("WALL_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("WALL_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("WALL_PORT must be a port number")?;
        let addr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let token_ttl_days = match lookup("WALL_TOKEN_TTL_DAYS") {
            Some(v) => v.parse().context("WALL_TOKEN_TTL_DAYS must be a whole number")?,
            None => 30,
        };
        if token_ttl_days <= 0 {
            bail!("WALL_TOKEN_TTL_DAYS must be positive");
        }

        Ok(Self {
            jwt_secret,
            db_path,
            addr,
            token_ttl_days,
        })
    }
}

mod config;

use std::sync::Arc;

use tracing::info;

use wall_api::auth::{AppState, AppStateInner};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wall_server=debug,wall_api=debug,wall_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = wall_db::Database::open(&config.db_path)?;

    let mut inner = AppStateInner::new(db, config.jwt_secret.clone());
    inner.token_ttl = chrono::Duration::days(config.token_ttl_days);
    let state: AppState = Arc::new(inner);

    let app = wall_api::router(state);

    info!("Wall server listening on {}", config.addr);
    info!("Database: {}", config.db_path.display());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

mod auth;
mod config;
mod db;
mod error;
mod extractors;
mod moderation;
mod query;
mod routes;
mod state;
mod storage;

use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Config, DEFAULT_JWT_SECRET};
use crate::state::AppState;
use crate::storage::MediaStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;
    if config.auth.jwt_secret == DEFAULT_JWT_SECRET {
        tracing::warn!(
            "Running with the default JWT secret; set BITELOG_JWT_SECRET or [auth] jwt_secret"
        );
    }

    // Ensure uploads directory exists
    std::fs::create_dir_all(config.uploads_path())?;

    // Initialize database
    let pool = db::create_pool(config.db_path())?;
    db::run_migrations(&pool)?;

    // Build app state
    let media = MediaStore::new(config.uploads_path());
    let state = AppState {
        db: pool,
        config: config.clone(),
        media,
    };

    let app = routes::app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

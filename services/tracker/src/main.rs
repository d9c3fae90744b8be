use std::{path::Path, sync::Arc};

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod chart;
mod config;
mod error;
mod forms;
mod middleware;
mod models;
mod password;
mod repositories;
mod routes;
mod session;
mod state;
mod summary;
mod validation;
mod views;

#[cfg(test)]
mod test_utils;

use common::database;

use crate::{
    chart::ChartRenderer,
    config::{AppConfig, StorageBackend},
    repositories::MemoryStore,
    session::SessionManager,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting expense tracker");

    let config = AppConfig::from_env()?;
    let sessions = SessionManager::new(config.session_config());
    let charts = ChartRenderer::with_font_file(Path::new(&config.chart_font_path));

    let app_state = match config.storage {
        StorageBackend::Postgres => {
            // Initialize database connection pool
            let db_config = database::DatabaseConfig::from_env()?;
            let pool = database::init_pool(&db_config).await?;

            // Check database connectivity
            database::health_check(&pool).await?;
            info!("Database connection successful");

            database::run_migrations(&pool).await?;
            AppState::with_postgres(pool, sessions, charts)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; all data is lost on shutdown");
            AppState::with_memory(Arc::new(MemoryStore::new()), sessions, charts)
        }
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Expense tracker listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

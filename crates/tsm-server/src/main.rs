//! Timescale Manager Server - Main entry point

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tsm_common::logging::{init_logging, LogConfig};

use tsm_server::{
    api,
    config::Config,
    db::{self, DbConfig},
    features::FeatureState,
    ingest::PgUnitOfWorkProvider,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; LOG_* environment variables take precedence
    let log_config = LogConfig::builder()
        .log_file_prefix("tsm-server")
        .filter_directives("tsm_server=debug,tower_http=debug,sqlx=info")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting Timescale Manager server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}",
        config.bind_address()
    );

    let db_pool = db::create_pool(&DbConfig::from(&config.database)).await?;
    info!("Database connection pool established");

    db::run_migrations(&db_pool).await?;

    let state = FeatureState {
        db: db_pool.clone(),
        ingestion: Arc::new(PgUnitOfWorkProvider::new(db_pool)),
        limits: config.ingest,
    };
    info!(
        max_rows = config.ingest.max_rows,
        batch_size = config.ingest.batch_size,
        max_upload_bytes = config.ingest.max_upload_bytes,
        "Ingestion limits configured"
    );

    let app = api::create_router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;

    api::serve(listener, app, config.server.shutdown_timeout_secs).await
}

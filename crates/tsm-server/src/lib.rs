//! Timescale Manager Server Library
//!
//! HTTP server that ingests CSV measurement files into PostgreSQL and serves
//! per-file summaries and raw values.
//!
//! # Overview
//!
//! - **Ingestion**: streaming CSV parsing, row validation, summary
//!   aggregation and transactional, batched persistence ([`ingest`])
//! - **API Endpoints**: upload, results and values ([`features`])
//! - **Database Management**: PostgreSQL integration with SQLx ([`db`])
//! - **Configuration**: Environment-based configuration management ([`config`])
//! - **Middleware**: CORS, request logging and body limits ([`middleware`])
//!
//! # Architecture
//!
//! The server follows a **CQRS (Command Query Responsibility Segregation)** layout:
//!
//! - **Commands** (Write Operations): uploading a file is the only command.
//!   It runs inside a single unit of work; either the file, its records and
//!   its summary are all committed, or nothing is.
//! - **Queries** (Read Operations): listing files, listing and filtering
//!   summaries, and fetching the latest values of a file.
//!
//! ## Framework Stack
//!
//! - **Axum**: web framework
//! - **SQLx**: PostgreSQL access with runtime-checked queries
//! - **csv-async**: streaming CSV decoding
//! - **Tower**: middleware and service abstractions
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tsm_server::{api, config::Config, db, features::FeatureState, ingest::PgUnitOfWorkProvider};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&(&config.database).into()).await?;
//!     let state = FeatureState {
//!         db: pool.clone(),
//!         ingestion: Arc::new(PgUnitOfWorkProvider::new(pool)),
//!         limits: config.ingest,
//!     };
//!     let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
//!     api::serve(listener, api::create_router(state, &config), 5).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;

// Re-export commonly used types
pub use error::{AppError, AppResult};
pub use ingest::{IngestError, IngestReport, IngestionCoordinator};

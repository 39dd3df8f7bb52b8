//! Feature modules implementing the measurement API
//!
//! Each feature is a vertical slice with its own commands, queries and
//! routes, following the CQRS split used by the mediator registry.
//!
//! # Features
//!
//! - **files**: CSV upload (ingestion) and the list of uploaded files
//! - **results**: per-file summaries, listed or filtered
//! - **values**: most recent raw values of a file
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions

pub mod files;
pub mod results;
pub mod shared;
pub mod values;

use std::sync::Arc;

use axum::Router;

use crate::ingest::{IngestLimits, UnitOfWorkProvider};

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool for read queries
    pub db: sqlx::PgPool,
    /// Source of one unit of work per upload
    pub ingestion: Arc<dyn UnitOfWorkProvider>,
    pub limits: IngestLimits,
}

/// Creates the API router with all feature routes mounted
///
/// - `/files` - Upload and list files
/// - `/results` - Summaries
/// - `/values` - Raw values
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/files", files::files_routes().with_state(state.clone()))
        .nest("/results", results::results_routes().with_state(state.db.clone()))
        .nest("/values", values::values_routes().with_state(state.db.clone()))
}

//! Upload measurements command
//!
//! Hands one uploaded CSV to a fresh [`IngestionCoordinator`]. The file's
//! shape, every row and the storage writes are all checked inside the
//! coordinator's transaction, so this handler only wires things together.

use std::sync::Arc;

use axum::body::Bytes;
use mediator::Request;

use crate::ingest::{
    IngestError, IngestLimits, IngestReport, IngestionCoordinator, UnitOfWorkProvider, Upload,
};

#[derive(Debug, Clone)]
pub struct UploadMeasurementsCommand {
    /// Client-supplied file name, validated during ingestion
    pub file_name: String,
    pub content: Bytes,
}

impl Request<Result<IngestReport, IngestError>> for UploadMeasurementsCommand {}

impl crate::cqrs::middleware::Command for UploadMeasurementsCommand {}

#[tracing::instrument(
    skip(provider, limits, command),
    fields(file_name = %command.file_name, size = command.content.len())
)]
pub async fn handle(
    provider: Arc<dyn UnitOfWorkProvider>,
    limits: IngestLimits,
    command: UploadMeasurementsCommand,
) -> Result<IngestReport, IngestError> {
    let mut coordinator = IngestionCoordinator::new(provider.create(), limits);
    coordinator
        .ingest(Upload::from_bytes(command.file_name, command.content))
        .await
}

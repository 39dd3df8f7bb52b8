//! Ingestion coordinator
//!
//! Drives one upload through the pipeline inside a single transaction:
//!
//! ```text
//! Idle -> TransactionOpen -> FileMetadataPersisted -> RowsValidated
//!      -> SummaryPersisted -> RowsPersisting(1..n) -> Committed
//! ```
//!
//! Any failure after the transaction is opened moves to `RollingBack`, makes
//! exactly one rollback attempt and ends in `RolledBack`. The triggering
//! error is returned unless the rollback itself fails, in which case the
//! rollback error is returned instead.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::io::AsyncRead;
use tracing::{debug, error, info, warn};
use tsm_common::{MeasurementFile, MeasurementRecord, SummaryRecord};
use uuid::Uuid;

use super::aggregator::aggregate;
use super::config::IngestLimits;
use super::error::{IngestError, StorageError};
use super::parser::RecordParser;
use super::unit_of_work::UnitOfWork;
use super::upload::{validate_upload, Upload};
use super::validator::RecordValidator;

/// Observable pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Idle,
    TransactionOpen,
    FileMetadataPersisted,
    RowsValidated,
    SummaryPersisted,
    RowsPersisting { batch: usize, of: usize },
    Committed,
    RollingBack,
    RolledBack,
}

impl IngestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestState::Idle => "idle",
            IngestState::TransactionOpen => "transaction_open",
            IngestState::FileMetadataPersisted => "file_metadata_persisted",
            IngestState::RowsValidated => "rows_validated",
            IngestState::SummaryPersisted => "summary_persisted",
            IngestState::RowsPersisting { .. } => "rows_persisting",
            IngestState::Committed => "committed",
            IngestState::RollingBack => "rolling_back",
            IngestState::RolledBack => "rolled_back",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestState::Committed | IngestState::RolledBack)
    }
}

/// Outcome of a committed upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub file_id: Uuid,
    pub file_name: String,
    pub row_count: usize,
    pub batches: usize,
    pub summary: SummaryRecord,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(elapsed: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Single-use driver for one upload
pub struct IngestionCoordinator<U> {
    uow: U,
    limits: IngestLimits,
    state: IngestState,
    used: bool,
}

impl<U: UnitOfWork> IngestionCoordinator<U> {
    pub fn new(uow: U, limits: IngestLimits) -> Self {
        Self {
            uow,
            limits,
            state: IngestState::Idle,
            used: false,
        }
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Ingest one upload atomically
    #[tracing::instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.size))]
    pub async fn ingest<R>(&mut self, upload: Upload<R>) -> Result<IngestReport, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        if self.used {
            error!("Ingestion coordinator reused");
            return Err(StorageError::TransactionAlreadyOpen.into());
        }
        self.used = true;

        let started = Instant::now();
        self.uow.begin_transaction().await?;
        self.transition(IngestState::TransactionOpen);

        match self.run(upload, started).await {
            Ok(report) => {
                info!(
                    file_id = %report.file_id,
                    rows = report.row_count,
                    batches = report.batches,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Upload ingested"
                );
                Ok(report)
            }
            Err(err) => Err(self.abort(err).await),
        }
    }

    async fn run<R>(&mut self, upload: Upload<R>, started: Instant) -> Result<IngestReport, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        validate_upload(&upload.file_name, upload.size)?;

        let file = MeasurementFile::new(upload.file_name);
        let file_id = self.uow.add_file(&file).await?;
        self.uow.save_changes().await?;
        self.transition(IngestState::FileMetadataPersisted);

        let records = self.read_records(upload.body).await?;
        if records.is_empty() {
            return Err(IngestError::EmptyFile);
        }
        self.transition(IngestState::RowsValidated);

        let stats = aggregate(&records).inspect_err(|e| {
            error!(error = %e, "Aggregation contract violated");
        })?;
        let summary = stats.attach(file_id);
        self.uow.add_summary(&summary).await?;
        self.uow.save_changes().await?;
        self.transition(IngestState::SummaryPersisted);

        let row_count = records.len();
        let batches = self.persist_records(file_id, records).await?;

        self.uow.commit().await?;
        self.transition(IngestState::Committed);

        Ok(IngestReport {
            file_id,
            file_name: file.name,
            row_count,
            batches,
            summary,
            elapsed: started.elapsed(),
        })
    }

    async fn read_records<R>(&mut self, body: R) -> Result<Vec<MeasurementRecord>, IngestError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut parser = RecordParser::new(body);
        let mut validator = RecordValidator::new(self.limits.max_rows);
        let mut records = Vec::new();

        while let Some(parsed) = parser.next_row().await? {
            validator.validate(&parsed)?;
            records.push(parsed.record);
        }

        debug!(
            parsed = parser.rows_read(),
            accepted = validator.accepted(),
            "Rows parsed and validated"
        );
        Ok(records)
    }

    /// Write rows in fixed-size batches, consuming the buffer
    async fn persist_records(
        &mut self,
        file_id: Uuid,
        records: Vec<MeasurementRecord>,
    ) -> Result<usize, IngestError> {
        let batch_size = self.limits.batch_size;
        let total = self.limits.batch_count(records.len());

        for (index, batch) in records.chunks(batch_size).enumerate() {
            self.transition(IngestState::RowsPersisting {
                batch: index + 1,
                of: total,
            });
            self.uow.add_records_batch(file_id, batch).await?;
            self.uow.save_changes().await?;
            self.uow.detach_tracked();
        }

        Ok(total)
    }

    async fn abort(&mut self, err: IngestError) -> IngestError {
        if err.is_client_error() {
            warn!(code = err.code(), row = err.row(), error = %err, "Upload rejected");
        } else {
            error!(code = err.code(), error = %err, "Upload failed");
        }

        self.transition(IngestState::RollingBack);
        let outcome = self.uow.rollback().await;
        self.transition(IngestState::RolledBack);

        match outcome {
            Ok(()) => err,
            Err(rollback_err) => {
                error!(
                    error = %rollback_err,
                    original = %err,
                    "Rollback failed"
                );
                IngestError::Storage(rollback_err)
            }
        }
    }

    fn transition(&mut self, next: IngestState) {
        debug_assert!(!self.state.is_terminal(), "transition out of {:?}", self.state);
        debug!(from = self.state.as_str(), to = next.as_str(), "Ingestion state change");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::error::{FileRejection, InvalidKind};
    use crate::ingest::memory::{FailurePoint, MemoryStore, MemoryUnitOfWork};

    const SCENARIO_A: &str = "Date,ExecutionTime,Value\n\
        2024-01-01T10:00:00Z,100,50.5\n\
        2024-01-01T11:00:00Z,200,60.5\n";

    fn coordinator(store: &MemoryStore) -> IngestionCoordinator<MemoryUnitOfWork> {
        IngestionCoordinator::new(store.unit_of_work(), IngestLimits::default())
    }

    #[tokio::test]
    async fn test_happy_path_reaches_committed() {
        let store = MemoryStore::new();
        let mut coordinator = coordinator(&store);
        assert_eq!(coordinator.state(), IngestState::Idle);

        let report = coordinator
            .ingest(Upload::from_bytes("a.csv", SCENARIO_A))
            .await
            .unwrap();

        assert_eq!(coordinator.state(), IngestState::Committed);
        assert_eq!(report.row_count, 2);
        assert_eq!(report.batches, 1);
        assert_eq!(report.summary.file_id, report.file_id);
        assert_eq!(report.summary.stats.median_value, 55.5);
        assert_eq!(store.records_for(report.file_id).len(), 2);
        assert_eq!(store.summaries().len(), 1);
    }

    #[tokio::test]
    async fn test_rejection_rolls_back_once() {
        let store = MemoryStore::new();
        let mut coordinator = coordinator(&store);

        let err = coordinator
            .ingest(Upload::from_bytes(
                "a.csv",
                "Date,ExecutionTime,Value\n2024-01-01T10:00:00Z,-100,1\n",
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IngestError::RowInvalid {
                row: 1,
                kind: InvalidKind::NegativeDuration
            }
        ));
        assert_eq!(coordinator.state(), IngestState::RolledBack);
        assert_eq!(store.journal().rollbacks, 1);
        assert!(store.files().is_empty());
    }

    #[tokio::test]
    async fn test_shape_rejection_happens_inside_transaction() {
        let store = MemoryStore::new();
        let mut coordinator = coordinator(&store);

        let err = coordinator
            .ingest(Upload::from_bytes("a.txt", SCENARIO_A))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::FileRejected(FileRejection::NotCsv)));
        let journal = store.journal();
        assert_eq!(journal.begins, 1);
        assert_eq!(journal.rollbacks, 1);
    }

    #[tokio::test]
    async fn test_begin_failure_skips_rollback() {
        let store = MemoryStore::new();
        store.fail_at(FailurePoint::Begin);
        let mut coordinator = coordinator(&store);

        let err = coordinator
            .ingest(Upload::from_bytes("a.csv", SCENARIO_A))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Storage(StorageError::Backend(_))));
        assert_eq!(coordinator.state(), IngestState::Idle);
        assert_eq!(store.journal().rollbacks, 0);
    }

    #[tokio::test]
    async fn test_commit_failure_rolls_back() {
        let store = MemoryStore::new();
        store.fail_at(FailurePoint::Commit);
        let mut coordinator = coordinator(&store);

        let err = coordinator
            .ingest(Upload::from_bytes("a.csv", SCENARIO_A))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Storage(StorageError::Backend(_))));
        assert_eq!(coordinator.state(), IngestState::RolledBack);
        assert_eq!(store.journal().rollbacks, 1);
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_coordinator_is_single_use() {
        let store = MemoryStore::new();
        let mut coordinator = coordinator(&store);
        coordinator
            .ingest(Upload::from_bytes("a.csv", SCENARIO_A))
            .await
            .unwrap();

        let err = coordinator
            .ingest(Upload::from_bytes("a.csv", SCENARIO_A))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Storage(StorageError::TransactionAlreadyOpen)
        ));
        assert_eq!(store.files().len(), 1);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(IngestState::RowsPersisting { batch: 1, of: 3 }.as_str(), "rows_persisting");
        assert!(IngestState::Committed.is_terminal());
        assert!(!IngestState::RollingBack.is_terminal());
    }

    #[test]
    fn test_report_serializes_elapsed_ms() {
        let report = IngestReport {
            file_id: Uuid::nil(),
            file_name: "a.csv".to_string(),
            row_count: 1,
            batches: 1,
            summary: tsm_common::SummaryStats {
                date_delta_secs: 0.0,
                min_date: chrono::Utc::now(),
                avg_execution_time: 1.0,
                avg_value: 1.0,
                median_value: 1.0,
                max_value: 1.0,
                min_value: 1.0,
            }
            .attach(Uuid::nil()),
            elapsed: Duration::from_millis(1500),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["elapsed_ms"], 1500);
        assert_eq!(json["summary"]["median_value"], 1.0);
    }
}

//! PostgreSQL unit of work
//!
//! Each unit of work checks out one pooled connection for the lifetime of
//! its transaction. Staged rows are written by [`UnitOfWork::save_changes`]
//! with multi-row `INSERT` statements in the order file header, summary,
//! records.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::debug;
use tsm_common::{MeasurementFile, MeasurementRecord, SummaryRecord};
use uuid::Uuid;

use super::error::StorageError;
use super::unit_of_work::{UnitOfWork, UnitOfWorkProvider};

/// Rows per `INSERT`; four bind parameters each keeps us under the
/// 65,535 parameter limit of the wire protocol
const MAX_ROWS_PER_INSERT: usize = 10_000;

pub struct PgUnitOfWork {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
    pending_files: Vec<MeasurementFile>,
    pending_summaries: Vec<SummaryRecord>,
    pending_records: Vec<(Uuid, MeasurementRecord)>,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tx: None,
            pending_files: Vec::new(),
            pending_summaries: Vec::new(),
            pending_records: Vec::new(),
        }
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.tx.is_some() {
            Ok(())
        } else {
            Err(StorageError::NoTransaction)
        }
    }

    fn clear_pending(&mut self) {
        self.pending_files.clear();
        self.pending_summaries.clear();
        self.pending_records.clear();
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn begin_transaction(&mut self) -> Result<(), StorageError> {
        if self.tx.is_some() {
            return Err(StorageError::TransactionAlreadyOpen);
        }
        self.tx = Some(self.pool.begin().await?);
        Ok(())
    }

    async fn add_file(&mut self, file: &MeasurementFile) -> Result<Uuid, StorageError> {
        self.ensure_open()?;
        self.pending_files.push(file.clone());
        Ok(file.id)
    }

    async fn add_summary(&mut self, summary: &SummaryRecord) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.pending_summaries.push(*summary);
        Ok(())
    }

    async fn add_records_batch(
        &mut self,
        file_id: Uuid,
        records: &[MeasurementRecord],
    ) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.pending_records
            .extend(records.iter().map(|record| (file_id, *record)));
        Ok(())
    }

    async fn save_changes(&mut self) -> Result<(), StorageError> {
        let tx = self.tx.as_mut().ok_or(StorageError::NoTransaction)?;

        for file in &self.pending_files {
            sqlx::query("INSERT INTO measurement_files (id, name, uploaded_at) VALUES ($1, $2, $3)")
                .bind(file.id)
                .bind(&file.name)
                .bind(file.uploaded_at)
                .execute(&mut **tx)
                .await?;
        }

        for summary in &self.pending_summaries {
            let stats = &summary.stats;
            sqlx::query(
                r#"
                INSERT INTO measurement_results (
                    file_id, date_delta_secs, min_date, avg_execution_time,
                    avg_value, median_value, max_value, min_value
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(summary.file_id)
            .bind(stats.date_delta_secs)
            .bind(stats.min_date)
            .bind(stats.avg_execution_time)
            .bind(stats.avg_value)
            .bind(stats.median_value)
            .bind(stats.max_value)
            .bind(stats.min_value)
            .execute(&mut **tx)
            .await?;
        }

        for chunk in self.pending_records.chunks(MAX_ROWS_PER_INSERT) {
            let mut query_builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO measurement_values (file_id, recorded_at, execution_time, value) ",
            );
            query_builder.push_values(chunk, |mut b, (file_id, record)| {
                b.push_bind(*file_id)
                    .push_bind(record.timestamp)
                    .push_bind(record.execution_time)
                    .push_bind(record.value);
            });
            query_builder.build().execute(&mut **tx).await?;
        }

        debug!(
            files = self.pending_files.len(),
            summaries = self.pending_summaries.len(),
            records = self.pending_records.len(),
            "Flushed staged writes"
        );

        self.clear_pending();
        Ok(())
    }

    fn detach_tracked(&mut self) {
        self.pending_records.shrink_to_fit();
    }

    async fn commit(&mut self) -> Result<(), StorageError> {
        let tx = self.tx.take().ok_or(StorageError::NoTransaction)?;
        self.clear_pending();
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StorageError> {
        self.clear_pending();
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

/// Hands out [`PgUnitOfWork`]s over a shared pool
#[derive(Clone)]
pub struct PgUnitOfWorkProvider {
    pool: PgPool,
}

impl PgUnitOfWorkProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UnitOfWorkProvider for PgUnitOfWorkProvider {
    fn create(&self) -> Box<dyn UnitOfWork> {
        Box::new(PgUnitOfWork::new(self.pool.clone()))
    }
}

//! Storage collaborator for the ingestion pipeline
//!
//! A [`UnitOfWork`] owns exactly one transaction for exactly one upload.
//! Writes are staged with the `add_*` methods and reach storage on
//! [`UnitOfWork::save_changes`]; nothing is visible to other readers until
//! [`UnitOfWork::commit`].

use async_trait::async_trait;
use tsm_common::{MeasurementFile, MeasurementRecord, SummaryRecord};
use uuid::Uuid;

use super::error::StorageError;

#[async_trait]
pub trait UnitOfWork: Send {
    /// Open the transaction
    ///
    /// Fails with [`StorageError::TransactionAlreadyOpen`] when called twice.
    async fn begin_transaction(&mut self) -> Result<(), StorageError>;

    /// Stage a file header and return its identity
    async fn add_file(&mut self, file: &MeasurementFile) -> Result<Uuid, StorageError>;

    async fn add_summary(&mut self, summary: &SummaryRecord) -> Result<(), StorageError>;

    /// Stage one batch of records owned by `file_id`, in order
    async fn add_records_batch(
        &mut self,
        file_id: Uuid,
        records: &[MeasurementRecord],
    ) -> Result<(), StorageError>;

    /// Flush staged writes into the open transaction
    async fn save_changes(&mut self) -> Result<(), StorageError>;

    /// Drop any bookkeeping kept for already flushed writes
    fn detach_tracked(&mut self);

    async fn commit(&mut self) -> Result<(), StorageError>;

    /// Abandon the transaction; a no-op when none is open
    async fn rollback(&mut self) -> Result<(), StorageError>;
}

#[async_trait]
impl<T> UnitOfWork for Box<T>
where
    T: UnitOfWork + ?Sized,
{
    async fn begin_transaction(&mut self) -> Result<(), StorageError> {
        (**self).begin_transaction().await
    }

    async fn add_file(&mut self, file: &MeasurementFile) -> Result<Uuid, StorageError> {
        (**self).add_file(file).await
    }

    async fn add_summary(&mut self, summary: &SummaryRecord) -> Result<(), StorageError> {
        (**self).add_summary(summary).await
    }

    async fn add_records_batch(
        &mut self,
        file_id: Uuid,
        records: &[MeasurementRecord],
    ) -> Result<(), StorageError> {
        (**self).add_records_batch(file_id, records).await
    }

    async fn save_changes(&mut self) -> Result<(), StorageError> {
        (**self).save_changes().await
    }

    fn detach_tracked(&mut self) {
        (**self).detach_tracked()
    }

    async fn commit(&mut self) -> Result<(), StorageError> {
        (**self).commit().await
    }

    async fn rollback(&mut self) -> Result<(), StorageError> {
        (**self).rollback().await
    }
}

/// Creates one fresh unit of work per upload
pub trait UnitOfWorkProvider: Send + Sync {
    fn create(&self) -> Box<dyn UnitOfWork>;
}

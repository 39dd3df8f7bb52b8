//! In-memory unit of work
//!
//! Keeps committed data in a shared [`MemoryStore`]. Staged and flushed
//! writes stay local to the unit of work until commit, so a rolled back
//! upload leaves the store untouched. Failures can be injected at any
//! storage step to exercise rollback paths.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tsm_common::{MeasurementFile, MeasurementRecord, SummaryRecord};
use uuid::Uuid;

use super::error::StorageError;
use super::unit_of_work::{UnitOfWork, UnitOfWorkProvider};

/// Storage step at which an injected failure fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Begin,
    AddFile,
    AddSummary,
    /// 1-based batch number
    RecordsBatch(usize),
    SaveChanges,
    Commit,
    Rollback,
}

/// A committed record with its surrogate id
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredRecord {
    pub id: i64,
    pub file_id: Uuid,
    pub record: MeasurementRecord,
}

/// Counters of storage calls, across all units of work of one store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journal {
    pub begins: usize,
    pub batch_sizes: Vec<usize>,
    pub flushes: usize,
    pub detaches: usize,
    pub commits: usize,
    pub rollbacks: usize,
}

#[derive(Debug, Default)]
struct State {
    files: Vec<MeasurementFile>,
    summaries: Vec<SummaryRecord>,
    records: Vec<StoredRecord>,
    next_record_id: i64,
    failures: Vec<FailurePoint>,
    journal: Journal,
}

/// Shared committed state
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every unit of work of this store fail at `point`
    pub fn fail_at(&self, point: FailurePoint) {
        self.state().failures.push(point);
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    pub fn files(&self) -> Vec<MeasurementFile> {
        self.state().files.clone()
    }

    pub fn summaries(&self) -> Vec<SummaryRecord> {
        self.state().summaries.clone()
    }

    pub fn records(&self) -> Vec<StoredRecord> {
        self.state().records.clone()
    }

    pub fn records_for(&self, file_id: Uuid) -> Vec<StoredRecord> {
        self.state()
            .records
            .iter()
            .filter(|r| r.file_id == file_id)
            .copied()
            .collect()
    }

    pub fn journal(&self) -> Journal {
        self.state().journal.clone()
    }

    pub fn unit_of_work(&self) -> MemoryUnitOfWork {
        MemoryUnitOfWork {
            store: self.clone(),
            open: false,
            batches: 0,
            staged: Pending::default(),
            flushed: Pending::default(),
        }
    }

    fn check(&self, point: FailurePoint) -> Result<(), StorageError> {
        if self.state().failures.contains(&point) {
            return Err(StorageError::Backend(format!(
                "injected failure at {:?}",
                point
            )));
        }
        Ok(())
    }
}

impl UnitOfWorkProvider for MemoryStore {
    fn create(&self) -> Box<dyn UnitOfWork> {
        Box::new(self.unit_of_work())
    }
}

#[derive(Debug, Default)]
struct Pending {
    files: Vec<MeasurementFile>,
    summaries: Vec<SummaryRecord>,
    records: Vec<(Uuid, MeasurementRecord)>,
}

impl Pending {
    fn clear(&mut self) {
        self.files.clear();
        self.summaries.clear();
        self.records.clear();
    }
}

/// Unit of work over a [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryUnitOfWork {
    store: MemoryStore,
    open: bool,
    batches: usize,
    staged: Pending,
    flushed: Pending,
}

impl MemoryUnitOfWork {
    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.open {
            Ok(())
        } else {
            Err(StorageError::NoTransaction)
        }
    }

    fn knows_file(&self, file_id: Uuid) -> bool {
        self.flushed
            .files
            .iter()
            .chain(self.staged.files.iter())
            .any(|f| f.id == file_id)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn begin_transaction(&mut self) -> Result<(), StorageError> {
        if self.open {
            return Err(StorageError::TransactionAlreadyOpen);
        }
        self.store.state().journal.begins += 1;
        self.store.check(FailurePoint::Begin)?;
        self.open = true;
        Ok(())
    }

    async fn add_file(&mut self, file: &MeasurementFile) -> Result<Uuid, StorageError> {
        self.ensure_open()?;
        self.store.check(FailurePoint::AddFile)?;
        self.staged.files.push(file.clone());
        Ok(file.id)
    }

    async fn add_summary(&mut self, summary: &SummaryRecord) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.store.check(FailurePoint::AddSummary)?;
        if !self.knows_file(summary.file_id) {
            return Err(StorageError::UnknownFile(summary.file_id));
        }
        self.staged.summaries.push(*summary);
        Ok(())
    }

    async fn add_records_batch(
        &mut self,
        file_id: Uuid,
        records: &[MeasurementRecord],
    ) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.batches += 1;
        self.store.state().journal.batch_sizes.push(records.len());
        self.store.check(FailurePoint::RecordsBatch(self.batches))?;
        if !self.knows_file(file_id) {
            return Err(StorageError::UnknownFile(file_id));
        }
        self.staged
            .records
            .extend(records.iter().map(|record| (file_id, *record)));
        Ok(())
    }

    async fn save_changes(&mut self) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.store.state().journal.flushes += 1;
        self.store.check(FailurePoint::SaveChanges)?;
        self.flushed.files.append(&mut self.staged.files);
        self.flushed.summaries.append(&mut self.staged.summaries);
        self.flushed.records.append(&mut self.staged.records);
        Ok(())
    }

    fn detach_tracked(&mut self) {
        self.store.state().journal.detaches += 1;
        self.staged.records.shrink_to_fit();
    }

    async fn commit(&mut self) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.store.check(FailurePoint::Commit)?;

        let mut state = self.store.state();
        state.journal.commits += 1;

        // unflushed writes are discarded, as with a database transaction
        self.staged.clear();
        state.files.append(&mut self.flushed.files);
        state.summaries.append(&mut self.flushed.summaries);
        for (file_id, record) in self.flushed.records.drain(..) {
            state.next_record_id += 1;
            let id = state.next_record_id;
            state.records.push(StoredRecord {
                id,
                file_id,
                record,
            });
        }

        self.open = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StorageError> {
        self.store.state().journal.rollbacks += 1;
        self.store.check(FailurePoint::Rollback)?;
        self.staged.clear();
        self.flushed.clear();
        self.open = false;
        Ok(())
    }
}

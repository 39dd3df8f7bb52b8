//! Measurement ingestion pipeline
//!
//! Turns one uploaded CSV into a committed file header, its records and a
//! summary row, or into nothing at all.
//!
//! # Architecture
//!
//! - **parser**: streaming CSV decoding into typed rows
//! - **validator**: per-row domain rules and the row ceiling
//! - **aggregator**: summary statistics (span, means, median, extrema)
//! - **coordinator**: the transactional state machine tying them together
//! - **unit_of_work**: the storage seam, with PostgreSQL (`postgres`) and
//!   in-memory (`memory`) implementations
//! - **config**: `INGEST_*` limits

pub mod aggregator;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod memory;
pub mod parser;
pub mod postgres;
pub mod unit_of_work;
pub mod upload;
pub mod validator;

pub use config::IngestLimits;
pub use coordinator::{IngestReport, IngestState, IngestionCoordinator};
pub use error::{FileRejection, IngestError, InvalidKind, MalformedKind, StorageError};
pub use memory::{FailurePoint, MemoryStore};
pub use postgres::{PgUnitOfWork, PgUnitOfWorkProvider};
pub use unit_of_work::{UnitOfWork, UnitOfWorkProvider};
pub use upload::Upload;

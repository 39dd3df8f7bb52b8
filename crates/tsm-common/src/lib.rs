//! Timescale Manager common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared pieces used by every workspace member:
//!
//! - **Logging**: `tracing` subscriber setup driven by environment variables
//! - **Types**: the measurement domain model (files, records, summaries)
//!
//! # Example
//!
//! ```no_run
//! use tsm_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod types;

pub use types::{MeasurementFile, MeasurementRecord, SummaryRecord, SummaryStats};

//! Per-row semantic validation
//!
//! Rules are checked in a fixed order and the first violation rejects the
//! whole file:
//!
//! 1. row ceiling (default 10,000 rows)
//! 2. `2000-01-01T00:00:00Z < date < now`
//! 3. execution time `>= 0`
//! 4. value `>= 0`

use chrono::{DateTime, Utc};

use super::error::{IngestError, InvalidKind};
use super::parser::ParsedRow;

/// 2000-01-01T00:00:00Z as seconds since the Unix epoch
const EARLIEST_DATE_SECS: i64 = 946_684_800;

/// Exclusive lower bound for measurement timestamps
pub fn earliest_allowed_date() -> DateTime<Utc> {
    DateTime::from_timestamp(EARLIEST_DATE_SECS, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Stateful validator; one instance per file
#[derive(Debug)]
pub struct RecordValidator {
    max_rows: usize,
    seen: usize,
}

impl RecordValidator {
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows, seen: 0 }
    }

    /// Rows accepted so far
    pub fn accepted(&self) -> usize {
        self.seen
    }

    /// Validate the next row against the current wall clock
    pub fn validate(&mut self, parsed: &ParsedRow) -> Result<(), IngestError> {
        self.validate_at(parsed, Utc::now())
    }

    /// Validate the next row against an explicit `now`
    pub fn validate_at(&mut self, parsed: &ParsedRow, now: DateTime<Utc>) -> Result<(), IngestError> {
        let reject = |kind| IngestError::RowInvalid {
            row: parsed.row,
            kind,
        };

        if self.seen + 1 > self.max_rows {
            return Err(reject(InvalidKind::RowLimitExceeded { max: self.max_rows }));
        }

        let record = &parsed.record;
        if record.timestamp <= earliest_allowed_date() || record.timestamp >= now {
            return Err(reject(InvalidKind::InvalidDate));
        }

        if record.execution_time < 0.0 {
            return Err(reject(InvalidKind::NegativeDuration));
        }

        if record.value < 0.0 {
            return Err(reject(InvalidKind::NegativeValue));
        }

        self.seen += 1;
        Ok(())
    }
}

//! Ingestion error taxonomy
//!
//! Every failure raised inside the pipeline is an [`IngestError`]. Client
//! errors carry enough context (kind and 1-based row) to be reported back
//! verbatim; everything else surfaces as an internal failure.

use std::fmt;
use thiserror::Error;

/// Reasons an upload is refused before any row is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FileRejection {
    #[error("file is empty")]
    EmptyContent,
    #[error("only .csv files are accepted")]
    NotCsv,
    #[error("file name is required")]
    EmptyName,
    #[error("file name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("file name must not contain path separators or '..'")]
    PathTraversal,
    #[error("multipart field 'file' is required")]
    MissingUpload,
    #[error("header row could not be read")]
    UnreadableHeader,
}

/// Structural row defects detected while decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    MissingField,
    TypeConversion,
    DateParse,
    Unreadable,
}

impl MalformedKind {
    pub fn code(&self) -> &'static str {
        match self {
            MalformedKind::MissingField => "MISSING_FIELD",
            MalformedKind::TypeConversion => "TYPE_CONVERSION",
            MalformedKind::DateParse => "DATE_PARSE",
            MalformedKind::Unreadable => "UNREADABLE_ROW",
        }
    }
}

/// Semantic rule violations detected after decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidKind {
    #[error("file exceeds the maximum of {max} rows")]
    RowLimitExceeded { max: usize },
    #[error("date must be after 2000-01-01 and before the current time")]
    InvalidDate,
    #[error("execution time must not be negative")]
    NegativeDuration,
    #[error("value must not be negative")]
    NegativeValue,
}

impl InvalidKind {
    pub fn code(&self) -> &'static str {
        match self {
            InvalidKind::RowLimitExceeded { .. } => "ROW_LIMIT_EXCEEDED",
            InvalidKind::InvalidDate => "INVALID_DATE",
            InvalidKind::NegativeDuration => "NEGATIVE_DURATION",
            InvalidKind::NegativeValue => "NEGATIVE_VALUE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("cannot aggregate an empty record set")]
    EmptyInput,
}

/// Persistence and transaction failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("a transaction is already open for this unit of work")]
    TransactionAlreadyOpen,

    #[error("no transaction is open")]
    NoTransaction,

    #[error("records reference file {0} which was not created in this transaction")]
    UnknownFile(uuid::Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file rejected: {0}")]
    FileRejected(#[from] FileRejection),

    #[error("row {row}: {detail}")]
    RowMalformed {
        row: usize,
        kind: MalformedKind,
        detail: String,
    },

    #[error("row {row}: {kind}")]
    RowInvalid { row: usize, kind: InvalidKind },

    #[error("file contains no data rows")]
    EmptyFile,

    #[error("aggregation failed: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl IngestError {
    pub(crate) fn malformed(row: usize, kind: MalformedKind, detail: impl fmt::Display) -> Self {
        IngestError::RowMalformed {
            row,
            kind,
            detail: detail.to_string(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::FileRejected(_) => "FILE_REJECTED",
            IngestError::RowMalformed { kind, .. } => kind.code(),
            IngestError::RowInvalid { kind, .. } => kind.code(),
            IngestError::EmptyFile => "EMPTY_FILE",
            IngestError::Aggregation(_) => "AGGREGATION_ERROR",
            IngestError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Whether the caller caused the failure (HTTP 400) as opposed to the service (HTTP 500)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IngestError::FileRejected(_)
                | IngestError::RowMalformed { .. }
                | IngestError::RowInvalid { .. }
                | IngestError::EmptyFile
        )
    }

    /// 1-based data row the failure is attributed to
    pub fn row(&self) -> Option<usize> {
        match self {
            IngestError::RowMalformed { row, .. } | IngestError::RowInvalid { row, .. } => {
                Some(*row)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_errors_are_client_errors() {
        let err = IngestError::RowInvalid {
            row: 7,
            kind: InvalidKind::NegativeValue,
        };
        assert!(err.is_client_error());
        assert_eq!(err.row(), Some(7));
        assert_eq!(err.code(), "NEGATIVE_VALUE");
        assert_eq!(err.to_string(), "row 7: value must not be negative");
    }

    #[test]
    fn test_malformed_message_includes_row() {
        let err = IngestError::malformed(3, MalformedKind::DateParse, "cannot parse date 'soon'");
        assert_eq!(err.to_string(), "row 3: cannot parse date 'soon'");
        assert_eq!(err.code(), "DATE_PARSE");
    }

    #[test]
    fn test_internal_errors() {
        let err = IngestError::from(StorageError::NoTransaction);
        assert!(!err.is_client_error());
        assert_eq!(err.row(), None);
        assert_eq!(err.code(), "STORAGE_ERROR");

        let err = IngestError::from(AggregationError::EmptyInput);
        assert!(!err.is_client_error());
        assert_eq!(err.code(), "AGGREGATION_ERROR");
    }

    #[test]
    fn test_file_rejection_message() {
        let err = IngestError::from(FileRejection::NameTooLong { max: 255 });
        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "file rejected: file name must be at most 255 characters"
        );
    }
}

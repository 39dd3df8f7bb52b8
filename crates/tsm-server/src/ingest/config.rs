//! Ingestion limits
//!
//! Ceilings applied to every upload. The defaults are the service contract;
//! deployments may tighten or relax them through environment variables.

use serde::{Deserialize, Serialize};

/// Maximum number of data rows accepted in one file.
pub const DEFAULT_MAX_ROWS: usize = 10_000;

/// Number of rows written per batch before flushing.
pub const DEFAULT_BATCH_SIZE: usize = 5_000;

/// Maximum HTTP request body size for uploads (32 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Per-upload limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestLimits {
    /// Row ceiling; row `max_rows + 1` is rejected
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    /// Rows per persisted batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Request body cap enforced by the HTTP layer
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            batch_size: DEFAULT_BATCH_SIZE,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl IngestLimits {
    /// Load limits from `INGEST_*` environment variables, falling back to defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let limits = Self {
            max_rows: std::env::var("INGEST_MAX_ROWS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_ROWS),
            batch_size: std::env::var("INGEST_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BATCH_SIZE),
            max_upload_bytes: std::env::var("INGEST_MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        };

        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_rows == 0 {
            anyhow::bail!("INGEST_MAX_ROWS must be greater than 0");
        }
        if self.batch_size == 0 {
            anyhow::bail!("INGEST_BATCH_SIZE must be greater than 0");
        }
        if self.max_upload_bytes == 0 {
            anyhow::bail!("INGEST_MAX_UPLOAD_BYTES must be greater than 0");
        }
        Ok(())
    }

    /// Number of batches needed to persist `rows` rows
    pub fn batch_count(&self, rows: usize) -> usize {
        rows.div_ceil(self.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults_are_contract_values() {
        let limits = IngestLimits::default();
        assert_eq!(limits.max_rows, 10_000);
        assert_eq!(limits.batch_size, 5_000);
        assert_eq!(limits.max_upload_bytes, 32 * 1024 * 1024);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_batch_count() {
        let limits = IngestLimits::default();
        assert_eq!(limits.batch_count(0), 0);
        assert_eq!(limits.batch_count(1), 1);
        assert_eq!(limits.batch_count(5_000), 1);
        assert_eq!(limits.batch_count(12_000), 3);
    }

    #[test]
    fn test_zero_values_rejected() {
        let limits = IngestLimits {
            batch_size: 0,
            ..Default::default()
        };
        assert!(limits.validate().is_err());

        let limits = IngestLimits {
            max_rows: 0,
            ..Default::default()
        };
        assert!(limits.validate().is_err());
    }

    #[test]
    fn test_serde_fills_missing_fields() {
        let limits: IngestLimits = serde_json::from_str(r#"{"batch_size": 100}"#).unwrap();
        assert_eq!(limits.batch_size, 100);
        assert_eq!(limits.max_rows, DEFAULT_MAX_ROWS);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("INGEST_MAX_ROWS", "250");
        std::env::set_var("INGEST_BATCH_SIZE", "not-a-number");
        let limits = IngestLimits::from_env().unwrap();
        std::env::remove_var("INGEST_MAX_ROWS");
        std::env::remove_var("INGEST_BATCH_SIZE");

        assert_eq!(limits.max_rows, 250);
        assert_eq!(limits.batch_size, DEFAULT_BATCH_SIZE);
    }
}

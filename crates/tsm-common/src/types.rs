//! Measurement domain model
//!
//! An uploaded CSV becomes one [`MeasurementFile`] header, one
//! [`MeasurementRecord`] per data row and exactly one [`SummaryRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header of one uploaded dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementFile {
    pub id: Uuid,
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
}

impl MeasurementFile {
    /// New header with a fresh identity, stamped with the current time
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            uploaded_at: Utc::now(),
        }
    }
}

/// One validated measurement row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Start of the measured operation, UTC
    pub timestamp: DateTime<Utc>,
    /// Execution time in seconds, never negative
    pub execution_time: f64,
    /// Measured value, never negative
    pub value: f64,
}

/// Aggregate statistics over one file's records
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// `max(timestamp) - min(timestamp)` in seconds
    pub date_delta_secs: f64,
    /// Earliest timestamp in the file
    pub min_date: DateTime<Utc>,
    pub avg_execution_time: f64,
    pub avg_value: f64,
    pub median_value: f64,
    pub max_value: f64,
    pub min_value: f64,
}

impl SummaryStats {
    /// Bind the statistics to the file they were computed from
    pub fn attach(self, file_id: Uuid) -> SummaryRecord {
        SummaryRecord {
            file_id,
            stats: self,
        }
    }
}

/// Summary row owned by exactly one file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub file_id: Uuid,
    #[serde(flatten)]
    pub stats: SummaryStats,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_file_has_unique_identity() {
        let a = MeasurementFile::new("run.csv");
        let b = MeasurementFile::new("run.csv");
        assert_eq!(a.name, b.name);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_summary_serializes_flat() {
        let stats = SummaryStats {
            date_delta_secs: 3600.0,
            min_date: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            avg_execution_time: 150.0,
            avg_value: 55.5,
            median_value: 55.5,
            max_value: 60.5,
            min_value: 50.5,
        };
        let file_id = Uuid::new_v4();
        let json = serde_json::to_value(stats.attach(file_id)).unwrap();

        assert_eq!(json["file_id"], file_id.to_string());
        assert_eq!(json["date_delta_secs"], 3600.0);
        assert_eq!(json["median_value"], 55.5);
        assert!(json.get("stats").is_none());
    }
}

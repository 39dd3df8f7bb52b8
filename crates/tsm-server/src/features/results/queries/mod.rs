pub mod filter;
pub mod list;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use filter::{FilterResultsError, FilterResultsQuery};
pub use list::{ListResultsError, ListResultsQuery};

/// Projection shared by the result queries; callers append clauses
const SELECT_RESULTS: &str = r#"
    SELECT r.file_id, f.name AS file_name, r.date_delta_secs, r.min_date,
           r.avg_execution_time, r.avg_value, r.median_value, r.max_value, r.min_value
    FROM measurement_results r
    JOIN measurement_files f ON f.id = r.file_id"#;

/// A summary row joined with its file's name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResultItem {
    pub file_id: Uuid,
    pub file_name: String,
    pub date_delta_secs: f64,
    pub min_date: DateTime<Utc>,
    pub avg_execution_time: f64,
    pub avg_value: f64,
    pub median_value: f64,
    pub max_value: f64,
    pub min_value: f64,
}

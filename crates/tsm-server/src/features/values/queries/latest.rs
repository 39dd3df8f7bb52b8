//! Most recent values of a file
//!
//! Picks the newest `limit` records by timestamp across every file with the
//! given name, then returns them oldest first.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::features::shared::validation::{
    validate_limit, validate_name, LimitValidationError, NameValidationError,
};
use crate::ingest::upload::MAX_FILE_NAME_LEN;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 1000;

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestValuesQuery {
    #[serde(default)]
    pub file_name: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ValueItem {
    pub id: i64,
    pub file_id: Uuid,
    #[sqlx(rename = "recorded_at")]
    pub timestamp: DateTime<Utc>,
    pub execution_time: f64,
    pub value: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum LatestValuesError {
    #[error("File name validation failed: {0}")]
    FileName(#[from] NameValidationError),

    #[error("Limit validation failed: {0}")]
    Limit(#[from] LimitValidationError),

    #[error("No values found for file '{0}'")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<ValueItem>, LatestValuesError>> for LatestValuesQuery {}

impl crate::cqrs::middleware::Query for LatestValuesQuery {}

impl LatestValuesQuery {
    pub fn validate(&self) -> Result<(), LatestValuesError> {
        validate_name(&self.file_name, MAX_FILE_NAME_LEN)?;
        validate_limit(self.limit, 1, MAX_LIMIT)?;
        Ok(())
    }
}

#[tracing::instrument(skip(pool), fields(file_name = %query.file_name, limit = query.limit))]
pub async fn handle(
    pool: PgPool,
    query: LatestValuesQuery,
) -> Result<Vec<ValueItem>, LatestValuesError> {
    query.validate()?;

    let values = sqlx::query_as::<_, ValueItem>(
        r#"
        SELECT id, file_id, recorded_at, execution_time, value
        FROM (
            SELECT v.id, v.file_id, v.recorded_at, v.execution_time, v.value
            FROM measurement_values v
            JOIN measurement_files f ON f.id = v.file_id
            WHERE f.name = $1
            ORDER BY v.recorded_at DESC, v.id DESC
            LIMIT $2
        ) latest
        ORDER BY recorded_at ASC, id ASC
        "#,
    )
    .bind(&query.file_name)
    .bind(query.limit)
    .fetch_all(&pool)
    .await?;

    if values.is_empty() {
        return Err(LatestValuesError::NotFound(query.file_name));
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_to_ten() {
        let query: LatestValuesQuery = serde_json::from_str(r#"{"file_name": "a.csv"}"#).unwrap();
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let query = LatestValuesQuery {
            file_name: "".to_string(),
            limit: 10,
        };
        assert!(matches!(query.validate(), Err(LatestValuesError::FileName(_))));

        let query = LatestValuesQuery {
            file_name: "a.csv".to_string(),
            limit: 0,
        };
        assert!(matches!(query.validate(), Err(LatestValuesError::Limit(_))));

        let query = LatestValuesQuery {
            file_name: "a.csv".to_string(),
            limit: MAX_LIMIT + 1,
        };
        assert!(matches!(query.validate(), Err(LatestValuesError::Limit(_))));
    }

    #[test]
    fn test_value_item_serializes_timestamp() {
        let item = ValueItem {
            id: 1,
            file_id: Uuid::nil(),
            timestamp: Utc::now(),
            execution_time: 1.0,
            value: 2.0,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("timestamp").is_some());
        assert!(json.get("recorded_at").is_none());
    }
}

//! Filter summaries query
//!
//! Every bound pair only applies when both ends are present:
//!
//! - `min_date`/`max_date` on the summary's earliest timestamp, applied when
//!   `min_date <= max_date`
//! - `min_avg_value`/`max_avg_value` and
//!   `min_avg_execution_time`/`max_avg_execution_time`, applied when
//!   `min < max`, so equal bounds mean "no filter"
//! - `name` is a case-sensitive substring of the file name, ignored when blank
//!
//! All windows are inclusive.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::ResultItem;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterResultsQuery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub min_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub min_avg_value: Option<f64>,
    #[serde(default)]
    pub max_avg_value: Option<f64>,
    #[serde(default)]
    pub min_avg_execution_time: Option<f64>,
    #[serde(default)]
    pub max_avg_execution_time: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum FilterResultsError {
    #[error("No results match the filter")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<ResultItem>, FilterResultsError>> for FilterResultsQuery {}

impl crate::cqrs::middleware::Query for FilterResultsQuery {}

impl FilterResultsQuery {
    pub fn name_filter(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.trim().is_empty())
    }

    pub fn date_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.min_date, self.max_date) {
            (Some(min), Some(max)) if min <= max => Some((min, max)),
            _ => None,
        }
    }

    pub fn avg_value_window(&self) -> Option<(f64, f64)> {
        strict_window(self.min_avg_value, self.max_avg_value)
    }

    pub fn avg_execution_time_window(&self) -> Option<(f64, f64)> {
        strict_window(self.min_avg_execution_time, self.max_avg_execution_time)
    }

    fn build(&self) -> QueryBuilder<'_, Postgres> {
        let mut qb = QueryBuilder::new(super::SELECT_RESULTS);
        qb.push(" WHERE TRUE");

        if let Some(name) = self.name_filter() {
            qb.push(" AND strpos(f.name, ").push_bind(name).push(") > 0");
        }
        if let Some((min, max)) = self.date_window() {
            qb.push(" AND r.min_date BETWEEN ")
                .push_bind(min)
                .push(" AND ")
                .push_bind(max);
        }
        if let Some((min, max)) = self.avg_value_window() {
            qb.push(" AND r.avg_value BETWEEN ")
                .push_bind(min)
                .push(" AND ")
                .push_bind(max);
        }
        if let Some((min, max)) = self.avg_execution_time_window() {
            qb.push(" AND r.avg_execution_time BETWEEN ")
                .push_bind(min)
                .push(" AND ")
                .push_bind(max);
        }

        qb.push(" ORDER BY r.min_date ASC, f.name ASC");
        qb
    }
}

fn strict_window(min: Option<f64>, max: Option<f64>) -> Option<(f64, f64)> {
    match (min, max) {
        (Some(min), Some(max)) if min < max => Some((min, max)),
        _ => None,
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: FilterResultsQuery,
) -> Result<Vec<ResultItem>, FilterResultsError> {
    let results = query
        .build()
        .build_query_as::<ResultItem>()
        .fetch_all(&pool)
        .await?;

    if results.is_empty() {
        return Err(FilterResultsError::NotFound);
    }

    tracing::debug!(count = results.len(), "Filtered results");
    Ok(results)
}

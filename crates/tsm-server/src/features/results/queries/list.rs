//! List all summaries query

use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::ResultItem;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResultsQuery {}

#[derive(Debug, thiserror::Error)]
pub enum ListResultsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<ResultItem>, ListResultsError>> for ListResultsQuery {}

impl crate::cqrs::middleware::Query for ListResultsQuery {}

#[tracing::instrument(skip(pool, _query))]
pub async fn handle(
    pool: PgPool,
    _query: ListResultsQuery,
) -> Result<Vec<ResultItem>, ListResultsError> {
    let sql = format!("{} ORDER BY f.uploaded_at DESC", super::SELECT_RESULTS);
    let results = sqlx::query_as::<_, ResultItem>(&sql).fetch_all(&pool).await?;

    tracing::debug!(count = results.len(), "Listed results");
    Ok(results)
}

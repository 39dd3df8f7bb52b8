//! List uploaded files query

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Lists every uploaded file, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFilesQuery {}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FileItem {
    pub id: Uuid,
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListFilesError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Request<Result<Vec<FileItem>, ListFilesError>> for ListFilesQuery {}

impl crate::cqrs::middleware::Query for ListFilesQuery {}

#[tracing::instrument(skip(pool, _query))]
pub async fn handle(pool: PgPool, _query: ListFilesQuery) -> Result<Vec<FileItem>, ListFilesError> {
    let files = sqlx::query_as::<_, FileItem>(
        r#"
        SELECT id, name, uploaded_at
        FROM measurement_files
        ORDER BY uploaded_at DESC, name ASC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    tracing::debug!(count = files.len(), "Listed files");
    Ok(files)
}

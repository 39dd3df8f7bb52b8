//! File API routes
//!
//! - `POST /api/v1/files` - Multipart upload, field `file`
//! - `GET /api/v1/files` - List uploaded files

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::FeatureState;
use crate::ingest::{FileRejection, IngestError};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::{
    commands::UploadMeasurementsCommand,
    queries::{ListFilesError, ListFilesQuery},
};

pub fn files_routes() -> Router<FeatureState> {
    Router::new().route("/", get(list_files).post(upload_file))
}

/// Ingest an uploaded CSV
///
/// # Response
///
/// - `201 Created` - Ingestion report
/// - `400 Bad Request` - File or row rejected; `error.details.row` names the row
/// - `500 Internal Server Error` - Storage failure
#[tracing::instrument(skip(state, multipart))]
async fn upload_file(
    State(state): State<FeatureState>,
    mut multipart: Multipart,
) -> Result<Response, FileApiError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await?;
        upload = Some(UploadMeasurementsCommand { file_name, content });
    }

    let command =
        upload.ok_or(FileApiError::Upload(IngestError::FileRejected(FileRejection::MissingUpload)))?;

    let report =
        super::commands::upload::handle(state.ingestion.clone(), state.limits, command).await?;

    tracing::info!(
        file_id = %report.file_id,
        rows = report.row_count,
        "File ingested via API"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(report))).into_response())
}

#[tracing::instrument(skip(state))]
async fn list_files(State(state): State<FeatureState>) -> Result<Response, FileApiError> {
    let files = super::queries::list::handle(state.db.clone(), ListFilesQuery::default()).await?;
    let meta = json!({ "count": files.len() });
    Ok((StatusCode::OK, Json(ApiResponse::success_with_meta(files, meta))).into_response())
}

#[derive(Debug)]
enum FileApiError {
    Multipart(MultipartError),
    Upload(IngestError),
    List(ListFilesError),
}

impl From<MultipartError> for FileApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

impl From<IngestError> for FileApiError {
    fn from(err: IngestError) -> Self {
        Self::Upload(err)
    }
}

impl From<ListFilesError> for FileApiError {
    fn from(err: ListFilesError) -> Self {
        Self::List(err)
    }
}

impl IntoResponse for FileApiError {
    fn into_response(self) -> Response {
        match self {
            FileApiError::Multipart(err) => {
                let error = ErrorResponse::new("INVALID_MULTIPART", err.body_text());
                (err.status(), Json(error)).into_response()
            },
            FileApiError::Upload(err) if err.is_client_error() => {
                let error = match err.row() {
                    Some(row) => {
                        ErrorResponse::with_details(err.code(), err.to_string(), json!({ "row": row }))
                    },
                    None => ErrorResponse::new(err.code(), err.to_string()),
                };
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            FileApiError::Upload(err) => {
                tracing::error!(code = err.code(), "Ingestion failed: {}", err);
                let error =
                    ErrorResponse::new("INTERNAL_ERROR", "The file could not be stored");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
            FileApiError::List(ListFilesError::Database(err)) => {
                tracing::error!("Database error while listing files: {}", err);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

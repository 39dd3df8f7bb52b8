//! Value API routes

use crate::api::response::{ApiResponse, ErrorResponse};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sqlx::PgPool;

use super::queries::{LatestValuesError, LatestValuesQuery};

pub fn values_routes() -> Router<PgPool> {
    Router::new().route("/latest", get(latest_values))
}

/// Most recent values of a file, oldest first
///
/// # Endpoint
///
/// `GET /api/v1/values/latest?file_name=run.csv&limit=10`
///
/// # Response
///
/// - `200 OK` - Values in ascending timestamp order
/// - `400 Bad Request` - Missing file name or limit outside 1..=1000
/// - `404 Not Found` - No values for that file name
#[tracing::instrument(skip(pool))]
async fn latest_values(
    State(pool): State<PgPool>,
    Query(query): Query<LatestValuesQuery>,
) -> Result<Response, ValueApiError> {
    let values = super::queries::latest::handle(pool, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(values))).into_response())
}

#[derive(Debug)]
struct ValueApiError(LatestValuesError);

impl From<LatestValuesError> for ValueApiError {
    fn from(err: LatestValuesError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ValueApiError {
    fn into_response(self) -> Response {
        match self.0 {
            err @ (LatestValuesError::FileName(_) | LatestValuesError::Limit(_)) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", err.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            err @ LatestValuesError::NotFound(_) => {
                let error = ErrorResponse::new("NOT_FOUND", err.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            LatestValuesError::Database(err) => {
                tracing::error!("Database error while querying values: {}", err);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

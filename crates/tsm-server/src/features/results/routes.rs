//! Result API routes

use crate::api::response::{ApiResponse, ErrorResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;

use super::queries::{FilterResultsError, FilterResultsQuery, ListResultsError, ListResultsQuery};

pub fn results_routes() -> Router<PgPool> {
    Router::new()
        .route("/", get(list_results))
        .route("/filter", post(filter_results))
}

/// Filter summaries
///
/// # Endpoint
///
/// `POST /api/v1/results/filter`
///
/// # Request Body
///
/// ```json
/// {
///   "name": "run",
///   "min_date": "2024-01-01T00:00:00Z",
///   "max_date": "2024-02-01T00:00:00Z",
///   "min_avg_value": 10.0,
///   "max_avg_value": 90.0
/// }
/// ```
///
/// # Response
///
/// - `200 OK` - Matching summaries
/// - `404 Not Found` - Nothing matches
#[tracing::instrument(skip(pool))]
async fn filter_results(
    State(pool): State<PgPool>,
    Json(query): Json<FilterResultsQuery>,
) -> Result<Response, ResultApiError> {
    let results = super::queries::filter::handle(pool, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(results))).into_response())
}

#[tracing::instrument(skip(pool))]
async fn list_results(State(pool): State<PgPool>) -> Result<Response, ResultApiError> {
    let results = super::queries::list::handle(pool, ListResultsQuery::default()).await?;
    let meta = json!({ "count": results.len() });
    Ok((StatusCode::OK, Json(ApiResponse::success_with_meta(results, meta))).into_response())
}

#[derive(Debug, thiserror::Error)]
enum ResultApiError {
    #[error(transparent)]
    Filter(#[from] FilterResultsError),
    #[error(transparent)]
    List(#[from] ListResultsError),
}

impl IntoResponse for ResultApiError {
    fn into_response(self) -> Response {
        match self {
            ResultApiError::Filter(FilterResultsError::NotFound) => {
                let error = ErrorResponse::new("NOT_FOUND", "No results match the filter");
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            ResultApiError::Filter(FilterResultsError::Database(err))
            | ResultApiError::List(ListResultsError::Database(err)) => {
                tracing::error!("Database error while querying results: {}", err);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

//! Summary (result) queries
//!
//! - `POST /api/v1/results/filter` - Summaries matching a filter body
//! - `GET /api/v1/results` - All summaries

pub mod queries;
pub mod routes;

pub use queries::{FilterResultsQuery, ListResultsQuery, ResultItem};
pub use routes::results_routes;

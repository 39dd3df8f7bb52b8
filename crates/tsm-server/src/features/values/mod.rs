//! Raw value queries
//!
//! - `GET /api/v1/values/latest?file_name=..&limit=..` - Most recent values

pub mod queries;
pub mod routes;

pub use queries::{LatestValuesQuery, ValueItem};
pub use routes::values_routes;

//! Measurement file uploads
//!
//! - `POST /api/v1/files` ingests a CSV upload
//! - `GET /api/v1/files` lists uploaded files

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::UploadMeasurementsCommand;
pub use queries::{FileItem, ListFilesError, ListFilesQuery};
pub use routes::files_routes;

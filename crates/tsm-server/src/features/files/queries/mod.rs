pub mod list;

pub use list::{FileItem, ListFilesError, ListFilesQuery};

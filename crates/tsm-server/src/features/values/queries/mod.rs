pub mod latest;

pub use latest::{LatestValuesError, LatestValuesQuery, ValueItem};

pub mod combine;
pub mod extract;

pub use combine::combine_severity;
pub use extract::{
    normalize, precipitation_index, pressure_index, vorticity_index, wind_index,
};

use crate::data_io::DatasetError;
use thiserror::Error;

/// Errors raised while deriving severity fields
#[derive(Error, Debug)]
pub enum SeverityError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("Field shape mismatch: {field} is {found:?}, expected {expected:?}")]
    ShapeMismatch {
        field: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

pub mod config;
pub mod data_io;
pub mod forecast;
pub mod parallel;
pub mod severity;
pub mod time_utils;

pub use config::{Config, Constants};
pub use data_io::{GridAccessor, GriddedDataset, SpatialWindow};
pub use forecast::{ForecastIterator, ForecastStep};

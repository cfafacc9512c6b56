pub mod accessor;
pub mod ascii_writer;
pub mod loader;
pub mod output_trait;
pub mod units;
pub mod utils;
pub mod writer;

pub use accessor::GridAccessor;
pub use loader::load_dataset;
pub use units::convert_temperature_to_kelvin;

use chrono::{DateTime, Utc};
use ndarray::{Array3, Array4, Axis};
use std::collections::HashMap;
use thiserror::Error;

/// Error type for dataset access and loading
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("NetCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),

    #[error("Variable not found: {0}")]
    MissingVariable(String),

    #[error("Level {0} hPa not present in vertical coordinate")]
    MissingLevel(f64),

    #[error("Time index {index} out of range for dataset with {len} time steps")]
    TimeIndexOutOfRange { index: usize, len: usize },

    #[error("Dimension mismatch for variable {0}: {1}")]
    DimensionMismatch(String, String),

    #[error("Invalid time encoding: {0}")]
    TimeDecodeError(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Data conversion error")]
    ConversionError,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rectangular longitude/latitude subset, inclusive on both bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialWindow {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl SpatialWindow {
    /// Extraction window for the Gulf of Mexico / southeastern US domain
    pub const GULF: SpatialWindow = SpatialWindow {
        lon_min: -97.0,
        lon_max: -79.0,
        lat_min: 22.0,
        lat_max: 37.0,
    };

    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Self {
        Self {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        }
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }
}

impl Default for SpatialWindow {
    fn default() -> Self {
        Self::GULF
    }
}

/// Gridded variable payload; forecast archives mix single-level and
/// isobaric-level fields in one file
#[derive(Debug, Clone)]
pub enum VariableData {
    /// Surface or single-level field with layout [time, lat, lon]
    Surface(Array3<f64>),
    /// Isobaric field with layout [time, level, lat, lon]
    Isobaric(Array4<f64>),
}

impl VariableData {
    /// Length of the time axis
    pub fn time_len(&self) -> usize {
        match self {
            VariableData::Surface(a) => a.shape()[0],
            VariableData::Isobaric(a) => a.shape()[0],
        }
    }
}

/// A named gridded variable with its optional units tag
#[derive(Debug, Clone)]
pub struct GridVariable {
    pub name: String,
    pub data: VariableData,
    pub units: Option<String>,
}

/// Immutable in-memory gridded forecast dataset.
///
/// The time coordinate is sorted ascending at construction so that time
/// indices map onto forecast hours deterministically regardless of on-disk
/// ordering. Latitude may be stored ascending or descending; accessors
/// handle both. The only mutation after construction is the declared
/// temperature unit conversion in [`units`].
#[derive(Debug)]
pub struct GriddedDataset {
    longitudes: Vec<f64>,
    latitudes: Vec<f64>,
    levels: Vec<f64>,
    times: Vec<DateTime<Utc>>,
    variables: HashMap<String, GridVariable>,
}

impl GriddedDataset {
    /// Assemble a dataset from coordinate axes and variables, validating
    /// every variable's shape against the axes and sorting the time
    /// coordinate ascending (variables are permuted along with it).
    pub fn new(
        longitudes: Vec<f64>,
        latitudes: Vec<f64>,
        levels: Vec<f64>,
        times: Vec<DateTime<Utc>>,
        variables: Vec<GridVariable>,
    ) -> Result<Self, DatasetError> {
        let (nt, nk, nj, ni) = (times.len(), levels.len(), latitudes.len(), longitudes.len());

        for var in &variables {
            match &var.data {
                VariableData::Surface(a) => {
                    if a.shape() != [nt, nj, ni] {
                        return Err(DatasetError::DimensionMismatch(
                            var.name.clone(),
                            format!(
                                "expected [time={}, lat={}, lon={}], got {:?}",
                                nt,
                                nj,
                                ni,
                                a.shape()
                            ),
                        ));
                    }
                }
                VariableData::Isobaric(a) => {
                    if a.shape() != [nt, nk, nj, ni] {
                        return Err(DatasetError::DimensionMismatch(
                            var.name.clone(),
                            format!(
                                "expected [time={}, level={}, lat={}, lon={}], got {:?}",
                                nt,
                                nk,
                                nj,
                                ni,
                                a.shape()
                            ),
                        ));
                    }
                }
            }
        }

        let mut dataset = Self {
            longitudes,
            latitudes,
            levels,
            times,
            variables: variables
                .into_iter()
                .map(|v| (v.name.clone(), v))
                .collect(),
        };
        dataset.sort_by_time();
        Ok(dataset)
    }

    /// Sort the time coordinate ascending and permute every variable's
    /// time axis to match. No-op when already sorted.
    fn sort_by_time(&mut self) {
        let mut order: Vec<usize> = (0..self.times.len()).collect();
        order.sort_by_key(|&i| self.times[i]);

        if order.iter().enumerate().all(|(i, &o)| i == o) {
            return;
        }

        self.times = order.iter().map(|&i| self.times[i]).collect();
        for var in self.variables.values_mut() {
            let reordered = match &var.data {
                VariableData::Surface(a) => VariableData::Surface(a.select(Axis(0), &order)),
                VariableData::Isobaric(a) => VariableData::Isobaric(a.select(Axis(0), &order)),
            };
            var.data = reordered;
        }
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// Length of the time dimension
    pub fn num_time_steps(&self) -> usize {
        self.times.len()
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Variable names in lexical order, for stable display
    pub fn variable_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.variables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up a variable by name
    pub fn variable(&self, name: &str) -> Result<&GridVariable, DatasetError> {
        self.variables
            .get(name)
            .ok_or_else(|| DatasetError::MissingVariable(name.to_string()))
    }

    pub(crate) fn variable_mut(&mut self, name: &str) -> Option<&mut GridVariable> {
        self.variables.get_mut(name)
    }

    /// Resolve an isobaric level value to its index in the vertical axis
    pub fn level_index(&self, level: f64) -> Result<usize, DatasetError> {
        self.levels
            .iter()
            .position(|&l| (l - level).abs() < 1e-6)
            .ok_or(DatasetError::MissingLevel(level))
    }

    /// Validate a time index against the time dimension
    pub fn check_time_index(&self, index: usize) -> Result<(), DatasetError> {
        if index >= self.times.len() {
            return Err(DatasetError::TimeIndexOutOfRange {
                index,
                len: self.times.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_utils::utc_datetime;
    use ndarray::Array3;

    fn times(hours: &[u32]) -> Vec<DateTime<Utc>> {
        hours
            .iter()
            .map(|&h| utc_datetime(2024, 8, 5, h, 0, 0).unwrap())
            .collect()
    }

    #[test]
    fn test_new_rejects_bad_surface_shape() {
        let var = GridVariable {
            name: "sp".to_string(),
            data: VariableData::Surface(Array3::zeros((2, 3, 3))),
            units: Some("Pa".to_string()),
        };
        let result = GriddedDataset::new(
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![],
            times(&[0, 6]),
            vec![var],
        );
        assert!(matches!(result, Err(DatasetError::DimensionMismatch(_, _))));
    }

    #[test]
    fn test_sorts_unsorted_time_axis() {
        let mut data = Array3::zeros((3, 1, 1));
        data[[0, 0, 0]] = 12.0;
        data[[1, 0, 0]] = 0.0;
        data[[2, 0, 0]] = 6.0;
        let var = GridVariable {
            name: "sp".to_string(),
            data: VariableData::Surface(data),
            units: None,
        };
        let dataset = GriddedDataset::new(
            vec![0.0],
            vec![0.0],
            vec![],
            times(&[12, 0, 6]),
            vec![var],
        )
        .unwrap();

        let sorted: Vec<u32> = dataset
            .times()
            .iter()
            .map(|t| {
                use chrono::Timelike;
                t.hour()
            })
            .collect();
        assert_eq!(sorted, vec![0, 6, 12]);

        // Variable data follows the time permutation
        match &dataset.variable("sp").unwrap().data {
            VariableData::Surface(a) => {
                assert_eq!(a[[0, 0, 0]], 0.0);
                assert_eq!(a[[1, 0, 0]], 6.0);
                assert_eq!(a[[2, 0, 0]], 12.0);
            }
            _ => panic!("expected surface variable"),
        }
    }

    #[test]
    fn test_missing_variable_and_level() {
        let dataset =
            GriddedDataset::new(vec![0.0], vec![0.0], vec![500.0], times(&[0]), vec![]).unwrap();
        assert!(matches!(
            dataset.variable("vo"),
            Err(DatasetError::MissingVariable(_))
        ));
        assert!(dataset.level_index(500.0).is_ok());
        assert!(matches!(
            dataset.level_index(850.0),
            Err(DatasetError::MissingLevel(_))
        ));
    }

    #[test]
    fn test_check_time_index() {
        let dataset =
            GriddedDataset::new(vec![0.0], vec![0.0], vec![], times(&[0, 6]), vec![]).unwrap();
        assert!(dataset.check_time_index(1).is_ok());
        assert!(matches!(
            dataset.check_time_index(2),
            Err(DatasetError::TimeIndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_window_contains() {
        let window = SpatialWindow::GULF;
        assert!(window.contains(-90.0, 30.0));
        assert!(!window.contains(-70.0, 30.0));
        assert!(!window.contains(-90.0, 40.0));
    }
}

use crate::config::Constants;
use crate::data_io::{DatasetError, GridAccessor, GriddedDataset, SpatialWindow};
use crate::severity::{
    combine_severity, precipitation_index, pressure_index, vorticity_index, wind_index,
    SeverityError,
};
use crate::time_utils;
use chrono::{DateTime, Utc};
use ndarray::Array2;
use std::ops::Range;

/// The four normalized contributor fields for one forecast step
#[derive(Debug, Clone)]
pub struct ComponentFields {
    pub pressure: Array2<f64>,
    pub vorticity: Array2<f64>,
    pub precipitation: Array2<f64>,
    pub wind: Array2<f64>,
}

/// One forecast time slice paired with its derived severity field
#[derive(Debug, Clone)]
pub struct ForecastStep {
    /// Valid time of the step
    pub time: DateTime<Utc>,
    /// Position of the step in the dataset's (sorted) time dimension
    pub time_index: usize,
    /// Severity index per grid cell, nominally 0-5
    pub severity: Array2<f64>,
    /// Contributor fields, when requested
    pub components: Option<ComponentFields>,
}

impl ForecastStep {
    /// Valid time as ISO 8601 truncated to hour precision
    pub fn timestamp(&self) -> String {
        time_utils::format_hour(&self.time)
    }
}

/// Compute the severity field for a single forecast time index.
///
/// Slices each input variable to the window, derives the four normalized
/// indicators and combines them. Fails with the triggering error if any
/// input variable or level is absent; there is no partial result.
pub fn compute_step(
    dataset: &GriddedDataset,
    window: SpatialWindow,
    constants: &Constants,
    time_index: usize,
    include_components: bool,
) -> Result<ForecastStep, SeverityError> {
    dataset.check_time_index(time_index)?;
    let accessor = GridAccessor::new(dataset, window);

    let pressure = pressure_index(&accessor, time_index, constants)?;
    let vorticity = vorticity_index(&accessor, time_index, constants)?;
    let wind = wind_index(&accessor, time_index, constants)?;
    let precipitation = precipitation_index(&accessor, time_index, constants)?;

    let severity = combine_severity(&wind, &precipitation, &vorticity, &pressure, constants)?;

    Ok(ForecastStep {
        time: dataset.times()[time_index],
        time_index,
        severity,
        components: include_components.then(|| ComponentFields {
            pressure,
            vorticity,
            precipitation,
            wind,
        }),
    })
}

/// Validate a requested range of time indices against the dataset
pub(crate) fn check_time_range(
    dataset: &GriddedDataset,
    range: &Range<usize>,
) -> Result<(), DatasetError> {
    if range.end > dataset.num_time_steps() && !range.is_empty() {
        return Err(DatasetError::TimeIndexOutOfRange {
            index: range.end - 1,
            len: dataset.num_time_steps(),
        });
    }
    Ok(())
}

/// Lazy driver over a range of forecast time indices.
///
/// Yields steps in ascending time order and stops cleanly at the end of
/// the requested range. A step whose extraction fails yields the
/// triggering error. The iterator holds no external cursor; restart by
/// constructing a new one from the same dataset.
pub struct ForecastIterator<'a> {
    dataset: &'a GriddedDataset,
    window: SpatialWindow,
    constants: Constants,
    range: Range<usize>,
    include_components: bool,
}

impl<'a> ForecastIterator<'a> {
    /// Create an iterator over `range`, rejecting ranges that extend
    /// beyond the dataset's time dimension.
    pub fn new(
        dataset: &'a GriddedDataset,
        window: SpatialWindow,
        constants: &Constants,
        range: Range<usize>,
    ) -> Result<Self, DatasetError> {
        check_time_range(dataset, &range)?;
        Ok(Self {
            dataset,
            window,
            constants: constants.clone(),
            range,
            include_components: false,
        })
    }

    /// Iterate over every time step of the dataset
    pub fn over_all_steps(
        dataset: &'a GriddedDataset,
        window: SpatialWindow,
        constants: &Constants,
    ) -> Self {
        Self {
            dataset,
            window,
            constants: constants.clone(),
            range: 0..dataset.num_time_steps(),
            include_components: false,
        }
    }

    /// Carry the four normalized contributor fields on every step
    pub fn with_components(mut self) -> Self {
        self.include_components = true;
        self
    }
}

impl Iterator for ForecastIterator<'_> {
    type Item = Result<ForecastStep, SeverityError>;

    fn next(&mut self) -> Option<Self::Item> {
        let time_index = self.range.next()?;
        Some(compute_step(
            self.dataset,
            self.window,
            &self.constants,
            time_index,
            self.include_components,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl ExactSizeIterator for ForecastIterator<'_> {}

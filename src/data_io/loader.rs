use super::{DatasetError, GriddedDataset, GridVariable, VariableData};
use crate::data_io::utils;
use crate::time_utils;
use chrono::{DateTime, Utc};
use ndarray::{Array3, Array4};
use std::path::Path;

/// Load an ECMWF-style gridded forecast archive into memory.
///
/// Expects coordinate variables `longitude`, `latitude`, optionally
/// `isobaricInhPa`, and a CF-encoded `valid_time` (or `time`) axis.
/// Data variables are classified by rank: 3-D fields are surface
/// variables `[time, lat, lon]`, 4-D fields are isobaric variables
/// `[time, level, lat, lon]`. Anything else is skipped. The returned
/// dataset is sorted by time ascending.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<GriddedDataset, DatasetError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DatasetError::FileNotFound(path.display().to_string()));
    }

    let file = netcdf::open(path)?;

    let longitudes = read_coord(&file, "longitude")?;
    let latitudes = read_coord(&file, "latitude")?;
    let levels = if file.variable(utils::LEVEL_COORD).is_some() {
        read_coord(&file, utils::LEVEL_COORD)?
    } else {
        Vec::new()
    };
    let times = read_times(&file)?;

    let mut variables = Vec::new();
    for var in file.variables() {
        let name = var.name();
        if utils::is_coordinate_var(&name) {
            continue;
        }

        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let data = match shape.len() {
            3 => {
                let raw: Vec<f64> = var.get_values(..)?;
                VariableData::Surface(
                    Array3::from_shape_vec((shape[0], shape[1], shape[2]), raw)
                        .map_err(|_| DatasetError::ConversionError)?,
                )
            }
            4 => {
                let raw: Vec<f64> = var.get_values(..)?;
                VariableData::Isobaric(
                    Array4::from_shape_vec((shape[0], shape[1], shape[2], shape[3]), raw)
                        .map_err(|_| DatasetError::ConversionError)?,
                )
            }
            // scalars and 1-D auxiliaries are not gridded fields
            _ => continue,
        };

        variables.push(GridVariable {
            name,
            data,
            units: read_units(&var),
        });
    }

    GriddedDataset::new(longitudes, latitudes, levels, times, variables)
}

/// Read a 1-D coordinate variable as f64 values
fn read_coord(file: &netcdf::File, name: &str) -> Result<Vec<f64>, DatasetError> {
    let var = file
        .variable(name)
        .ok_or_else(|| DatasetError::MissingVariable(name.to_string()))?;
    if var.dimensions().len() != 1 {
        return Err(DatasetError::DimensionMismatch(
            name.to_string(),
            format!(
                "expected a 1-D coordinate, got {} dimensions",
                var.dimensions().len()
            ),
        ));
    }
    Ok(var.get_values(..)?)
}

/// Read and decode the time coordinate (`valid_time` or `time`)
fn read_times(file: &netcdf::File) -> Result<Vec<DateTime<Utc>>, DatasetError> {
    let var = file
        .variable("valid_time")
        .or_else(|| file.variable("time"))
        .ok_or_else(|| DatasetError::MissingVariable("valid_time".to_string()))?;

    let offsets: Vec<f64> = var.get_values(..)?;
    // ECMWF archives converted through xarray carry epoch seconds when
    // no units attribute survives
    let units =
        read_attr_string(&var, "units").unwrap_or_else(|| "seconds since 1970-01-01".to_string());

    time_utils::decode_cf_times(&offsets, &units).map_err(DatasetError::TimeDecodeError)
}

/// Read a string attribute of a variable, if present
fn read_attr_string(var: &netcdf::Variable, name: &str) -> Option<String> {
    match var.attribute(name).map(|a| a.value()) {
        Some(Ok(netcdf::AttributeValue::Str(s))) => Some(s),
        _ => None,
    }
}

/// Read a variable's units tag
fn read_units(var: &netcdf::Variable) -> Option<String> {
    read_attr_string(var, "units")
}

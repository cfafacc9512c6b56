use crate::config::Constants;
use crate::data_io::{utils, DatasetError, GridAccessor};
use ndarray::Array2;

/// Linearly rescale a field between fixed reference bounds.
///
/// Values outside [min, max] legitimately map outside [0, 1]; no
/// clamping is applied.
pub fn normalize(field: &Array2<f64>, min_val: f64, max_val: f64) -> Array2<f64> {
    field.mapv(|v| (v - min_val) / (max_val - min_val))
}

/// Normalized surface pressure indicator for one forecast time.
/// Source pressure is in Pa and converted to hPa before rescaling.
pub fn pressure_index(
    accessor: &GridAccessor,
    time_index: usize,
    constants: &Constants,
) -> Result<Array2<f64>, DatasetError> {
    let sp = accessor.select(utils::SURFACE_PRESSURE, None, time_index)?;
    let sp_hpa = sp.mapv(|v| v / constants.pa_per_hpa);
    Ok(normalize(
        &sp_hpa,
        constants.pressure_ref.0,
        constants.pressure_ref.1,
    ))
}

/// Normalized relative vorticity indicator, sampled at the configured
/// isobaric level (500 hPa by default).
pub fn vorticity_index(
    accessor: &GridAccessor,
    time_index: usize,
    constants: &Constants,
) -> Result<Array2<f64>, DatasetError> {
    let vo = accessor.select(utils::VORTICITY, Some(constants.vorticity_level), time_index)?;
    Ok(normalize(
        &vo,
        constants.vorticity_ref.0,
        constants.vorticity_ref.1,
    ))
}

/// Normalized precipitation-rate indicator.
///
/// The accumulated depth is converted to an approximate intensity by
/// `tp * 39.37 / 6`; the 6-hour divisor is an empirical correction kept
/// from the calibration, not a documented unit conversion.
pub fn precipitation_index(
    accessor: &GridAccessor,
    time_index: usize,
    constants: &Constants,
) -> Result<Array2<f64>, DatasetError> {
    let tp = accessor.select(utils::TOTAL_PRECIPITATION, None, time_index)?;
    let approx_prate =
        tp.mapv(|v| (v * constants.meters_to_inches) / constants.prate_interval_hours);
    Ok(normalize(
        &approx_prate,
        constants.prate_ref.0,
        constants.prate_ref.1,
    ))
}

/// Normalized wind-speed indicator from the u and v components at the
/// configured isobaric level (1000 hPa by default).
///
/// The speed is doubled before rescaling; the factor is an empirical
/// scaling correction kept from the calibration.
pub fn wind_index(
    accessor: &GridAccessor,
    time_index: usize,
    constants: &Constants,
) -> Result<Array2<f64>, DatasetError> {
    let u = accessor.select(utils::U_WIND, Some(constants.wind_level), time_index)?;
    let v = accessor.select(utils::V_WIND, Some(constants.wind_level), time_index)?;

    let mut speed = Array2::zeros(u.raw_dim());
    for ((j, i), s) in speed.indexed_iter_mut() {
        let (uw, vw) = (u[[j, i]], v[[j, i]]);
        *s = (uw * uw + vw * vw).sqrt() * constants.wind_speed_factor;
    }

    Ok(normalize(&speed, constants.wind_ref.0, constants.wind_ref.1))
}

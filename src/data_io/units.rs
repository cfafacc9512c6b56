use super::{GriddedDataset, VariableData};
use crate::data_io::utils;

/// Celsius zero point in Kelvin
pub const KELVIN_OFFSET: f64 = 273.15;

/// Ensure the temperature field is expressed in Kelvin.
///
/// Inspects the variable's units tag: "C" converts with `+273.15`, "F"
/// with `(v - 32) * 5/9 + 273.15`, anything else (including a missing tag)
/// is treated as already correct and left untouched. The tag is set to
/// "K" after converting, which makes the operation idempotent. This is
/// the only in-place mutation performed on a dataset and must happen
/// before any field extraction. A dataset without a temperature variable
/// is left unchanged.
pub fn convert_temperature_to_kelvin(dataset: &mut GriddedDataset) {
    let Some(var) = dataset.variable_mut(utils::TEMPERATURE) else {
        return;
    };

    match var.units.as_deref() {
        Some("C") => {
            apply_in_place(&mut var.data, |v| v + KELVIN_OFFSET);
            var.units = Some("K".to_string());
        }
        Some("F") => {
            apply_in_place(&mut var.data, |v| (v - 32.0) * (5.0 / 9.0) + KELVIN_OFFSET);
            var.units = Some("K".to_string());
        }
        _ => {}
    }
}

fn apply_in_place(data: &mut VariableData, f: impl Fn(f64) -> f64) {
    match data {
        VariableData::Surface(a) => a.mapv_inplace(f),
        VariableData::Isobaric(a) => a.mapv_inplace(f),
    }
}

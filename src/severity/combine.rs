use super::SeverityError;
use crate::config::Constants;
use ndarray::Array2;

/// Combine the four normalized indicator fields into one severity field.
///
/// `severity = |w_wind*wind + w_prate*prate + w_vort*vort + w_press*press| * scale`
///
/// The absolute value keeps small negative normalized vorticity or
/// pressure values from flipping the sign of the composite; the final
/// rescaling maps the composite onto the intended 0-5 severity scale.
/// The four inputs must share one grid shape; callers produce them from
/// the same window and time slice, so a mismatch is a defect upstream.
pub fn combine_severity(
    wind: &Array2<f64>,
    prate: &Array2<f64>,
    vorticity: &Array2<f64>,
    pressure: &Array2<f64>,
    constants: &Constants,
) -> Result<Array2<f64>, SeverityError> {
    let expected = wind.dim();
    for (field, array) in [
        ("prate", prate),
        ("vorticity", vorticity),
        ("pressure", pressure),
    ] {
        if array.dim() != expected {
            return Err(SeverityError::ShapeMismatch {
                field,
                expected,
                found: array.dim(),
            });
        }
    }

    let mut severity = wind.mapv(|v| v * constants.weight_wind);
    severity.zip_mut_with(prate, |s, &v| *s += constants.weight_prate * v);
    severity.zip_mut_with(vorticity, |s, &v| *s += constants.weight_vorticity * v);
    severity.zip_mut_with(pressure, |s, &v| *s += constants.weight_pressure * v);
    severity.mapv_inplace(|v| v.abs() * constants.severity_scale);

    Ok(severity)
}

/// Utility constants and helpers for ECMWF-style forecast archives

/// Surface pressure (Pa)
pub const SURFACE_PRESSURE: &str = "sp";
/// Relative vorticity on isobaric levels (1/s)
pub const VORTICITY: &str = "vo";
/// Total precipitation, accumulated depth (m)
pub const TOTAL_PRECIPITATION: &str = "tp";
/// Eastward wind component on isobaric levels (m/s)
pub const U_WIND: &str = "u";
/// Northward wind component on isobaric levels (m/s)
pub const V_WIND: &str = "v";
/// Temperature (K after unit normalization)
pub const TEMPERATURE: &str = "t";

/// The fields consumed by the severity pipeline
pub const SEVERITY_INPUT_VARS: &[&str] = &[
    SURFACE_PRESSURE,
    VORTICITY,
    TOTAL_PRECIPITATION,
    U_WIND,
    V_WIND,
];

/// Vertical coordinate name used by ECMWF isobaric archives
pub const LEVEL_COORD: &str = "isobaricInhPa";

/// Get the conventional SI units for a known forecast variable
pub fn default_units(variable_name: &str) -> String {
    match variable_name {
        SURFACE_PRESSURE => "Pa".to_string(),
        VORTICITY => "s**-1".to_string(),
        TOTAL_PRECIPITATION => "m".to_string(),
        U_WIND | V_WIND => "m s**-1".to_string(),
        TEMPERATURE => "K".to_string(),
        _ => "unknown".to_string(),
    }
}

/// Check if a variable name represents one of the severity input fields
pub fn is_severity_input_var(variable_name: &str) -> bool {
    SEVERITY_INPUT_VARS.contains(&variable_name)
}

/// Check if a variable name represents a coordinate axis rather than data
pub fn is_coordinate_var(variable_name: &str) -> bool {
    matches!(
        variable_name,
        "longitude" | "latitude" | "isobaricInhPa" | "valid_time" | "time" | "step" | "number"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_units() {
        assert_eq!(default_units("sp"), "Pa");
        assert_eq!(default_units("u"), "m s**-1");
        assert_eq!(default_units("tp"), "m");
        assert_eq!(default_units("mystery"), "unknown");
    }

    #[test]
    fn test_is_severity_input_var() {
        assert!(is_severity_input_var("sp"));
        assert!(is_severity_input_var("vo"));
        assert!(!is_severity_input_var("t"));
        assert!(!is_severity_input_var("latitude"));
    }

    #[test]
    fn test_is_coordinate_var() {
        assert!(is_coordinate_var("latitude"));
        assert!(is_coordinate_var("valid_time"));
        assert!(!is_coordinate_var("sp"));
    }
}

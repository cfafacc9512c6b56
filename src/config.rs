use crate::data_io::output_trait::OutputFormat;
use crate::data_io::SpatialWindow;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;

/// Calibration constants for the severity index.
///
/// Every value here is an empirically chosen product decision, not a
/// physically derived quantity; adjusting the calibration means editing
/// these fields, never restructuring the pipeline.
#[derive(Clone, Debug)]
pub struct Constants {
    /// Reference (min, max) for surface pressure normalization (hPa)
    pub pressure_ref: (f64, f64),
    /// Reference (min, max) for 500 hPa relative vorticity normalization (1/s)
    pub vorticity_ref: (f64, f64),
    /// Reference (min, max) for precipitation-rate normalization
    pub prate_ref: (f64, f64),
    /// Reference (min, max) for wind-speed normalization
    pub wind_ref: (f64, f64),

    /// Isobaric level at which vorticity is sampled (hPa)
    pub vorticity_level: f64,
    /// Isobaric level at which wind components are sampled (hPa)
    pub wind_level: f64,

    /// Pa per hPa, for the surface pressure conversion
    pub pa_per_hpa: f64,
    /// Metres-to-inches factor in the precipitation-rate approximation
    pub meters_to_inches: f64,
    /// Accumulation interval (hours) dividing the precipitation depth
    pub prate_interval_hours: f64,
    /// Empirical wind-speed scaling factor (not a unit conversion)
    pub wind_speed_factor: f64,

    /// Severity weight of the normalized wind field
    pub weight_wind: f64,
    /// Severity weight of the normalized precipitation-rate field
    pub weight_prate: f64,
    /// Severity weight of the normalized vorticity field
    pub weight_vorticity: f64,
    /// Severity weight of the normalized pressure field
    pub weight_pressure: f64,
    /// Rescaling of the weighted composite onto the 0-5 severity scale
    pub severity_scale: f64,

    /// Spatial window used for grid extraction
    pub window: SpatialWindow,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            pressure_ref: (980.0, 1020.0),
            vorticity_ref: (-0.0002, 0.0016),
            prate_ref: (0.1, 1.0),
            wind_ref: (0.0, 140.0),

            vorticity_level: 500.0,
            wind_level: 1000.0,

            pa_per_hpa: 100.0,
            meters_to_inches: 39.37,
            prate_interval_hours: 6.0,
            wind_speed_factor: 2.0,

            // mostly wind and precipitation, with small vorticity and
            // pressure components for depth
            weight_wind: 0.50,
            weight_prate: 0.30,
            weight_vorticity: 0.15,
            weight_pressure: 0.05,
            severity_scale: 10.0,

            window: SpatialWindow::GULF,
        }
    }
}

/// Main configuration structure with CLI support
#[derive(Clone, Debug)]
pub struct Config {
    /// Calibration constants
    pub constants: Constants,

    /// Input forecast archive path
    pub input_path: PathBuf,
    /// Output file path
    pub output_path: PathBuf,
    /// Output format (detected from the output path when not forced)
    pub output_format: OutputFormat,

    /// First forecast time index to process
    pub start_step: usize,
    /// Number of forecast steps to process (None = through the last step)
    pub num_steps: Option<usize>,

    /// Include the four normalized component fields in the output
    pub include_components: bool,
    /// Process forecast steps in parallel
    pub parallel: bool,
    /// Number of worker threads for parallel runs
    pub num_threads: usize,
    /// Verbose output
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            constants: Constants::default(),
            input_path: PathBuf::from("./input.nc"),
            output_path: PathBuf::from("./severity.nc"),
            output_format: OutputFormat::NetCdf,
            start_step: 0,
            num_steps: None,
            include_components: false,
            parallel: false,
            num_threads: 4,
            verbose: false,
        }
    }
}

impl Config {
    /// Build a Config from the arguments of the `run` subcommand
    pub fn from_run_matches(matches: &clap::ArgMatches) -> Result<Self, String> {
        let input_path = PathBuf::from(matches.get_one::<String>("input").unwrap());
        let output_path = PathBuf::from(matches.get_one::<String>("output").unwrap());

        let output_format = match matches.get_one::<String>("format").map(String::as_str) {
            Some("auto") | None => OutputFormat::from_path(&output_path),
            Some(other) => other.parse()?,
        };

        let start_step: usize = matches
            .get_one::<String>("start-step")
            .unwrap()
            .parse()
            .map_err(|_| "Invalid start step")?;
        let num_steps: Option<usize> = match matches.get_one::<String>("num-steps") {
            Some(s) => Some(s.parse().map_err(|_| "Invalid number of steps")?),
            None => None,
        };
        let num_threads: usize = matches
            .get_one::<String>("threads")
            .unwrap()
            .parse()
            .map_err(|_| "Invalid thread count")?;

        let mut constants = Constants::default();
        if let Some(window) = parse_window_arg(matches.get_one::<String>("window"))? {
            constants.window = window;
        }

        let config = Self {
            constants,
            input_path,
            output_path,
            output_format,
            start_step,
            num_steps,
            include_components: matches.get_flag("components"),
            parallel: matches.get_flag("parallel"),
            num_threads,
            verbose: matches.get_flag("verbose"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create an Arc<Config> for thread-safe sharing
    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        let w = &self.constants.window;
        if w.lon_min >= w.lon_max {
            return Err("Window longitude range is empty".to_string());
        }
        if w.lat_min >= w.lat_max {
            return Err("Window latitude range is empty".to_string());
        }
        if w.lon_min < -180.0 || w.lon_max > 180.0 {
            return Err("Longitude must be between -180 and 180 degrees".to_string());
        }
        if w.lat_min < -90.0 || w.lat_max > 90.0 {
            return Err("Latitude must be between -90 and 90 degrees".to_string());
        }
        if self.num_threads == 0 {
            return Err("Thread count must be positive".to_string());
        }
        if let Some(0) = self.num_steps {
            return Err("Number of steps must be positive".to_string());
        }
        if !self.input_path.exists() {
            return Err(format!(
                "Input path does not exist: {}",
                self.input_path.display()
            ));
        }
        Ok(())
    }

    /// Create a Config for testing purposes (bypasses CLI parsing and
    /// the input-path existence check)
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self::default()
    }
}

/// Shared argument definitions for the `run` subcommand
pub fn run_args() -> Vec<Arg> {
    vec![
        Arg::new("input")
            .short('i')
            .long("input")
            .value_name("PATH")
            .help("Input gridded forecast archive (NetCDF)")
            .required(true),
        Arg::new("output")
            .short('o')
            .long("output")
            .value_name("PATH")
            .help("Output file for severity fields")
            .default_value("severity.nc"),
        Arg::new("format")
            .short('f')
            .long("format")
            .value_name("FORMAT")
            .help("Output format")
            .value_parser(["netcdf", "ascii", "auto"])
            .default_value("auto"),
        Arg::new("start-step")
            .short('s')
            .long("start-step")
            .value_name("INDEX")
            .help("First forecast time index to process")
            .default_value("0"),
        Arg::new("num-steps")
            .short('n')
            .long("num-steps")
            .value_name("COUNT")
            .help("Number of forecast steps to process (default: through the last step)"),
        Arg::new("window")
            .short('w')
            .long("window")
            .value_name("LON_MIN,LON_MAX,LAT_MIN,LAT_MAX")
            .help("Extraction window in degrees (default: Gulf domain -97,-79,22,37)"),
        Arg::new("components")
            .short('c')
            .long("components")
            .help("Include the four normalized component fields in the output")
            .action(clap::ArgAction::SetTrue),
        Arg::new("parallel")
            .short('p')
            .long("parallel")
            .help("Process forecast steps in parallel")
            .action(clap::ArgAction::SetTrue),
        Arg::new("threads")
            .short('j')
            .long("threads")
            .value_name("COUNT")
            .help("Number of worker threads for parallel runs")
            .default_value("4"),
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Enable verbose output")
            .action(clap::ArgAction::SetTrue),
    ]
}

/// Build the `run` subcommand
pub fn run_command() -> Command {
    Command::new("run")
        .about("Compute severity fields over a range of forecast steps")
        .args(run_args())
}

fn parse_window_arg(arg: Option<&String>) -> Result<Option<SpatialWindow>, String> {
    let Some(spec) = arg else {
        return Ok(None);
    };
    let parts: Result<Vec<f64>, _> = spec.split(',').map(|p| p.trim().parse::<f64>()).collect();
    let parts = parts.map_err(|_| format!("Invalid window specification: {}", spec))?;
    if parts.len() != 4 {
        return Err(format!(
            "Window must have four comma-separated values, got {}",
            parts.len()
        ));
    }
    Ok(Some(SpatialWindow::new(
        parts[0], parts[1], parts[2], parts[3],
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants_match_calibration() {
        let c = Constants::default();
        assert_eq!(c.pressure_ref, (980.0, 1020.0));
        assert_eq!(c.vorticity_ref, (-0.0002, 0.0016));
        assert_eq!(c.prate_ref, (0.1, 1.0));
        assert_eq!(c.wind_ref, (0.0, 140.0));
        assert_eq!(c.vorticity_level, 500.0);
        assert_eq!(c.wind_level, 1000.0);
        assert_eq!(c.severity_scale, 10.0);
        // weights sum to one
        let total = c.weight_wind + c.weight_prate + c.weight_vorticity + c.weight_pressure;
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_window_is_gulf_domain() {
        let c = Constants::default();
        assert_eq!(c.window, SpatialWindow::new(-97.0, -79.0, 22.0, 37.0));
    }

    #[test]
    fn test_validate_rejects_empty_window() {
        let mut config = Config::for_testing();
        config.constants.window = SpatialWindow::new(-79.0, -97.0, 22.0, 37.0);
        assert!(config
            .validate()
            .unwrap_err()
            .contains("longitude range is empty"));
    }

    #[test]
    fn test_validate_rejects_zero_threads() {
        let mut config = Config::for_testing();
        config.num_threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_window_arg() {
        let window = parse_window_arg(Some(&"-95,-81,25,36".to_string()))
            .unwrap()
            .unwrap();
        assert_eq!(window, SpatialWindow::new(-95.0, -81.0, 25.0, 36.0));

        assert!(parse_window_arg(Some(&"-95,-81".to_string())).is_err());
        assert!(parse_window_arg(Some(&"a,b,c,d".to_string())).is_err());
        assert!(parse_window_arg(None).unwrap().is_none());
    }
}

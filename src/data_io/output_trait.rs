use crate::data_io::SpatialWindow;
use crate::forecast::ForecastStep;
use std::collections::HashMap;
use std::path::Path;

/// Error types for severity output operations
#[derive(Debug, Clone)]
pub enum WriteError {
    IoError(String),
    FormatError(String),
    UnsupportedFeature(String),
    InvalidData(String),
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::IoError(msg) => write!(f, "IO error: {}", msg),
            WriteError::FormatError(msg) => write!(f, "Format error: {}", msg),
            WriteError::UnsupportedFeature(msg) => write!(f, "Unsupported feature: {}", msg),
            WriteError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
        }
    }
}

impl std::error::Error for WriteError {}

/// Metadata for severity output files
#[derive(Debug, Clone)]
pub struct SeverityMetadata {
    pub source: String,
    pub window: SpatialWindow,
    pub creation_time: String,
    pub global_attributes: HashMap<String, String>,
}

impl Default for SeverityMetadata {
    fn default() -> Self {
        Self {
            source: "unknown".to_string(),
            window: SpatialWindow::GULF,
            creation_time: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            global_attributes: HashMap::new(),
        }
    }
}

/// Generic trait for writing per-step severity output to different formats
pub trait StepWriter: Send {
    /// Create or initialize the output file
    fn create(&mut self, expected_steps: usize) -> Result<(), WriteError>;

    /// Write a single forecast step
    fn write_step(&mut self, step: &ForecastStep) -> Result<(), WriteError>;

    /// Write multiple forecast steps at once
    fn write_steps(&mut self, steps: &[ForecastStep]) -> Result<(), WriteError>;

    /// Set global metadata and attributes
    fn set_metadata(&mut self, metadata: &SeverityMetadata) -> Result<(), WriteError>;

    /// Add custom global attribute
    fn add_global_attribute(&mut self, name: &str, value: &str) -> Result<(), WriteError>;

    /// Finalize and close the output file
    fn close(&mut self) -> Result<(), WriteError>;

    /// Get the output file path
    fn get_output_path(&self) -> &str;
}

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    NetCdf,
    Ascii,
}

impl OutputFormat {
    /// Detect output format from file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("txt") | Some("ascii") | Some("csv") => OutputFormat::Ascii,
            _ => OutputFormat::NetCdf,
        }
    }

    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::NetCdf => "nc",
            OutputFormat::Ascii => "txt",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::NetCdf => write!(f, "netcdf"),
            OutputFormat::Ascii => write!(f, "ascii"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "netcdf" | "nc" | "netcdf4" => Ok(OutputFormat::NetCdf),
            "ascii" | "txt" | "csv" => Ok(OutputFormat::Ascii),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Factory function to create the appropriate writer for the format.
/// The windowed coordinate arrays become the output file's grid.
pub fn create_writer(
    output_path: &Path,
    format: OutputFormat,
    longitudes: Vec<f64>,
    latitudes: Vec<f64>,
) -> Result<Box<dyn StepWriter>, WriteError> {
    match format {
        OutputFormat::NetCdf => {
            let writer = crate::data_io::writer::NetCDFSeverityWriter::new(
                output_path,
                longitudes,
                latitudes,
            )?;
            Ok(Box::new(writer))
        }
        OutputFormat::Ascii => {
            let writer = crate::data_io::ascii_writer::AsciiSeverityWriter::new(
                output_path,
                longitudes,
                latitudes,
            )?;
            Ok(Box::new(writer))
        }
    }
}

/// Convenience function to auto-detect format and create writer
pub fn create_writer_auto(
    output_path: &Path,
    longitudes: Vec<f64>,
    latitudes: Vec<f64>,
) -> Result<Box<dyn StepWriter>, WriteError> {
    let format = OutputFormat::from_path(output_path);
    create_writer(output_path, format, longitudes, latitudes)
}

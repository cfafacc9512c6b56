use crate::data_io::output_trait::{SeverityMetadata, StepWriter, WriteError};
use crate::forecast::ForecastStep;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// ASCII writer for severity output; one row per grid cell per step
pub struct AsciiSeverityWriter {
    file_path: String,
    longitudes: Vec<f64>,
    latitudes: Vec<f64>,
    metadata: Option<SeverityMetadata>,
    steps: Vec<ForecastStep>,
}

impl AsciiSeverityWriter {
    pub fn new(
        file_path: &Path,
        longitudes: Vec<f64>,
        latitudes: Vec<f64>,
    ) -> Result<Self, WriteError> {
        Ok(Self {
            file_path: file_path.to_string_lossy().to_string(),
            longitudes,
            latitudes,
            metadata: None,
            steps: Vec::new(),
        })
    }

    fn check_step_shape(&self, step: &ForecastStep) -> Result<(), WriteError> {
        let expected = (self.latitudes.len(), self.longitudes.len());
        if step.severity.dim() != expected {
            return Err(WriteError::InvalidData(format!(
                "severity field is {:?}, writer grid is {:?}",
                step.severity.dim(),
                expected
            )));
        }
        Ok(())
    }
}

impl StepWriter for AsciiSeverityWriter {
    fn create(&mut self, expected_steps: usize) -> Result<(), WriteError> {
        println!(
            "Creating ASCII file: {} (expecting {} forecast steps)",
            self.file_path, expected_steps
        );
        Ok(())
    }

    fn write_step(&mut self, step: &ForecastStep) -> Result<(), WriteError> {
        self.check_step_shape(step)?;
        self.steps.push(step.clone());
        Ok(())
    }

    fn write_steps(&mut self, steps: &[ForecastStep]) -> Result<(), WriteError> {
        for step in steps {
            self.write_step(step)?;
        }
        Ok(())
    }

    fn set_metadata(&mut self, metadata: &SeverityMetadata) -> Result<(), WriteError> {
        self.metadata = Some(metadata.clone());
        Ok(())
    }

    fn add_global_attribute(&mut self, _name: &str, _value: &str) -> Result<(), WriteError> {
        // ASCII files don't support structured attributes
        Ok(())
    }

    fn close(&mut self) -> Result<(), WriteError> {
        if self.steps.is_empty() {
            return Err(WriteError::InvalidData(
                "No forecast steps to write".to_string(),
            ));
        }

        // Steps may arrive out of order from parallel runs
        self.steps.sort_by_key(|s| s.time_index);

        let mut file = File::create(&self.file_path)
            .map_err(|e| WriteError::IoError(format!("Failed to create ASCII file: {}", e)))?;

        writeln!(file, "# Storm severity index output")
            .map_err(|e| WriteError::IoError(e.to_string()))?;

        if let Some(ref metadata) = self.metadata {
            writeln!(file, "# Creation time: {}", metadata.creation_time)
                .map_err(|e| WriteError::IoError(e.to_string()))?;
            writeln!(file, "# Data source: {}", metadata.source)
                .map_err(|e| WriteError::IoError(e.to_string()))?;
            writeln!(
                file,
                "# Window: lon [{:.2}, {:.2}], lat [{:.2}, {:.2}]",
                metadata.window.lon_min,
                metadata.window.lon_max,
                metadata.window.lat_min,
                metadata.window.lat_max
            )
            .map_err(|e| WriteError::IoError(e.to_string()))?;
        }

        let with_components = self.steps.iter().all(|s| s.components.is_some());
        if with_components {
            writeln!(file, "# Columns: valid_time longitude(deg) latitude(deg) severity pressure_norm vorticity_norm prate_norm wind_norm")
                .map_err(|e| WriteError::IoError(e.to_string()))?;
        } else {
            writeln!(
                file,
                "# Columns: valid_time longitude(deg) latitude(deg) severity"
            )
            .map_err(|e| WriteError::IoError(e.to_string()))?;
        }

        for step in &self.steps {
            let timestamp = step.timestamp();
            for (j, &lat) in self.latitudes.iter().enumerate() {
                for (i, &lon) in self.longitudes.iter().enumerate() {
                    if let Some(ref components) = step.components {
                        writeln!(
                            file,
                            "{} {:.4} {:.4} {:.4} {:.6} {:.6} {:.6} {:.6}",
                            timestamp,
                            lon,
                            lat,
                            step.severity[[j, i]],
                            components.pressure[[j, i]],
                            components.vorticity[[j, i]],
                            components.precipitation[[j, i]],
                            components.wind[[j, i]],
                        )
                        .map_err(|e| WriteError::IoError(e.to_string()))?;
                    } else {
                        writeln!(
                            file,
                            "{} {:.4} {:.4} {:.4}",
                            timestamp,
                            lon,
                            lat,
                            step.severity[[j, i]],
                        )
                        .map_err(|e| WriteError::IoError(e.to_string()))?;
                    }
                }
            }
        }

        println!(
            "Successfully wrote {} forecast steps to ASCII file: {}",
            self.steps.len(),
            self.file_path
        );
        Ok(())
    }

    fn get_output_path(&self) -> &str {
        &self.file_path
    }
}

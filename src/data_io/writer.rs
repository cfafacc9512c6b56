use crate::data_io::output_trait::{SeverityMetadata, StepWriter, WriteError};
use crate::forecast::ForecastStep;
use crate::time_utils;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;

const FILL_VALUE: f64 = -9999.0;

/// NetCDF writer for severity output.
///
/// Steps are buffered (parallel runs deliver them out of order) and the
/// file is written sequentially at close to guarantee a correctly
/// ordered unlimited time dimension, just like a CF-conventions archive.
pub struct NetCDFSeverityWriter {
    pub file_path: String,
    longitudes: Vec<f64>,
    latitudes: Vec<f64>,
    metadata: Option<SeverityMetadata>,
    extra_attributes: HashMap<String, String>,
    steps: Vec<ForecastStep>,
    file_created: bool,
}

impl NetCDFSeverityWriter {
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
            extra_attributes: HashMap::new(),
            steps: Vec::new(),
            file_created: false,
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

    fn write_file(&mut self) -> Result<(), WriteError> {
        let (nj, ni) = (self.latitudes.len(), self.longitudes.len());
        let nt = self.steps.len();

        let mut file = netcdf::create(&self.file_path).map_err(|e| {
            WriteError::IoError(format!(
                "Failed to create NetCDF file '{}': {}",
                self.file_path, e
            ))
        })?;

        file.add_unlimited_dimension("time")
            .map_err(|e| WriteError::FormatError(format!("Failed to create time dimension: {}", e)))?;
        file.add_dimension("latitude", nj)
            .map_err(|e| WriteError::FormatError(format!("Failed to create latitude dimension: {}", e)))?;
        file.add_dimension("longitude", ni)
            .map_err(|e| WriteError::FormatError(format!("Failed to create longitude dimension: {}", e)))?;

        file.add_attribute("title", "Storm severity index forecast")
            .map_err(|e| WriteError::FormatError(format!("Failed to add title attribute: {}", e)))?;
        file.add_attribute("source", "ssi_rust severity pipeline")
            .map_err(|e| WriteError::FormatError(format!("Failed to add source attribute: {}", e)))?;
        file.add_attribute("Conventions", "CF-1.6")
            .map_err(|e| WriteError::FormatError(format!("Failed to add Conventions attribute: {}", e)))?;

        let creation_time = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
        file.add_attribute("history", format!("Created on {}", creation_time))
            .map_err(|e| WriteError::FormatError(format!("Failed to add history attribute: {}", e)))?;

        if let Some(ref metadata) = self.metadata {
            file.add_attribute("input_source", metadata.source.as_str())
                .map_err(|e| WriteError::FormatError(format!("Failed to add input_source: {}", e)))?;
            for (name, value) in &metadata.global_attributes {
                file.add_attribute(name.as_str(), value.as_str())
                    .map_err(|e| WriteError::FormatError(format!("Failed to add {}: {}", name, e)))?;
            }
        }
        for (name, value) in &self.extra_attributes {
            file.add_attribute(name.as_str(), value.as_str())
                .map_err(|e| WriteError::FormatError(format!("Failed to add {}: {}", name, e)))?;
        }

        let reference_time = self.steps[0].time;
        let time_units = format!(
            "hours since {}",
            reference_time.format("%Y-%m-%d %H:%M:%S")
        );

        // Coordinate variables
        {
            let mut time_var = file
                .add_variable::<f64>("time", &["time"])
                .map_err(|e| WriteError::FormatError(format!("Failed to create time variable: {}", e)))?;
            time_var
                .put_attribute("units", time_units.as_str())
                .map_err(|e| WriteError::FormatError(format!("Failed to add time units: {}", e)))?;
            time_var
                .put_attribute("long_name", "forecast valid time")
                .map_err(|e| WriteError::FormatError(format!("Failed to add time long_name: {}", e)))?;
        }
        {
            let mut lat_var = file
                .add_variable::<f64>("latitude", &["latitude"])
                .map_err(|e| WriteError::FormatError(format!("Failed to create latitude variable: {}", e)))?;
            lat_var
                .put_attribute("units", "degrees_north")
                .map_err(|e| WriteError::FormatError(format!("Failed to add latitude units: {}", e)))?;
        }
        {
            let mut lon_var = file
                .add_variable::<f64>("longitude", &["longitude"])
                .map_err(|e| WriteError::FormatError(format!("Failed to create longitude variable: {}", e)))?;
            lon_var
                .put_attribute("units", "degrees_east")
                .map_err(|e| WriteError::FormatError(format!("Failed to add longitude units: {}", e)))?;
        }

        let with_components = self.steps.iter().all(|s| s.components.is_some());
        let mut var_specs: Vec<(&str, &str)> = vec![("severity", "storm severity index (0-5 scale)")];
        if with_components {
            var_specs.extend([
                ("pressure_norm", "normalized surface pressure"),
                ("vorticity_norm", "normalized 500 hPa relative vorticity"),
                ("prate_norm", "normalized precipitation rate"),
                ("wind_norm", "normalized 1000 hPa wind speed"),
            ]);
        }

        for (name, long_name) in &var_specs {
            let mut var = file
                .add_variable::<f64>(name, &["time", "latitude", "longitude"])
                .map_err(|e| WriteError::FormatError(format!("Failed to create {} variable: {}", name, e)))?;
            var.put_attribute("units", "1")
                .map_err(|e| WriteError::FormatError(format!("Failed to add units to {}: {}", name, e)))?;
            var.put_attribute("long_name", *long_name)
                .map_err(|e| WriteError::FormatError(format!("Failed to add long_name to {}: {}", name, e)))?;
            var.put_attribute("_FillValue", FILL_VALUE)
                .map_err(|e| WriteError::FormatError(format!("Failed to add _FillValue to {}: {}", name, e)))?;
        }

        // Coordinate values
        {
            let mut time_var = file
                .variable_mut("time")
                .ok_or_else(|| WriteError::FormatError("Time variable not found".to_string()))?;
            let time_values: Vec<f64> = self
                .steps
                .iter()
                .map(|s| time_utils::hours_between(&reference_time, &s.time) as f64)
                .collect();
            time_var
                .put_values(&time_values, ..)
                .map_err(|e| WriteError::IoError(format!("Failed to write time values: {}", e)))?;
        }
        {
            let mut lat_var = file
                .variable_mut("latitude")
                .ok_or_else(|| WriteError::FormatError("Latitude variable not found".to_string()))?;
            lat_var
                .put_values(&self.latitudes, ..)
                .map_err(|e| WriteError::IoError(format!("Failed to write latitude values: {}", e)))?;
        }
        {
            let mut lon_var = file
                .variable_mut("longitude")
                .ok_or_else(|| WriteError::FormatError("Longitude variable not found".to_string()))?;
            lon_var
                .put_values(&self.longitudes, ..)
                .map_err(|e| WriteError::IoError(format!("Failed to write longitude values: {}", e)))?;
        }

        println!(
            "Writing {} forecast steps on a {}x{} grid",
            nt, nj, ni
        );

        // Field data, assembled sequentially to keep the unlimited
        // dimension in ascending time order
        for (var_name, _) in &var_specs {
            let mut var = file
                .variable_mut(var_name)
                .ok_or_else(|| WriteError::FormatError(format!("Variable {} not found", var_name)))?;

            let mut data = vec![FILL_VALUE; nt * nj * ni];
            for (t, step) in self.steps.iter().enumerate() {
                let field = match (*var_name, step.components.as_ref()) {
                    ("severity", _) => Some(&step.severity),
                    ("pressure_norm", Some(c)) => Some(&c.pressure),
                    ("vorticity_norm", Some(c)) => Some(&c.vorticity),
                    ("prate_norm", Some(c)) => Some(&c.precipitation),
                    ("wind_norm", Some(c)) => Some(&c.wind),
                    _ => None,
                };
                // missing component fields stay at the fill value
                let Some(field) = field else { continue };
                for j in 0..nj {
                    for i in 0..ni {
                        data[t * nj * ni + j * ni + i] = field[[j, i]];
                    }
                }
            }

            var.put_values(&data, (.., .., ..))
                .map_err(|e| WriteError::IoError(format!("Failed to write {}: {}", var_name, e)))?;
        }

        self.file_created = true;
        println!(
            "Successfully wrote {} forecast steps to NetCDF file: {}",
            nt, self.file_path
        );
        Ok(())
    }
}

impl StepWriter for NetCDFSeverityWriter {
    fn create(&mut self, expected_steps: usize) -> Result<(), WriteError> {
        println!(
            "Creating NetCDF file: {} (expecting {} forecast steps)",
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

    fn add_global_attribute(&mut self, name: &str, value: &str) -> Result<(), WriteError> {
        self.extra_attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<(), WriteError> {
        if self.file_created {
            return Ok(());
        }
        if self.steps.is_empty() {
            return Err(WriteError::InvalidData(
                "No forecast steps to write".to_string(),
            ));
        }

        self.steps.sort_by_key(|s| s.time_index);
        self.write_file()
    }

    fn get_output_path(&self) -> &str {
        &self.file_path
    }
}

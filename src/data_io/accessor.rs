use super::{DatasetError, GriddedDataset, SpatialWindow, VariableData};
use ndarray::{s, Array2, Axis};

/// Read-only view over a dataset restricted to a spatial window.
///
/// Resolves named variables at an optional isobaric level for a given
/// time index, returning 2-D (lat, lon) slices. Window index ranges are
/// computed once at construction and support either ascending or
/// descending coordinate storage (forecast archives commonly store
/// latitude descending).
pub struct GridAccessor<'a> {
    dataset: &'a GriddedDataset,
    lat_range: (usize, usize),
    lon_range: (usize, usize),
}

impl<'a> GridAccessor<'a> {
    pub fn new(dataset: &'a GriddedDataset, window: SpatialWindow) -> Self {
        let lon_range = index_range(dataset.longitudes(), window.lon_min, window.lon_max);
        let lat_range = index_range(dataset.latitudes(), window.lat_min, window.lat_max);
        Self {
            dataset,
            lat_range,
            lon_range,
        }
    }

    /// Longitude values inside the window, in storage order
    pub fn longitudes(&self) -> Vec<f64> {
        self.dataset.longitudes()[self.lon_range.0..self.lon_range.1].to_vec()
    }

    /// Latitude values inside the window, in storage order
    pub fn latitudes(&self) -> Vec<f64> {
        self.dataset.latitudes()[self.lat_range.0..self.lat_range.1].to_vec()
    }

    /// Shape of windowed slices as (lat, lon)
    pub fn grid_shape(&self) -> (usize, usize) {
        (
            self.lat_range.1 - self.lat_range.0,
            self.lon_range.1 - self.lon_range.0,
        )
    }

    /// Resolve a variable at an optional isobaric level for one time
    /// index, restricted to the window.
    ///
    /// Surface variables must be selected without a level; isobaric
    /// variables require one. The level must match a value of the
    /// dataset's vertical coordinate.
    pub fn select(
        &self,
        variable: &str,
        level: Option<f64>,
        time_index: usize,
    ) -> Result<Array2<f64>, DatasetError> {
        self.dataset.check_time_index(time_index)?;
        let var = self.dataset.variable(variable)?;

        let slice = match (&var.data, level) {
            (VariableData::Surface(a), None) => a.index_axis(Axis(0), time_index).to_owned(),
            (VariableData::Surface(_), Some(l)) => {
                // no vertical axis to select from
                return Err(DatasetError::MissingLevel(l));
            }
            (VariableData::Isobaric(a), Some(l)) => {
                let k = self.dataset.level_index(l)?;
                a.index_axis(Axis(0), time_index)
                    .index_axis(Axis(0), k)
                    .to_owned()
            }
            (VariableData::Isobaric(_), None) => {
                return Err(DatasetError::DimensionMismatch(
                    variable.to_string(),
                    "variable has a vertical dimension; an isobaric level is required".to_string(),
                ));
            }
        };

        Ok(slice
            .slice(s![
                self.lat_range.0..self.lat_range.1,
                self.lon_range.0..self.lon_range.1
            ])
            .to_owned())
    }
}

/// Contiguous index range (start, end) of coordinate values lying inside
/// [min, max], inclusive on both bounds. Works for ascending or
/// descending monotonic coordinates; returns (0, 0) when nothing matches.
fn index_range(coords: &[f64], min: f64, max: f64) -> (usize, usize) {
    let mut start = None;
    let mut end = 0;
    for (i, &c) in coords.iter().enumerate() {
        if c >= min && c <= max {
            if start.is_none() {
                start = Some(i);
            }
            end = i + 1;
        }
    }
    (start.unwrap_or(0), end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_io::GridVariable;
    use crate::time_utils::utc_datetime;
    use ndarray::{Array3, Array4};

    fn test_dataset() -> GriddedDataset {
        // 4x4 grid with descending latitude, 2 time steps, 2 levels
        let longitudes = vec![-96.0, -90.0, -84.0, -78.0];
        let latitudes = vec![38.0, 32.0, 26.0, 20.0];
        let levels = vec![1000.0, 500.0];
        let times = vec![
            utc_datetime(2024, 8, 5, 0, 0, 0).unwrap(),
            utc_datetime(2024, 8, 5, 6, 0, 0).unwrap(),
        ];

        let mut sp = Array3::zeros((2, 4, 4));
        for t in 0..2 {
            for j in 0..4 {
                for i in 0..4 {
                    sp[[t, j, i]] = (t * 100 + j * 10 + i) as f64;
                }
            }
        }
        let mut vo = Array4::zeros((2, 2, 4, 4));
        vo.fill(1.0e-4);

        let variables = vec![
            GridVariable {
                name: "sp".to_string(),
                data: VariableData::Surface(sp),
                units: Some("Pa".to_string()),
            },
            GridVariable {
                name: "vo".to_string(),
                data: VariableData::Isobaric(vo),
                units: Some("s**-1".to_string()),
            },
        ];
        GriddedDataset::new(longitudes, latitudes, levels, times, variables).unwrap()
    }

    #[test]
    fn test_index_range_ascending() {
        let coords = [-96.0, -90.0, -84.0, -78.0];
        assert_eq!(index_range(&coords, -97.0, -79.0), (0, 3));
        assert_eq!(index_range(&coords, -91.0, -83.0), (1, 3));
        assert_eq!(index_range(&coords, 0.0, 10.0), (0, 0));
    }

    #[test]
    fn test_index_range_descending() {
        let coords = [38.0, 32.0, 26.0, 20.0];
        assert_eq!(index_range(&coords, 22.0, 37.0), (1, 3));
        assert_eq!(index_range(&coords, 20.0, 38.0), (0, 4));
    }

    #[test]
    fn test_select_surface_window() {
        let dataset = test_dataset();
        let window = SpatialWindow::new(-97.0, -79.0, 22.0, 37.0);
        let accessor = GridAccessor::new(&dataset, window);

        assert_eq!(accessor.grid_shape(), (2, 3));
        assert_eq!(accessor.latitudes(), vec![32.0, 26.0]);
        assert_eq!(accessor.longitudes(), vec![-96.0, -90.0, -84.0]);

        let field = accessor.select("sp", None, 1).unwrap();
        assert_eq!(field.dim(), (2, 3));
        // time 1, lat index 1, lon index 0 of the full grid
        assert_eq!(field[[0, 0]], 110.0);
        assert_eq!(field[[1, 2]], 122.0);
    }

    #[test]
    fn test_select_isobaric_level() {
        let dataset = test_dataset();
        let accessor = GridAccessor::new(&dataset, SpatialWindow::GULF);

        let field = accessor.select("vo", Some(500.0), 0).unwrap();
        assert_eq!(field.dim(), accessor.grid_shape());
        assert_eq!(field[[0, 0]], 1.0e-4);
    }

    #[test]
    fn test_select_missing_variable() {
        let dataset = test_dataset();
        let accessor = GridAccessor::new(&dataset, SpatialWindow::GULF);
        assert!(matches!(
            accessor.select("tp", None, 0),
            Err(DatasetError::MissingVariable(_))
        ));
    }

    #[test]
    fn test_select_missing_level() {
        let dataset = test_dataset();
        let accessor = GridAccessor::new(&dataset, SpatialWindow::GULF);
        assert!(matches!(
            accessor.select("vo", Some(850.0), 0),
            Err(DatasetError::MissingLevel(_))
        ));
        // level requested on a variable without a vertical axis
        assert!(matches!(
            accessor.select("sp", Some(500.0), 0),
            Err(DatasetError::MissingLevel(_))
        ));
    }

    #[test]
    fn test_select_level_required_for_isobaric() {
        let dataset = test_dataset();
        let accessor = GridAccessor::new(&dataset, SpatialWindow::GULF);
        assert!(matches!(
            accessor.select("vo", None, 0),
            Err(DatasetError::DimensionMismatch(_, _))
        ));
    }

    #[test]
    fn test_select_time_out_of_range() {
        let dataset = test_dataset();
        let accessor = GridAccessor::new(&dataset, SpatialWindow::GULF);
        assert!(matches!(
            accessor.select("sp", None, 5),
            Err(DatasetError::TimeIndexOutOfRange { index: 5, len: 2 })
        ));
    }
}

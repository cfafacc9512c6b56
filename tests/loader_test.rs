use ssi_rust::data_io::{load_dataset, DatasetError, VariableData};
use ssi_rust::time_utils::utc_datetime;
use std::path::Path;
use tempfile::tempdir;

/// Write a minimal ECMWF-style archive with an unsorted time axis
fn write_test_archive(path: &Path) {
    let mut file = netcdf::create(path).unwrap();

    file.add_dimension("longitude", 2).unwrap();
    file.add_dimension("latitude", 2).unwrap();
    file.add_dimension("isobaricInhPa", 2).unwrap();
    file.add_dimension("valid_time", 2).unwrap();

    {
        let mut var = file.add_variable::<f64>("longitude", &["longitude"]).unwrap();
        var.put_attribute("units", "degrees_east").unwrap();
    }
    {
        let mut var = file.add_variable::<f64>("latitude", &["latitude"]).unwrap();
        var.put_attribute("units", "degrees_north").unwrap();
    }
    {
        file.add_variable::<f64>("isobaricInhPa", &["isobaricInhPa"])
            .unwrap();
    }
    {
        let mut var = file.add_variable::<f64>("valid_time", &["valid_time"]).unwrap();
        var.put_attribute("units", "hours since 2024-08-05 00:00:00")
            .unwrap();
    }
    {
        let mut var = file
            .add_variable::<f64>("sp", &["valid_time", "latitude", "longitude"])
            .unwrap();
        var.put_attribute("units", "Pa").unwrap();
    }
    {
        let mut var = file
            .add_variable::<f64>(
                "vo",
                &["valid_time", "isobaricInhPa", "latitude", "longitude"],
            )
            .unwrap();
        var.put_attribute("units", "s**-1").unwrap();
    }

    file.variable_mut("longitude")
        .unwrap()
        .put_values(&[-90.0, -89.0], ..)
        .unwrap();
    file.variable_mut("latitude")
        .unwrap()
        .put_values(&[31.0, 30.0], ..)
        .unwrap();
    file.variable_mut("isobaricInhPa")
        .unwrap()
        .put_values(&[1000.0, 500.0], ..)
        .unwrap();
    // stored out of order on purpose
    file.variable_mut("valid_time")
        .unwrap()
        .put_values(&[6.0, 0.0], ..)
        .unwrap();

    // sp carries its own time offset so the sort is observable
    let sp: Vec<f64> = vec![
        101_600.0, 101_600.0, 101_600.0, 101_600.0, // hour 6
        101_000.0, 101_000.0, 101_000.0, 101_000.0, // hour 0
    ];
    file.variable_mut("sp")
        .unwrap()
        .put_values(&sp, (.., .., ..))
        .unwrap();

    let vo: Vec<f64> = (0..16).map(|i| i as f64 * 1.0e-5).collect();
    file.variable_mut("vo")
        .unwrap()
        .put_values(&vo, (.., .., .., ..))
        .unwrap();
}

#[test]
fn test_load_and_sort_archive() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("forecast.nc");
    write_test_archive(&path);

    let dataset = load_dataset(&path).unwrap();

    assert_eq!(dataset.longitudes(), &[-90.0, -89.0]);
    assert_eq!(dataset.latitudes(), &[31.0, 30.0]);
    assert_eq!(dataset.levels(), &[1000.0, 500.0]);

    // time axis is sorted ascending regardless of on-disk ordering
    assert_eq!(dataset.num_time_steps(), 2);
    assert_eq!(dataset.times()[0], utc_datetime(2024, 8, 5, 0, 0, 0).unwrap());
    assert_eq!(dataset.times()[1], utc_datetime(2024, 8, 5, 6, 0, 0).unwrap());

    let sp = dataset.variable("sp").unwrap();
    assert_eq!(sp.units.as_deref(), Some("Pa"));
    match &sp.data {
        VariableData::Surface(a) => {
            // hour 0 slice comes first after sorting
            assert_eq!(a[[0, 0, 0]], 101_000.0);
            assert_eq!(a[[1, 0, 0]], 101_600.0);
        }
        _ => panic!("sp should be a surface variable"),
    }

    let vo = dataset.variable("vo").unwrap();
    assert!(matches!(vo.data, VariableData::Isobaric(_)));
}

#[test]
fn test_load_missing_file() {
    let result = load_dataset("no_such_forecast.nc");
    assert!(matches!(result, Err(DatasetError::FileNotFound(_))));
}

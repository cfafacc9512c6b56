use chrono::Duration;
use ndarray::{Array3, Array4};
use ssi_rust::config::Constants;
use ssi_rust::data_io::{DatasetError, GridVariable, GriddedDataset, SpatialWindow, VariableData};
use ssi_rust::forecast::ForecastIterator;
use ssi_rust::time_utils::utc_datetime;

fn forecast_dataset(num_times: usize) -> GriddedDataset {
    let longitudes = vec![-90.0, -89.0];
    let latitudes = vec![31.0, 30.0];
    let levels = vec![1000.0, 500.0];
    let start = utc_datetime(2024, 8, 5, 0, 0, 0).unwrap();
    let times: Vec<_> = (0..num_times)
        .map(|i| start + Duration::hours(6 * i as i64))
        .collect();

    let (nt, nj, ni) = (num_times, 2, 2);

    // wind strengthens with forecast hour so severity varies per step
    let mut u = Array4::zeros((nt, 2, nj, ni));
    let v = Array4::zeros((nt, 2, nj, ni));
    for t in 0..nt {
        for j in 0..nj {
            for i in 0..ni {
                u[[t, 0, j, i]] = 10.0 * t as f64;
            }
        }
    }

    let variables = vec![
        GridVariable {
            name: "sp".to_string(),
            data: VariableData::Surface(Array3::from_elem((nt, nj, ni), 101_300.0)),
            units: Some("Pa".to_string()),
        },
        GridVariable {
            name: "tp".to_string(),
            data: VariableData::Surface(Array3::from_elem((nt, nj, ni), 0.002)),
            units: Some("m".to_string()),
        },
        GridVariable {
            name: "vo".to_string(),
            data: VariableData::Isobaric(Array4::zeros((nt, 2, nj, ni))),
            units: Some("s**-1".to_string()),
        },
        GridVariable {
            name: "u".to_string(),
            data: VariableData::Isobaric(u),
            units: Some("m s**-1".to_string()),
        },
        GridVariable {
            name: "v".to_string(),
            data: VariableData::Isobaric(v),
            units: Some("m s**-1".to_string()),
        },
    ];

    GriddedDataset::new(longitudes, latitudes, levels, times, variables).unwrap()
}

#[test]
fn test_yields_exactly_requested_steps_in_ascending_order() {
    let dataset = forecast_dataset(6);
    let constants = Constants::default();
    let iterator =
        ForecastIterator::new(&dataset, SpatialWindow::GULF, &constants, 0..6).unwrap();

    assert_eq!(iterator.len(), 6);

    let steps: Vec<_> = iterator.map(|s| s.unwrap()).collect();
    assert_eq!(steps.len(), 6);

    for window in steps.windows(2) {
        assert!(window[0].time < window[1].time);
    }
    assert_eq!(steps[0].timestamp(), "2024-08-05T00");
    assert_eq!(steps[5].timestamp(), "2024-08-06T06");
}

#[test]
fn test_severity_tracks_strengthening_wind() {
    let dataset = forecast_dataset(6);
    let constants = Constants::default();
    let steps: Vec<_> =
        ForecastIterator::new(&dataset, SpatialWindow::GULF, &constants, 0..6)
            .unwrap()
            .map(|s| s.unwrap())
            .collect();

    for window in steps.windows(2) {
        assert!(window[1].severity[[0, 0]] > window[0].severity[[0, 0]]);
    }
}

#[test]
fn test_partial_range() {
    let dataset = forecast_dataset(6);
    let constants = Constants::default();
    let steps: Vec<_> =
        ForecastIterator::new(&dataset, SpatialWindow::GULF, &constants, 2..5)
            .unwrap()
            .map(|s| s.unwrap())
            .collect();

    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].time_index, 2);
    assert_eq!(steps[2].time_index, 4);
}

#[test]
fn test_out_of_range_request_is_rejected() {
    let dataset = forecast_dataset(6);
    let constants = Constants::default();
    let result = ForecastIterator::new(&dataset, SpatialWindow::GULF, &constants, 0..10);
    assert!(matches!(
        result,
        Err(DatasetError::TimeIndexOutOfRange { len: 6, .. })
    ));
}

#[test]
fn test_over_all_steps_covers_the_dataset() {
    let dataset = forecast_dataset(4);
    let constants = Constants::default();
    let steps: Vec<_> =
        ForecastIterator::over_all_steps(&dataset, SpatialWindow::GULF, &constants)
            .map(|s| s.unwrap())
            .collect();
    assert_eq!(steps.len(), 4);
}

#[test]
fn test_components_carried_when_requested() {
    let dataset = forecast_dataset(2);
    let constants = Constants::default();

    let without: Vec<_> =
        ForecastIterator::new(&dataset, SpatialWindow::GULF, &constants, 0..2)
            .unwrap()
            .map(|s| s.unwrap())
            .collect();
    assert!(without.iter().all(|s| s.components.is_none()));

    let with: Vec<_> = ForecastIterator::new(&dataset, SpatialWindow::GULF, &constants, 0..2)
        .unwrap()
        .with_components()
        .map(|s| s.unwrap())
        .collect();
    for step in &with {
        let components = step.components.as_ref().unwrap();
        assert_eq!(components.pressure.dim(), step.severity.dim());
        assert_eq!(components.wind.dim(), step.severity.dim());
    }
}

#[test]
fn test_restart_by_reconstruction_reproduces_results() {
    let dataset = forecast_dataset(3);
    let constants = Constants::default();

    let first: Vec<_> = ForecastIterator::new(&dataset, SpatialWindow::GULF, &constants, 0..3)
        .unwrap()
        .map(|s| s.unwrap())
        .collect();
    let second: Vec<_> = ForecastIterator::new(&dataset, SpatialWindow::GULF, &constants, 0..3)
        .unwrap()
        .map(|s| s.unwrap())
        .collect();

    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.time, b.time);
        assert_eq!(a.severity, b.severity);
    }
}

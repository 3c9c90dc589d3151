use padcal_core::{correction_report, CalError, CalibrationMap, FactorRange, SensorFrame};

fn ramp(rows: usize, cols: usize) -> SensorFrame {
    let cells = (0..rows * cols).map(|i| 1.0 + (i % cols) as f64).collect();
    SensorFrame::new(rows, cols, cells).unwrap()
}

#[test]
fn correcting_the_reference_frame_flattens_it() {
    let reference = ramp(8, 8);
    let map = CalibrationMap::from_reference(&reference, None, FactorRange::default());
    assert!(!map.degenerate);

    let corrected = map.apply(&reference).unwrap();
    let target = map.target_response;
    for &v in corrected.as_slice() {
        assert!((v - target).abs() < 1e-9);
    }
}

#[test]
fn correction_report_shows_cv_improvement() {
    let reference = ramp(8, 8);
    let map = CalibrationMap::from_reference(&reference, None, FactorRange::default());
    let report = correction_report(&reference, &map).unwrap().unwrap();
    assert!(report.after.cv < report.before.cv);
    assert!(report.cv_improvement_pct > 0.0);
}

#[test]
fn factors_are_clipped_to_the_configured_range() {
    // one weak cell would need a factor of 5, well above the cap
    let mut cells = vec![10.0; 16];
    cells[5] = 2.0;
    let reference = SensorFrame::new(4, 4, cells).unwrap();
    let clip = FactorRange { min: 0.5, max: 2.0 };
    let map = CalibrationMap::from_reference(&reference, None, clip);
    assert_eq!(map.factors()[5], 2.0);
    for &f in map.factors() {
        assert!((0.5..=2.0).contains(&f));
    }
}

#[test]
fn quiet_reference_yields_flagged_neutral_map() {
    let reference = SensorFrame::zeros(4, 4);
    let map = CalibrationMap::from_reference(&reference, None, FactorRange::default());
    assert!(map.degenerate);
    assert!(map.factors().iter().all(|&f| f == 1.0));
}

#[test]
fn applying_a_map_to_the_wrong_shape_fails() {
    let map = CalibrationMap::neutral(4, 4);
    let frame = SensorFrame::zeros(2, 2);
    assert!(matches!(
        map.apply(&frame),
        Err(CalError::ShapeMismatch { .. })
    ));
}

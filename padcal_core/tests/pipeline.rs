//! End-to-end weighing scenarios composing registry, selection and
//! conversion.

use padcal_core::{
    CalibrationMap, CalibrationPosition, CalibrationRegistry, CalibrationSource, LinearModel,
    PadScale, SelectionSettings, SensorFrame, SharedRegistry, DEFAULT_INTERCEPT, DEFAULT_SLOPE,
};

fn center_position(slope: f64, intercept: f64, r_squared: f64) -> CalibrationPosition {
    CalibrationPosition {
        name: "Center".into(),
        x: 32.0,
        y: 32.0,
        calibration: LinearModel {
            slope,
            intercept,
            r_squared,
            measurement_count: 12,
            last_updated: "2026-08-01T00:00:00Z".into(),
        },
    }
}

/// A 64x64 frame with a small blob centered on (32, 32) summing to `total`.
fn blob_frame(total: f64) -> SensorFrame {
    let mut cells = vec![0.0; 64 * 64];
    // symmetric 3x3 blob keeps the centroid exactly on (32, 32)
    let weights = [
        (31usize, 31usize, 1.0),
        (31, 32, 2.0),
        (31, 33, 1.0),
        (32, 31, 2.0),
        (32, 32, 4.0),
        (32, 33, 2.0),
        (33, 31, 1.0),
        (33, 32, 2.0),
        (33, 33, 1.0),
    ];
    let weight_sum: f64 = weights.iter().map(|w| w.2).sum();
    for (r, c, w) in weights {
        cells[r * 64 + c] = total * w / weight_sum;
    }
    SensorFrame::new(64, 64, cells).unwrap()
}

#[test]
fn centered_blob_selects_center_and_converts() {
    let mut registry = CalibrationRegistry::new(SelectionSettings {
        max_distance_threshold: 50.0,
        min_r_squared_threshold: 0.95,
        ..SelectionSettings::default()
    });
    registry.insert_position("center", center_position(1730.69, 126.17, 0.99));

    let scale = PadScale::new(SharedRegistry::new(registry), None, 64, 64);
    let result = scale.measure(&blob_frame(0.01)).unwrap();

    assert!(!result.calibration.is_fallback);
    assert_eq!(result.calibration.position_id.as_deref(), Some("center"));
    assert!(result.calibration.distance < 1e-9);
    let center = result.calibration.pressure_center.unwrap();
    assert!((center.0 - 32.0).abs() < 1e-9);
    assert!((center.1 - 32.0).abs() < 1e-9);
    // 1730.69 * 0.01 + 126.17
    assert!((result.grams - 143.4769).abs() < 1e-3);
}

#[test]
fn registry_update_is_visible_on_next_measurement() {
    let mut registry = CalibrationRegistry::default();
    registry.insert_position("center", center_position(1000.0, 0.0, 0.99));
    let shared = SharedRegistry::new(registry);
    let scale = PadScale::new(shared.clone(), None, 64, 64);

    let before = scale.measure(&blob_frame(0.01)).unwrap();
    assert!((before.grams - 10.0).abs() < 1e-9);

    shared.update_position("center", 2000.0, 0.0, 0.99, 13).unwrap();
    let after = scale.measure(&blob_frame(0.01)).unwrap();
    assert!((after.grams - 20.0).abs() < 1e-9);
}

#[test]
fn map_only_source_corrects_then_uses_defaults() {
    // map halves every cell, so total pressure is halved before conversion
    let map = CalibrationMap::from_factors(64, 64, vec![0.5; 64 * 64]).unwrap();
    let scale = PadScale::from_source(CalibrationSource::MapOnly(map), 64, 64);
    let result = scale.measure(&blob_frame(0.02)).unwrap();

    assert!(result.calibration.is_fallback);
    assert_eq!(result.calibration.slope, DEFAULT_SLOPE);
    let expected = DEFAULT_SLOPE * 0.01 + DEFAULT_INTERCEPT;
    assert!((result.grams - expected).abs() < 1e-6);
}

#[test]
fn tare_consistency_across_positions() {
    // tared conversion depends only on the net pressure and slope
    let mut registry = CalibrationRegistry::default();
    registry.insert_position("center", center_position(1730.69, 126.17, 0.99));
    let mut scale = PadScale::new(SharedRegistry::new(registry), None, 64, 64);

    scale.tare(&blob_frame(0.004)).unwrap();
    let r = scale.measure(&blob_frame(0.014)).unwrap();
    assert!((r.net_pressure - 0.01).abs() < 1e-12);
    assert!((r.grams - 1730.69 * 0.01).abs() < 1e-6);
}

#[test]
fn fallback_weight_is_still_produced_for_off_grid_blob() {
    let mut registry = CalibrationRegistry::new(SelectionSettings {
        max_distance_threshold: 5.0,
        ..SelectionSettings::default()
    });
    registry.insert_position("center", center_position(1730.69, 126.17, 0.99));
    let scale = PadScale::new(SharedRegistry::new(registry), None, 64, 64);

    // blob at (32,32) is beyond a 5-unit threshold from nothing else,
    // but the registry's only position IS at (32,32); move the blob instead
    let mut cells = vec![0.0; 64 * 64];
    cells[2 * 64 + 2] = 0.01;
    let f = SensorFrame::new(64, 64, cells).unwrap();
    let r = scale.measure(&f).unwrap();
    assert!(r.calibration.is_fallback);
    assert!(r.grams >= 0.0);
}

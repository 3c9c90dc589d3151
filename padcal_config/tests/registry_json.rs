use padcal_config::{load_registry, load_registry_str, save_registry, FormatError};

const SAMPLE: &str = r#"{
  "metadata": { "version": "1.0", "device": "pad-64" },
  "positions": {
    "center": {
      "name": "Center",
      "x": 32.0, "y": 32.0,
      "calibration": {
        "slope": 1730.6905, "intercept": 126.1741,
        "r_squared": 0.99, "measurement_count": 12,
        "last_updated": "2026-05-01T09:30:00"
      }
    },
    "corner_nw": {
      "name": "North-west corner",
      "x": 8.0, "y": 8.0,
      "calibration": { "slope": 1650.0, "intercept": 110.0, "r_squared": 0.97 }
    }
  },
  "settings": {
    "distance_calculation_method": "euclidean",
    "max_distance_threshold": 50.0,
    "min_r_squared_threshold": 0.95,
    "fallback_position": "center"
  }
}"#;

#[test]
fn loads_a_full_registry_document() {
    let file = load_registry_str(SAMPLE).expect("valid registry");
    assert_eq!(file.positions.len(), 2);
    let center = &file.positions["center"];
    assert_eq!(center.name, "Center");
    assert!((center.calibration.slope - 1730.6905).abs() < 1e-9);
    assert_eq!(center.calibration.measurement_count, 12);
    // optional calibration fields default
    assert_eq!(file.positions["corner_nw"].calibration.measurement_count, 0);
    assert_eq!(file.settings.fallback_position.as_deref(), Some("center"));
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let file = load_registry_str("{}").expect("empty document is valid");
    assert!(file.positions.is_empty());
    assert!((file.settings.max_distance_threshold - 50.0).abs() < 1e-12);
    assert!((file.settings.min_r_squared_threshold - 0.95).abs() < 1e-12);
    assert!(file.settings.fallback_position.is_none());
}

#[test]
fn malformed_json_is_a_typed_error() {
    let err = load_registry_str("{ not json").expect_err("must fail");
    let fmt = err.downcast_ref::<FormatError>().expect("typed");
    assert!(matches!(fmt, FormatError::MalformedRegistry(_)));
}

#[test]
fn out_of_range_r_squared_is_rejected() {
    let doc = r#"{
      "positions": {
        "p": { "name": "P", "x": 1.0, "y": 1.0,
               "calibration": { "slope": 1.0, "intercept": 0.0, "r_squared": 1.5 } }
      }
    }"#;
    let err = load_registry_str(doc).expect_err("must fail");
    let fmt = err.downcast_ref::<FormatError>().expect("typed");
    assert!(matches!(fmt, FormatError::InvalidValue(_)));
}

#[test]
fn non_finite_slope_is_rejected() {
    // JSON has no NaN literal, so a huge exponent overflowing to inf
    let doc = r#"{
      "positions": {
        "p": { "name": "P", "x": 1.0, "y": 1.0,
               "calibration": { "slope": 1e999, "intercept": 0.0, "r_squared": 0.9 } }
      }
    }"#;
    assert!(load_registry_str(doc).is_err());
}

#[test]
fn round_trip_preserves_metadata_and_positions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("registry.json");

    let original = load_registry_str(SAMPLE).expect("valid registry");
    save_registry(&path, &original).expect("save");
    let reloaded = load_registry(&path).expect("reload");

    assert_eq!(reloaded.metadata["device"], "pad-64");
    assert_eq!(reloaded.positions.len(), 2);
    assert!(
        (reloaded.positions["center"].calibration.intercept - 126.1741).abs() < 1e-9
    );
}

use padcal_config::load_toml;
use rstest::rstest;

const BASE: &str = r#"
[grid]
rows = 64
cols = 64
"#;

#[test]
fn minimal_config_parses_with_defaults() {
    let cfg = load_toml(BASE).expect("parse TOML");
    cfg.validate().expect("valid");
    assert_eq!(cfg.grid.rows, 64);
    assert!((cfg.grid.active_threshold_ratio - 0.1).abs() < 1e-12);
    assert!((cfg.map.min_factor - 0.1).abs() < 1e-12);
    assert!((cfg.map.max_factor - 10.0).abs() < 1e-12);
    assert!((cfg.selection.max_distance_threshold - 50.0).abs() < 1e-12);
    assert!((cfg.selection.min_r_squared_threshold - 0.95).abs() < 1e-12);
}

#[rstest]
#[case::zero_rows(
    "[grid]\nrows = 0\ncols = 64\n",
    "grid.rows and grid.cols must be >= 1"
)]
#[case::threshold_ratio_of_one(
    "[grid]\nrows = 8\ncols = 8\nactive_threshold_ratio = 1.0\n",
    "active_threshold_ratio"
)]
#[case::inverted_factor_range(
    "[grid]\nrows = 8\ncols = 8\n\n[map]\nmin_factor = 5.0\nmax_factor = 2.0\n",
    "map.max_factor"
)]
#[case::r_squared_above_one(
    "[grid]\nrows = 8\ncols = 8\n\n[selection]\nmin_r_squared_threshold = 1.5\n",
    "min_r_squared_threshold"
)]
#[case::unknown_rotation(
    "[grid]\nrows = 8\ncols = 8\n\n[logging]\nrotation = \"weekly\"\n",
    "rotation"
)]
fn invalid_configs_are_rejected_with_field_context(#[case] text: &str, #[case] needle: &str) {
    let cfg = load_toml(text).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").contains(needle),
        "error {err} missing {needle:?}"
    );
}

#[test]
fn selection_method_parses_from_lowercase_names() {
    let toml = r#"
[grid]
rows = 8
cols = 8

[selection]
distance_method = "manhattan"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    assert_eq!(
        cfg.selection.distance_method,
        padcal_config::DistanceMethod::Manhattan
    );
}

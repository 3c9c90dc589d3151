use padcal_config::frame_file::load_frame;
use padcal_config::map_file::{load_map, save_map_csv, save_map_json};
use padcal_config::FormatError;

#[test]
fn csv_round_trip_preserves_shape_and_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("map.csv");
    let cells = vec![1.0, 0.5, 2.0, 1.25, 0.8, 1.0];
    save_map_csv(&path, 2, 3, &cells).expect("save");

    let (rows, cols, loaded) = load_map(&path).expect("load");
    assert_eq!((rows, cols), (2, 3));
    assert_eq!(loaded, cells);
}

#[test]
fn json_round_trip_preserves_shape_and_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("map.json");
    let cells = vec![1.0, 0.5, 2.0, 1.25];
    save_map_json(&path, 2, 2, &cells).expect("save");

    let (rows, cols, loaded) = load_map(&path).expect("load");
    assert_eq!((rows, cols), (2, 2));
    assert_eq!(loaded, cells);
}

#[test]
fn ragged_csv_is_rejected_with_row_context() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ragged.csv");
    std::fs::write(&path, "1.0,2.0,3.0\n1.0,2.0\n").expect("write");

    let err = load_map(&path).expect_err("must fail");
    let fmt = err.downcast_ref::<FormatError>().expect("typed");
    assert!(matches!(
        fmt,
        FormatError::RaggedMap {
            row: 1,
            got: 2,
            expected: 3
        }
    ));
}

#[test]
fn ragged_frame_csv_is_rejected_with_row_context() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ragged.csv");
    std::fs::write(&path, "0.0,2.0,3.0\n1.0,2.0\n").expect("write");

    let err = load_frame(&path).expect_err("must fail");
    let fmt = err.downcast_ref::<FormatError>().expect("typed");
    assert!(matches!(
        fmt,
        FormatError::RaggedMap {
            row: 1,
            got: 2,
            expected: 3
        }
    ));
}

#[test]
fn zero_and_negative_factors_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "1.0,0.0\n1.0,1.0\n").expect("write");

    let err = load_map(&path).expect_err("must fail");
    let fmt = err.downcast_ref::<FormatError>().expect("typed");
    assert!(matches!(fmt, FormatError::BadMapCell { row: 0, col: 1 }));
}

#[test]
fn unknown_extension_is_rejected_up_front() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("map.yaml");
    std::fs::write(&path, "1.0").expect("write");

    let err = load_map(&path).expect_err("must fail");
    let fmt = err.downcast_ref::<FormatError>().expect("typed");
    assert!(matches!(fmt, FormatError::UnsupportedMapFormat(_)));
}

#[test]
fn ragged_json_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ragged.json");
    std::fs::write(&path, "[[1.0,2.0],[1.0]]").expect("write");
    assert!(load_map(&path).is_err());
}

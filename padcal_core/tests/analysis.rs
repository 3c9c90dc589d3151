use padcal_core::{analyze, AnalysisOptions, SensorFrame};
use rstest::rstest;

fn frame(rows: usize, cols: usize, cells: Vec<f64>) -> SensorFrame {
    SensorFrame::new(rows, cols, cells).unwrap()
}

#[test]
fn uniform_grid_is_perfectly_consistent() {
    let f = frame(8, 8, vec![4.0; 64]);
    let a = analyze(&f, &AnalysisOptions::default());
    let basic = a.basic.unwrap();
    assert_eq!(basic.std, 0.0);
    assert_eq!(basic.cv, 0.0);
    assert_eq!(basic.active_cells, 64);
    assert_eq!(a.uniformity.unwrap().uniformity_index, 1.0);
    // zero mean neighbor deviation on a flat surface
    assert_eq!(a.spatial.neighbor_consistency, 0.0);
    assert_eq!(a.spatial.high_variation_points, 0);
    // every cell responds, so no dead zones
    assert_eq!(a.dead_zones.dead_zone_ratio, 0.0);
    assert_eq!(a.dead_zones.region_count, 0);
    // flat surface has zero gradient everywhere
    assert_eq!(a.gradient.unwrap().avg_gradient, 0.0);
}

#[test]
fn all_zero_grid_is_one_big_dead_zone() {
    let f = SensorFrame::zeros(6, 6);
    let a = analyze(&f, &AnalysisOptions::default());
    assert_eq!(a.dead_zones.dead_zone_ratio, 1.0);
    assert_eq!(a.dead_zones.region_count, 1);
    assert_eq!(a.dead_zones.largest_region, 36);
    // metric blocks that need at least one active cell are absent
    assert!(a.basic.is_none());
    assert!(a.uniformity.is_none());
    assert!(a.gradient.is_none());
    assert!(a.clusters.is_none());
}

#[test]
fn diagonal_neighbors_do_not_merge_dead_regions() {
    // two dead cells touching only at a corner are separate regions
    let mut cells = vec![10.0; 16];
    cells[0] = 0.0; // (0,0)
    cells[5] = 0.0; // (1,1)
    let f = frame(4, 4, cells);
    let a = analyze(&f, &AnalysisOptions::default());
    assert_eq!(a.dead_zones.region_count, 2);
    assert_eq!(a.dead_zones.largest_region, 1);
    assert!((a.dead_zones.avg_region_size - 1.0).abs() < 1e-12);
}

#[test]
fn single_hot_cell_is_an_outlier() {
    let mut cells = vec![1.0; 100];
    cells[55] = 50.0;
    let f = frame(10, 10, cells);
    let a = analyze(&f, &AnalysisOptions::default());
    let uniformity = a.uniformity.unwrap();
    assert!(uniformity.outlier_ratio > 0.0);
    assert!(uniformity.response_range > 40.0);
    // deviation grows with local disagreement
    assert!(a.spatial.neighbor_consistency > 0.0);
    assert!(a.spatial.high_variation_points > 0);
}

#[test]
fn response_ratio_is_max_over_min() {
    let f = frame(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
    let a = analyze(&f, &AnalysisOptions::default());
    assert!((a.uniformity.unwrap().response_ratio - 4.0).abs() < 1e-12);
}

#[rstest]
#[case(0.5, 1.0)]
#[case(2.0, 4.0)]
fn sensitivity_scales_against_reference(#[case] reference: f64, #[case] value: f64) {
    let f = frame(4, 4, vec![value; 16]);
    let opts = AnalysisOptions {
        sensitivity_reference: Some(reference),
        ..AnalysisOptions::default()
    };
    let a = analyze(&f, &opts);
    let s = a.sensitivity.unwrap();
    assert!((s.mean_sensitivity - value / reference).abs() < 1e-12);
    assert_eq!(s.sensitivity_std, 0.0);
}

#[test]
fn gradient_of_linear_ramp_is_constant() {
    // value = 2 * column, so the x-gradient is 2 at every active cell
    let cells: Vec<f64> = (0..25).map(|i| 2.0 * ((i % 5) as f64)).collect();
    let f = frame(5, 5, cells);
    let a = analyze(&f, &AnalysisOptions::default());
    let g = a.gradient.unwrap();
    assert!((g.avg_gradient - 2.0).abs() < 1e-9);
    assert!(g.max_gradient <= 2.0 + 1e-9);
}

#[test]
fn small_grids_report_without_panicking() {
    for (r, c) in [(1, 1), (1, 4), (3, 1)] {
        let f = frame(r, c, vec![1.5; r * c]);
        let a = analyze(&f, &AnalysisOptions::default());
        assert_eq!(a.basic.unwrap().mean, 1.5);
        assert!(a.clusters.is_none());
    }
}

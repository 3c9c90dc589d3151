//! Diagnostic metrics over a single frame.
//!
//! Everything here is a pure function of its inputs; the aggregate
//! `GridAnalysis` is recomputed on demand and never persisted. Cells at
//! or below the noise threshold are excluded from means, percentiles and
//! ratios but still count toward totals.

use crate::cluster::{self, ClusterAnalysis};
use crate::frame::{ACTIVE_THRESHOLD_RATIO, SensorFrame};

/// Knobs for a single analysis pass.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Explicit active-cell threshold; when `None`, `mean × ratio` is used.
    pub active_threshold: Option<f64>,
    /// Ratio of the frame mean used when no explicit threshold is given.
    pub active_threshold_ratio: f64,
    /// Reference value for sensitivity mapping; defaults to the median of
    /// active cells.
    pub sensitivity_reference: Option<f64>,
    /// Run the (comparatively expensive) cluster analysis.
    pub with_clusters: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            active_threshold: None,
            active_threshold_ratio: ACTIVE_THRESHOLD_RATIO,
            sensitivity_reference: None,
            with_clusters: true,
        }
    }
}

/// Basic distribution statistics over active cells.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicStats {
    pub mean: f64,
    pub std: f64,
    /// `std / mean`; 0 when the mean is not positive.
    pub cv: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub q25: f64,
    pub q75: f64,
    pub active_cells: usize,
    pub total_cells: usize,
    pub active_ratio: f64,
}

/// Neighborhood agreement of interior cells.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialConsistency {
    /// Mean of `|center − neighbor_mean| / max(center, neighbor_mean)`
    /// over interior cells; 0.0 on a perfectly flat surface, growing with
    /// local disagreement.
    pub neighbor_consistency: f64,
    pub smoothness_std: f64,
    /// Cells whose deviation exceeds 0.3.
    pub high_variation_points: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformityMetrics {
    /// `1 − cv` over active cells.
    pub uniformity_index: f64,
    pub response_range: f64,
    pub relative_range: f64,
    /// Fraction of active cells with |z| > 2.5.
    pub outlier_ratio: f64,
    /// `max / min`; infinite when min is not positive.
    pub response_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeadZoneAnalysis {
    pub dead_zone_ratio: f64,
    pub region_count: usize,
    pub avg_region_size: f64,
    pub largest_region: usize,
    /// Row-major dead-cell mask, same shape as the analyzed frame.
    pub dead_mask: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityMapping {
    pub reference: f64,
    pub mean_sensitivity: f64,
    pub sensitivity_std: f64,
    /// Fraction of active cells with sensitivity < 0.5.
    pub low_sensitivity_ratio: f64,
    /// Fraction of active cells with sensitivity > 1.5.
    pub high_sensitivity_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientAnalysis {
    pub avg_gradient: f64,
    pub max_gradient: f64,
    pub gradient_std: f64,
    /// Fraction of active cells with magnitude above `mean + 2·std`.
    pub high_gradient_ratio: f64,
}

/// Aggregate of all metric blocks for one frame. Blocks that need at
/// least one active cell are `None` on a fully quiet frame.
#[derive(Debug, Clone)]
pub struct GridAnalysis {
    pub active_threshold: f64,
    pub basic: Option<BasicStats>,
    pub spatial: SpatialConsistency,
    pub uniformity: Option<UniformityMetrics>,
    pub dead_zones: DeadZoneAnalysis,
    pub sensitivity: Option<SensitivityMapping>,
    pub gradient: Option<GradientAnalysis>,
    pub clusters: Option<ClusterAnalysis>,
}

/// Run every metric block over one frame.
pub fn analyze(frame: &SensorFrame, opts: &AnalysisOptions) -> GridAnalysis {
    let threshold = opts
        .active_threshold
        .unwrap_or_else(|| frame.active_threshold(opts.active_threshold_ratio));

    GridAnalysis {
        active_threshold: threshold,
        basic: basic_stats(frame, threshold),
        spatial: spatial_consistency(frame),
        uniformity: uniformity_metrics(frame, threshold),
        dead_zones: dead_zone_analysis(frame, threshold),
        sensitivity: sensitivity_mapping(frame, threshold, opts.sensitivity_reference),
        gradient: gradient_analysis(frame, threshold),
        clusters: if opts.with_clusters {
            cluster::cluster_analysis(frame, threshold)
        } else {
            None
        },
    }
}

fn active_values(frame: &SensorFrame, threshold: f64) -> Vec<f64> {
    frame
        .as_slice()
        .iter()
        .copied()
        .filter(|&v| v > threshold)
        .collect()
}

fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation.
fn std_of(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Linear-interpolation percentile over a sorted slice, `p` in [0, 100].
fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = p / 100.0 * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            if lo == hi {
                sorted[lo]
            } else {
                let frac = rank - lo as f64;
                sorted[lo] + (sorted[hi] - sorted[lo]) * frac
            }
        }
    }
}

/// Distribution statistics over active cells, `None` when nothing is
/// above the threshold.
pub fn basic_stats(frame: &SensorFrame, threshold: f64) -> Option<BasicStats> {
    let mut values = active_values(frame, threshold);
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mean = mean_of(&values);
    let std = std_of(&values, mean);
    Some(BasicStats {
        mean,
        std,
        cv: if mean > 0.0 { std / mean } else { 0.0 },
        min: values[0],
        max: values[values.len() - 1],
        median: percentile(&values, 50.0),
        q25: percentile(&values, 25.0),
        q75: percentile(&values, 75.0),
        active_cells: values.len(),
        total_cells: frame.len(),
        active_ratio: values.len() as f64 / frame.len() as f64,
    })
}

/// Compare each positive interior cell against the mean of its positive
/// 8-neighbors (neighbors equal to the center are excluded so a flat
/// patch reports zero deviation).
pub fn spatial_consistency(frame: &SensorFrame) -> SpatialConsistency {
    let (rows, cols) = frame.shape();
    let mut deviations = Vec::new();

    for row in 1..rows.saturating_sub(1) {
        for col in 1..cols.saturating_sub(1) {
            let center = frame.get(row, col);
            if !(center > 0.0) {
                continue;
            }
            let mut sum = 0.0;
            let mut n = 0usize;
            for dr in -1i64..=1 {
                for dc in -1i64..=1 {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    let v = frame.get((row as i64 + dr) as usize, (col as i64 + dc) as usize);
                    if v > 0.0 && v != center {
                        sum += v;
                        n += 1;
                    }
                }
            }
            if n > 0 {
                let neighbor_mean = sum / n as f64;
                let denom = center.max(neighbor_mean);
                deviations.push((center - neighbor_mean).abs() / denom);
            }
        }
    }

    let mean = mean_of(&deviations);
    SpatialConsistency {
        neighbor_consistency: mean,
        smoothness_std: std_of(&deviations, mean),
        high_variation_points: deviations.iter().filter(|&&d| d > 0.3).count(),
    }
}

pub fn uniformity_metrics(frame: &SensorFrame, threshold: f64) -> Option<UniformityMetrics> {
    let values = active_values(frame, threshold);
    if values.is_empty() {
        return None;
    }
    let mean = mean_of(&values);
    let std = std_of(&values, mean);
    let cv = if mean > 0.0 { std / mean } else { 0.0 };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    let outliers = if std > 0.0 {
        values
            .iter()
            .filter(|&&v| ((v - mean) / std).abs() > 2.5)
            .count()
    } else {
        0
    };

    Some(UniformityMetrics {
        uniformity_index: 1.0 - cv,
        response_range: range,
        relative_range: if mean > 0.0 { range / mean } else { 0.0 },
        outlier_ratio: outliers as f64 / values.len() as f64,
        response_ratio: if min > 0.0 { max / min } else { f64::INFINITY },
    })
}

/// Dead cells sit below 10% of the active-cell mean; they are grouped
/// into 4-connected regions by BFS labeling.
pub fn dead_zone_analysis(frame: &SensorFrame, active_threshold: f64) -> DeadZoneAnalysis {
    let (rows, cols) = frame.shape();
    let active = active_values(frame, active_threshold);
    let dead_threshold = mean_of(&active) * ACTIVE_THRESHOLD_RATIO;

    // With no active cells there is no meaningful noise floor; anything
    // non-positive is dead (so an all-zero frame is one full dead region).
    let is_dead = |v: f64| {
        if dead_threshold > 0.0 {
            v < dead_threshold
        } else {
            v <= 0.0
        }
    };

    let dead_mask: Vec<bool> = frame.as_slice().iter().map(|&v| is_dead(v)).collect();
    let dead_count = dead_mask.iter().filter(|&&d| d).count();

    let mut visited = vec![false; dead_mask.len()];
    let mut region_sizes = Vec::new();
    let mut queue = std::collections::VecDeque::new();

    for start in 0..dead_mask.len() {
        if !dead_mask[start] || visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);
        let mut size = 0usize;
        while let Some(idx) = queue.pop_front() {
            size += 1;
            let row = idx / cols;
            let col = idx % cols;
            for (dr, dc) in [(0i64, 1i64), (0, -1), (1, 0), (-1, 0)] {
                let nr = row as i64 + dr;
                let nc = col as i64 + dc;
                if nr < 0 || nc < 0 || nr >= rows as i64 || nc >= cols as i64 {
                    continue;
                }
                let nidx = nr as usize * cols + nc as usize;
                if dead_mask[nidx] && !visited[nidx] {
                    visited[nidx] = true;
                    queue.push_back(nidx);
                }
            }
        }
        region_sizes.push(size);
    }

    DeadZoneAnalysis {
        dead_zone_ratio: dead_count as f64 / frame.len() as f64,
        region_count: region_sizes.len(),
        avg_region_size: mean_of(&region_sizes.iter().map(|&s| s as f64).collect::<Vec<_>>()),
        largest_region: region_sizes.iter().copied().max().unwrap_or(0),
        dead_mask,
    }
}

/// Per-cell sensitivity relative to a reference value (default: median of
/// active cells). `None` when no reference can be established.
pub fn sensitivity_mapping(
    frame: &SensorFrame,
    threshold: f64,
    reference: Option<f64>,
) -> Option<SensitivityMapping> {
    let mut values = active_values(frame, threshold);
    if values.is_empty() {
        return None;
    }
    let reference = reference.unwrap_or_else(|| {
        values.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        percentile(&values, 50.0)
    });
    if !(reference > 0.0) {
        return None;
    }

    let sens: Vec<f64> = values.iter().map(|v| v / reference).collect();
    let mean = mean_of(&sens);
    let n = sens.len() as f64;
    Some(SensitivityMapping {
        reference,
        mean_sensitivity: mean,
        sensitivity_std: std_of(&sens, mean),
        low_sensitivity_ratio: sens.iter().filter(|&&s| s < 0.5).count() as f64 / n,
        high_sensitivity_ratio: sens.iter().filter(|&&s| s > 1.5).count() as f64 / n,
    })
}

/// Discrete gradient magnitude over active cells: central differences in
/// the interior, one-sided at the edges.
pub fn gradient_analysis(frame: &SensorFrame, threshold: f64) -> Option<GradientAnalysis> {
    let (rows, cols) = frame.shape();
    let mut magnitudes = Vec::new();

    let diff = |lo: f64, hi: f64, span: f64| (hi - lo) / span;
    for row in 0..rows {
        for col in 0..cols {
            let v = frame.get(row, col);
            if !(v > threshold) {
                continue;
            }
            let gy = if rows == 1 {
                0.0
            } else if row == 0 {
                diff(v, frame.get(row + 1, col), 1.0)
            } else if row == rows - 1 {
                diff(frame.get(row - 1, col), v, 1.0)
            } else {
                diff(frame.get(row - 1, col), frame.get(row + 1, col), 2.0)
            };
            let gx = if cols == 1 {
                0.0
            } else if col == 0 {
                diff(v, frame.get(row, col + 1), 1.0)
            } else if col == cols - 1 {
                diff(frame.get(row, col - 1), v, 1.0)
            } else {
                diff(frame.get(row, col - 1), frame.get(row, col + 1), 2.0)
            };
            magnitudes.push((gx * gx + gy * gy).sqrt());
        }
    }

    if magnitudes.is_empty() {
        return None;
    }
    let mean = mean_of(&magnitudes);
    let std = std_of(&magnitudes, mean);
    let cut = mean + 2.0 * std;
    Some(GradientAnalysis {
        avg_gradient: mean,
        max_gradient: magnitudes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        gradient_std: std,
        high_gradient_ratio: magnitudes.iter().filter(|&&g| g > cut).count() as f64
            / magnitudes.len() as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&v, 50.0), 2.5);
        assert_eq!(percentile(&v, 0.0), 1.0);
        assert_eq!(percentile(&v, 100.0), 4.0);
        assert_eq!(percentile(&v, 25.0), 1.75);
    }

    #[test]
    fn cv_defined_zero_for_nonpositive_mean() {
        // All cells equal: std 0, cv 0.
        let f = SensorFrame::new(2, 2, vec![3.0; 4]).unwrap();
        let stats = basic_stats(&f, 0.0).unwrap();
        assert_eq!(stats.cv, 0.0);
        assert_eq!(stats.std, 0.0);
    }
}

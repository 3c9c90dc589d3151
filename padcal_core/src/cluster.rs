//! Cluster analysis of active cells.
//!
//! Groups active cells by standardized `(row, col, value)` features with
//! a small deterministic k-means, then scores the partition with the mean
//! silhouette coefficient. Too few active cells means "not available",
//! not an error.

use crate::frame::SensorFrame;

/// Minimum active cells before clustering is attempted.
const MIN_ACTIVE_CELLS: usize = 10;
const MAX_CLUSTERS: usize = 5;
const MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterStats {
    pub size: usize,
    pub mean_response: f64,
    pub std_response: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAnalysis {
    pub cluster_count: usize,
    pub clusters: Vec<ClusterStats>,
    /// Mean silhouette coefficient in [-1, 1]; higher is better separated.
    pub silhouette: f64,
}

/// Cluster the active cells of `frame`. Returns `None` below the minimum
/// data threshold.
pub fn cluster_analysis(frame: &SensorFrame, threshold: f64) -> Option<ClusterAnalysis> {
    let (rows, cols) = frame.shape();
    let mut points = Vec::new(); // (row, col, value)
    for row in 0..rows {
        for col in 0..cols {
            let v = frame.get(row, col);
            if v > threshold {
                points.push([row as f64, col as f64, v]);
            }
        }
    }
    if points.len() < MIN_ACTIVE_CELLS {
        return None;
    }

    let k = (points.len() / MIN_ACTIVE_CELLS).clamp(2, MAX_CLUSTERS);
    let features = standardize(&points);
    let labels = kmeans(&features, k);

    let mut clusters = Vec::with_capacity(k);
    for cluster in 0..k {
        let values: Vec<f64> = points
            .iter()
            .zip(&labels)
            .filter(|&(_, &l)| l == cluster)
            .map(|(p, _)| p[2])
            .collect();
        let mean = mean_of(&values);
        clusters.push(ClusterStats {
            size: values.len(),
            mean_response: mean,
            std_response: std_of(&values, mean),
        });
    }

    Some(ClusterAnalysis {
        cluster_count: k,
        clusters,
        silhouette: silhouette_score(&features, &labels, k),
    })
}

fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn std_of(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Z-score each feature column; a zero-variance column stays centered.
fn standardize(points: &[[f64; 3]]) -> Vec<[f64; 3]> {
    let n = points.len() as f64;
    let mut means = [0.0; 3];
    for p in points {
        for d in 0..3 {
            means[d] += p[d];
        }
    }
    for m in &mut means {
        *m /= n;
    }
    let mut stds = [0.0; 3];
    for p in points {
        for d in 0..3 {
            stds[d] += (p[d] - means[d]).powi(2);
        }
    }
    for s in &mut stds {
        *s = (*s / n).sqrt();
        if *s == 0.0 {
            *s = 1.0;
        }
    }
    points
        .iter()
        .map(|p| {
            let mut q = [0.0; 3];
            for d in 0..3 {
                q[d] = (p[d] - means[d]) / stds[d];
            }
            q
        })
        .collect()
}

fn dist_sq(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let mut s = 0.0;
    for d in 0..3 {
        s += (a[d] - b[d]).powi(2);
    }
    s
}

/// Lloyd's algorithm with deterministic seeding: initial centers are
/// points evenly spaced along the value-sorted order, so repeated runs on
/// the same frame give the same partition.
fn kmeans(features: &[[f64; 3]], k: usize) -> Vec<usize> {
    let n = features.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        features[a][2]
            .partial_cmp(&features[b][2])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut centers: Vec<[f64; 3]> = (0..k)
        .map(|i| features[order[i * (n - 1) / (k - 1).max(1)]])
        .collect();

    let mut labels = vec![0usize; n];
    for _ in 0..MAX_ITERATIONS {
        // Assignment
        let mut changed = false;
        for (i, p) in features.iter().enumerate() {
            let mut best = 0usize;
            let mut best_d = f64::INFINITY;
            for (c, center) in centers.iter().enumerate() {
                let d = dist_sq(p, center);
                if d < best_d {
                    best_d = d;
                    best = c;
                }
            }
            if labels[i] != best {
                labels[i] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        // Update
        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (p, &l) in features.iter().zip(&labels) {
            for d in 0..3 {
                sums[l][d] += p[d];
            }
            counts[l] += 1;
        }
        for c in 0..k {
            if counts[c] == 0 {
                // Reseed an emptied cluster at the point farthest from
                // its current center.
                let far = (0..n)
                    .max_by(|&a, &b| {
                        dist_sq(&features[a], &centers[labels[a]])
                            .partial_cmp(&dist_sq(&features[b], &centers[labels[b]]))
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .unwrap_or(0);
                centers[c] = features[far];
            } else {
                for d in 0..3 {
                    centers[c][d] = sums[c][d] / counts[c] as f64;
                }
            }
        }
    }
    labels
}

/// Mean silhouette coefficient. Points in singleton clusters score 0.
fn silhouette_score(features: &[[f64; 3]], labels: &[usize], k: usize) -> f64 {
    let n = features.len();
    if k < 2 {
        return 0.0;
    }
    let mut sizes = vec![0usize; k];
    for &l in labels {
        sizes[l] += 1;
    }

    let mut total = 0.0;
    for i in 0..n {
        let own = labels[i];
        if sizes[own] <= 1 {
            continue; // silhouette defined as 0 for singletons
        }
        let mut dist_sums = vec![0.0f64; k];
        for j in 0..n {
            if i == j {
                continue;
            }
            dist_sums[labels[j]] += dist_sq(&features[i], &features[j]).sqrt();
        }
        let a = dist_sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| dist_sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);
        if b.is_finite() {
            total += (b - a) / a.max(b);
        }
    }
    total / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_active_cells_is_not_available() {
        let mut cells = vec![0.0; 64];
        for c in cells.iter_mut().take(5) {
            *c = 1.0;
        }
        let f = SensorFrame::new(8, 8, cells).unwrap();
        assert!(cluster_analysis(&f, 0.5).is_none());
    }

    #[test]
    fn k_scales_with_active_count() {
        // 30 active cells -> k = 3
        let mut cells = vec![0.0; 100];
        for (i, c) in cells.iter_mut().enumerate().take(30) {
            *c = 1.0 + (i % 7) as f64;
        }
        let f = SensorFrame::new(10, 10, cells).unwrap();
        let analysis = cluster_analysis(&f, 0.5).unwrap();
        assert_eq!(analysis.cluster_count, 3);
        assert_eq!(analysis.clusters.iter().map(|c| c.size).sum::<usize>(), 30);
    }
}

//! Per-cell correction maps.
//!
//! A `CalibrationMap` is derived once from a reference frame captured
//! under a (nominally) uniform load and applied by elementwise multiply.
//! It is a linear, per-cell correction, not a physical model: applied to
//! its own source frame it drives the active-cell CV toward zero, applied
//! to other frames it only approximately cancels the same systematic
//! non-uniformity.

use crate::error::CalError;
use crate::frame::{ACTIVE_THRESHOLD_RATIO, SensorFrame};
use crate::stats::{self, BasicStats};

/// Clip range for correction factors, bounding how hard a weak or hot
/// cell may be corrected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorRange {
    pub min: f64,
    pub max: f64,
}

impl Default for FactorRange {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 10.0,
        }
    }
}

impl From<padcal_config::MapCfg> for FactorRange {
    fn from(cfg: padcal_config::MapCfg) -> Self {
        Self {
            min: cfg.min_factor,
            max: cfg.max_factor,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationMap {
    rows: usize,
    cols: usize,
    factors: Vec<f64>,
    /// Target response the source frame was corrected toward.
    pub target_response: f64,
    /// Achieved `(min, max)` factor range after clipping, for diagnostics.
    pub factor_range: (f64, f64),
    /// True when the reference frame had no active cells and the map is
    /// all-neutral.
    pub degenerate: bool,
}

impl CalibrationMap {
    /// All-neutral map (factor 1.0 everywhere).
    pub fn neutral(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            factors: vec![1.0; rows * cols],
            target_response: 1.0,
            factor_range: (1.0, 1.0),
            degenerate: false,
        }
    }

    /// Derive a map from a reference frame.
    ///
    /// `target` defaults to the median of active cells; cells at or below
    /// `mean × 0.1` keep a neutral factor. A reference with no active
    /// cells yields an all-neutral map flagged `degenerate` rather than a
    /// division by zero.
    pub fn from_reference(frame: &SensorFrame, target: Option<f64>, clip: FactorRange) -> Self {
        let (rows, cols) = frame.shape();
        let threshold = frame.active_threshold(ACTIVE_THRESHOLD_RATIO);

        let mut active: Vec<f64> = frame
            .as_slice()
            .iter()
            .copied()
            .filter(|&v| v > threshold)
            .collect();
        if active.is_empty() {
            tracing::warn!("reference frame has no active cells; emitting neutral map");
            let mut map = Self::neutral(rows, cols);
            map.degenerate = true;
            return map;
        }
        active.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let target = target.unwrap_or_else(|| {
            let mid = active.len() / 2;
            if active.len() % 2 == 0 {
                (active[mid - 1] + active[mid]) / 2.0
            } else {
                active[mid]
            }
        });

        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        let factors: Vec<f64> = frame
            .as_slice()
            .iter()
            .map(|&v| {
                if v > threshold {
                    let f = (target / v).clamp(clip.min, clip.max);
                    lo = lo.min(f);
                    hi = hi.max(f);
                    f
                } else {
                    1.0
                }
            })
            .collect();

        tracing::debug!(target, factor_min = lo, factor_max = hi, "calibration map generated");
        Self {
            rows,
            cols,
            factors,
            target_response: target,
            factor_range: (lo, hi),
            degenerate: false,
        }
    }

    /// Rebuild a map from persisted factors (already validated as
    /// positive and finite by the loader).
    pub fn from_factors(rows: usize, cols: usize, factors: Vec<f64>) -> Result<Self, CalError> {
        if rows == 0 || cols == 0 || factors.len() != rows * cols {
            return Err(CalError::ShapeMismatch {
                context: "calibration map construction",
                expected: (rows, cols),
                got: (factors.len() / cols.max(1), cols),
            });
        }
        let lo = factors.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = factors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Self {
            rows,
            cols,
            factors,
            target_response: 1.0,
            factor_range: (lo, hi),
            degenerate: false,
        })
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn factors(&self) -> &[f64] {
        &self.factors
    }

    /// Elementwise multiply against a raw frame. Shape disagreement is a
    /// hard error.
    pub fn apply(&self, frame: &SensorFrame) -> Result<SensorFrame, CalError> {
        frame.ensure_shape(self.shape(), "calibration map application")?;
        Ok(frame.scaled_by(&self.factors))
    }
}

/// Before/after comparison for one frame corrected by one map.
#[derive(Debug, Clone)]
pub struct CorrectionReport {
    pub before: BasicStats,
    pub after: BasicStats,
    /// Relative CV reduction in percent (positive is better).
    pub cv_improvement_pct: f64,
    /// Relative uniformity-index gain in percent.
    pub uniformity_improvement_pct: f64,
}

/// Quantify how much a map improves a frame's uniformity. `None` when the
/// frame has no active cells to compare.
pub fn correction_report(
    frame: &SensorFrame,
    map: &CalibrationMap,
) -> Result<Option<CorrectionReport>, CalError> {
    let corrected = map.apply(frame)?;
    let before_thr = frame.active_threshold(ACTIVE_THRESHOLD_RATIO);
    let after_thr = corrected.active_threshold(ACTIVE_THRESHOLD_RATIO);
    let (Some(before), Some(after)) = (
        stats::basic_stats(frame, before_thr),
        stats::basic_stats(&corrected, after_thr),
    ) else {
        return Ok(None);
    };

    let cv_improvement_pct = if before.cv > 0.0 {
        (before.cv - after.cv) / before.cv * 100.0
    } else {
        0.0
    };
    let before_uniformity = 1.0 - before.cv;
    let uniformity_improvement_pct = if before_uniformity.abs() > f64::EPSILON {
        ((1.0 - after.cv) - before_uniformity) / before_uniformity * 100.0
    } else {
        0.0
    };

    Ok(Some(CorrectionReport {
        before,
        after,
        cv_improvement_pct,
        uniformity_improvement_pct,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_reference_gives_neutral_map() {
        let map = CalibrationMap::from_reference(&SensorFrame::zeros(4, 4), None, FactorRange::default());
        assert!(map.degenerate);
        assert!(map.factors().iter().all(|&f| f == 1.0));
    }

    #[test]
    fn clipping_bounds_extreme_factors() {
        // One very weak cell would need a 100x boost; the clip caps it.
        let f = SensorFrame::new(2, 2, vec![10.0, 10.0, 10.0, 0.1]).unwrap();
        // threshold is mean*0.1 = 0.7525, so the weak cell stays neutral.
        let map = CalibrationMap::from_reference(&f, None, FactorRange { min: 0.2, max: 5.0 });
        assert!(map.factors().iter().all(|&x| (0.2..=5.0).contains(&x)));
    }
}

//! Fixed-shape sensor frames.
//!
//! A `SensorFrame` is one complete snapshot of the pressure array,
//! row-major. Every deployment has a single fixed shape; anything with a
//! different shape is rejected with a typed error, never reshaped.

use crate::error::CalError;

/// Default fraction of the frame mean used as the noise floor for
/// "active" cells.
pub const ACTIVE_THRESHOLD_RATIO: f64 = 0.1;

/// One R×C snapshot of the sensor array.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFrame {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
}

impl SensorFrame {
    /// Build a frame from row-major cell values.
    pub fn new(rows: usize, cols: usize, cells: Vec<f64>) -> Result<Self, CalError> {
        if rows == 0 || cols == 0 || cells.len() != rows * cols {
            let got_rows = if cols > 0 { cells.len() / cols } else { 0 };
            return Err(CalError::ShapeMismatch {
                context: "frame construction",
                expected: (rows, cols),
                got: (got_rows, cols),
            });
        }
        Ok(Self { rows, cols, cells })
    }

    /// All-zero frame of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0.0; rows * cols],
        }
    }

    /// Build from nested rows, enforcing rectangularity.
    pub fn from_rows(grid: &[Vec<f64>]) -> Result<Self, CalError> {
        let rows = grid.len();
        let cols = grid.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(rows * cols);
        for row in grid {
            if row.len() != cols {
                return Err(CalError::ShapeMismatch {
                    context: "frame construction",
                    expected: (rows, cols),
                    got: (rows, row.len()),
                });
            }
            cells.extend_from_slice(row);
        }
        Self::new(rows, cols, cells)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row * self.cols + col]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.cells
    }

    /// Fail with a `ShapeMismatch` unless this frame matches `expected`.
    pub fn ensure_shape(
        &self,
        expected: (usize, usize),
        context: &'static str,
    ) -> Result<(), CalError> {
        if self.shape() == expected {
            Ok(())
        } else {
            Err(CalError::ShapeMismatch {
                context,
                expected,
                got: self.shape(),
            })
        }
    }

    /// Sum of all cells.
    pub fn total_pressure(&self) -> f64 {
        self.cells.iter().sum()
    }

    /// Mean over all cells (zero for an empty frame, which cannot be
    /// constructed anyway).
    pub fn mean(&self) -> f64 {
        if self.cells.is_empty() {
            0.0
        } else {
            self.total_pressure() / self.cells.len() as f64
        }
    }

    /// Noise floor for "active" cells: `mean × ratio`.
    pub fn active_threshold(&self, ratio: f64) -> f64 {
        self.mean() * ratio
    }

    /// Pressure-weighted centroid `(cx, cy)` where `x` is the column axis.
    ///
    /// `None` when total pressure is not positive: the centroid is
    /// undefined and selection must fall closed.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        let total = self.total_pressure();
        if !(total > 0.0) {
            return None;
        }
        let mut cx = 0.0;
        let mut cy = 0.0;
        for row in 0..self.rows {
            for col in 0..self.cols {
                let v = self.get(row, col);
                cx += col as f64 * v;
                cy += row as f64 * v;
            }
        }
        Some((cx / total, cy / total))
    }

    /// Elementwise product with `factors` (same length), as a new frame.
    pub(crate) fn scaled_by(&self, factors: &[f64]) -> Self {
        debug_assert_eq!(factors.len(), self.cells.len());
        let cells = self
            .cells
            .iter()
            .zip(factors)
            .map(|(v, f)| v * f)
            .collect();
        Self {
            rows: self.rows,
            cols: self.cols,
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_and_short_input() {
        assert!(SensorFrame::new(2, 2, vec![1.0, 2.0, 3.0]).is_err());
        assert!(SensorFrame::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
    }

    #[test]
    fn centroid_is_pressure_weighted() {
        let mut cells = vec![0.0; 9];
        cells[4] = 2.0; // center of a 3x3
        let f = SensorFrame::new(3, 3, cells).unwrap();
        assert_eq!(f.centroid(), Some((1.0, 1.0)));
    }

    #[test]
    fn centroid_undefined_for_zero_frame() {
        assert_eq!(SensorFrame::zeros(4, 4).centroid(), None);
    }
}

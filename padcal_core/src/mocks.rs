//! Test doubles for frame acquisition, usable from unit and integration
//! tests without touching real hardware.

use padcal_traits::FrameSource;
use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Replays a fixed sequence of frames, repeating the last one forever.
#[derive(Debug, Clone)]
pub struct StaticFrameSource {
    rows: usize,
    cols: usize,
    frames: Vec<Vec<f64>>,
    idx: usize,
}

impl StaticFrameSource {
    pub fn new(rows: usize, cols: usize, frames: Vec<Vec<f64>>) -> Self {
        Self {
            rows,
            cols,
            frames,
            idx: 0,
        }
    }

    /// A source that always returns the same frame.
    pub fn constant(rows: usize, cols: usize, value: f64) -> Self {
        Self::new(rows, cols, vec![vec![value; rows * cols]])
    }
}

impl FrameSource for StaticFrameSource {
    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn read_frame(&mut self, _timeout: Duration) -> Result<Vec<f64>, BoxError> {
        let frame = self
            .frames
            .get(self.idx)
            .or_else(|| self.frames.last())
            .cloned()
            .ok_or("static source has no frames")?;
        if self.idx + 1 < self.frames.len() {
            self.idx += 1;
        }
        Ok(frame)
    }
}

/// Always fails; exercises the collector's failure cap.
#[derive(Debug, Clone, Copy)]
pub struct FailingFrameSource {
    rows: usize,
    cols: usize,
}

impl FailingFrameSource {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }
}

impl FrameSource for FailingFrameSource {
    fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn read_frame(&mut self, _timeout: Duration) -> Result<Vec<f64>, BoxError> {
        Err("frame source unavailable".into())
    }
}

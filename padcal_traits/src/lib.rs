pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// A source of complete sensor-array snapshots.
///
/// Implementations own the acquisition path (USB, replay file, mock) and
/// hand off one full frame per call as row-major cell values. The engine
/// never reads partial frames; a frame is either complete or an error.
pub trait FrameSource {
    /// Fixed (rows, cols) shape of every frame this source produces.
    fn shape(&self) -> (usize, usize);

    /// Block until the next complete frame is available or `timeout` expires.
    fn read_frame(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Vec<f64>, Box<dyn std::error::Error + Send + Sync>>;
}

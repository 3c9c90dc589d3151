use thiserror::Error;

/// Structural errors: caller or configuration bugs, never retried.
///
/// Degenerate numeric conditions (all-zero reference frames, undefined
/// centroids) are not errors; they produce flagged fallback values so a
/// weight can always be computed.
#[derive(Debug, Error, Clone)]
pub enum CalError {
    #[error("{context}: expected {}x{} grid, got {}x{}", expected.0, expected.1, got.0, got.1)]
    ShapeMismatch {
        context: &'static str,
        expected: (usize, usize),
        got: (usize, usize),
    },
    #[error("unknown calibration position: {0}")]
    UnknownPosition(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

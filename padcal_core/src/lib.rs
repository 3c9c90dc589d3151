#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core calibration engine for 2-D pressure sensor pads (hardware-agnostic).
//!
//! Frame acquisition goes through `padcal_traits::FrameSource`; everything
//! else operates on in-memory frames.
//!
//! ## Architecture
//!
//! - **Frames**: row-major `f64` grids with shape checks (`frame` module)
//! - **Statistics**: consistency and uniformity metrics (`stats`, `cluster`)
//! - **Correction**: per-cell scale-factor maps (`map` module)
//! - **Registry**: named calibration positions (`registry` module)
//! - **Selection**: centroid-nearest position lookup (`select` module)
//! - **Conversion**: linear pressure-to-weight with tare (`convert`)
//! - **Pipeline**: the `PadScale` weighing handle (`scale` module)
//! - **Capture**: background reference-frame averaging (`collector`)
//!
//! All operations are total over finite inputs: degenerate frames produce
//! flagged fallbacks, never panics.

pub mod cluster;
pub mod collector;
pub mod convert;
pub mod error;
pub mod frame;
pub mod map;
pub mod mocks;
pub mod registry;
pub mod scale;
pub mod select;
pub mod stats;

pub use cluster::{cluster_analysis, ClusterAnalysis, ClusterStats};
pub use collector::{FrameCollector, ReferenceCapture};
pub use convert::{convert_weight, WeightResult};
pub use error::{CalError, Report, Result};
pub use frame::SensorFrame;
pub use map::{correction_report, CalibrationMap, CorrectionReport, FactorRange};
pub use registry::{
    CalibrationPosition, CalibrationRegistry, CalibrationSource, DistanceMetric, LinearModel,
    PositionSummary, SelectionSettings, SharedRegistry,
};
pub use scale::PadScale;
pub use select::{
    select_calibration, select_for_center, SelectedCalibration, DEFAULT_INTERCEPT, DEFAULT_SLOPE,
};
pub use stats::{
    analyze, AnalysisOptions, BasicStats, DeadZoneAnalysis, GradientAnalysis, GridAnalysis,
    SensitivityMapping, SpatialConsistency, UniformityMetrics,
};

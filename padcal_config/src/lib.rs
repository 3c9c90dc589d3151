#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! File formats for the pad calibration engine.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Registry JSON (`registry` module) holds named calibration positions
//!   plus selection settings; loads are validated structurally before the
//!   engine ever sees them.
//! - Calibration maps (`map_file` module) round-trip through CSV grids or
//!   equivalently shaped JSON arrays.
//! - Consistency documents (`consistency` module) are the offline audit
//!   format shared with the analysis tooling.

pub mod consistency;
pub mod frame_file;
pub mod map_file;
pub mod registry;

pub use registry::{
    CalibrationEntry, DistanceMethod, PositionEntry, RegistryFile, SettingsEntry, load_registry,
    load_registry_str, save_registry,
};

use serde::Deserialize;
use thiserror::Error;

/// Typed structural errors for every file format in this crate.
///
/// Wrapped in `eyre::Report` at the call sites so callers can downcast
/// when they need the specific failure.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("registry file is malformed: {0}")]
    MalformedRegistry(String),
    #[error("registry value out of range: {0}")]
    InvalidValue(String),
    #[error("calibration map row {row} has {got} columns, expected {expected}")]
    RaggedMap {
        row: usize,
        got: usize,
        expected: usize,
    },
    #[error("calibration map cell ({row},{col}) is not a positive finite number")]
    BadMapCell { row: usize, col: usize },
    #[error("frame cell ({row},{col}) is not a finite non-negative number")]
    BadFrameCell { row: usize, col: usize },
    #[error("unsupported calibration map extension (expected .csv or .json): {0}")]
    UnsupportedMapFormat(String),
    #[error("consistency document is malformed: {0}")]
    MalformedConsistency(String),
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct GridCfg {
    pub rows: usize,
    pub cols: usize,
    /// Fraction of the frame mean below which a cell is treated as noise.
    /// Range: (0.0, 1.0). Default 0.1.
    #[serde(default = "default_active_threshold")]
    pub active_threshold_ratio: f64,
}

fn default_active_threshold() -> f64 {
    0.1
}

/// Clip range for per-cell correction factors.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct MapCfg {
    pub min_factor: f64,
    pub max_factor: f64,
}

impl Default for MapCfg {
    fn default() -> Self {
        Self {
            min_factor: 0.1,
            max_factor: 10.0,
        }
    }
}

/// Default selection gates, used when a registry file carries no settings
/// block of its own.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SelectionCfg {
    pub distance_method: DistanceMethod,
    pub max_distance_threshold: f64,
    pub min_r_squared_threshold: f64,
}

impl Default for SelectionCfg {
    fn default() -> Self {
        Self {
            distance_method: DistanceMethod::Euclidean,
            max_distance_threshold: 50.0,
            min_r_squared_threshold: 0.95,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub grid: GridCfg,
    #[serde(default)]
    pub map: MapCfg,
    #[serde(default)]
    pub selection: SelectionCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Grid
        if self.grid.rows == 0 || self.grid.cols == 0 {
            eyre::bail!("grid.rows and grid.cols must be >= 1");
        }
        if self.grid.rows > 1024 || self.grid.cols > 1024 {
            eyre::bail!("grid dimensions are unreasonably large (>1024)");
        }
        if !(self.grid.active_threshold_ratio > 0.0 && self.grid.active_threshold_ratio < 1.0) {
            eyre::bail!("grid.active_threshold_ratio must be in (0.0, 1.0)");
        }

        // Map clip range
        if !(self.map.min_factor.is_finite() && self.map.min_factor > 0.0) {
            eyre::bail!("map.min_factor must be a positive finite number");
        }
        if !(self.map.max_factor.is_finite() && self.map.max_factor > self.map.min_factor) {
            eyre::bail!("map.max_factor must be finite and > map.min_factor");
        }

        // Selection gates
        if !(self.selection.max_distance_threshold.is_finite()
            && self.selection.max_distance_threshold > 0.0)
        {
            eyre::bail!("selection.max_distance_threshold must be > 0");
        }
        if !(0.0..=1.0).contains(&self.selection.min_r_squared_threshold) {
            eyre::bail!("selection.min_r_squared_threshold must be in [0.0, 1.0]");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

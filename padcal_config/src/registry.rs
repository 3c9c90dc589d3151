//! Registry JSON schema and load/save.
//!
//! On-disk layout:
//!
//! ```json
//! {
//!   "metadata": { "version": "1.0" },
//!   "positions": {
//!     "center": {
//!       "name": "Center",
//!       "x": 32.0, "y": 32.0,
//!       "calibration": {
//!         "slope": 1730.6905, "intercept": 126.1741,
//!         "r_squared": 0.99, "measurement_count": 12,
//!         "last_updated": "2026-05-01T09:30:00"
//!       }
//!     }
//!   },
//!   "settings": {
//!     "distance_calculation_method": "euclidean",
//!     "max_distance_threshold": 50.0,
//!     "min_r_squared_threshold": 0.95,
//!     "fallback_position": "center"
//!   }
//! }
//! ```
//!
//! A load either yields a fully validated `RegistryFile` or fails with a
//! `FormatError`; there is no partially loaded state.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::FormatError;

/// Distance metric between a pressure centroid and a stored position.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMethod {
    #[default]
    Euclidean,
    Manhattan,
    Chebyshev,
}

/// Linear model fitted at one physical position.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CalibrationEntry {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    #[serde(default)]
    pub measurement_count: u32,
    #[serde(default)]
    pub last_updated: String,
}

/// One named calibration position in grid coordinates.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PositionEntry {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub calibration: CalibrationEntry,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SettingsEntry {
    pub distance_calculation_method: DistanceMethod,
    pub max_distance_threshold: f64,
    pub min_r_squared_threshold: f64,
    pub fallback_position: Option<String>,
}

impl Default for SettingsEntry {
    fn default() -> Self {
        Self {
            distance_calculation_method: DistanceMethod::Euclidean,
            max_distance_threshold: 50.0,
            min_r_squared_threshold: 0.95,
            fallback_position: None,
        }
    }
}

/// Whole registry document. `metadata` is carried opaquely so tooling
/// annotations survive a load/save round trip.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistryFile {
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub positions: BTreeMap<String, PositionEntry>,
    #[serde(default)]
    pub settings: SettingsEntry,
}

impl RegistryFile {
    /// Structural validation beyond what serde enforces.
    pub fn validate(&self) -> Result<(), FormatError> {
        for (id, pos) in &self.positions {
            let cal = &pos.calibration;
            if !(0.0..=1.0).contains(&cal.r_squared) {
                return Err(FormatError::InvalidValue(format!(
                    "position {id:?}: r_squared {} outside [0, 1]",
                    cal.r_squared
                )));
            }
            if !cal.slope.is_finite() || !cal.intercept.is_finite() {
                return Err(FormatError::InvalidValue(format!(
                    "position {id:?}: non-finite slope or intercept"
                )));
            }
            if !pos.x.is_finite() || !pos.y.is_finite() {
                return Err(FormatError::InvalidValue(format!(
                    "position {id:?}: non-finite coordinates"
                )));
            }
        }
        if !(self.settings.max_distance_threshold.is_finite()
            && self.settings.max_distance_threshold > 0.0)
        {
            return Err(FormatError::InvalidValue(
                "settings.max_distance_threshold must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.settings.min_r_squared_threshold) {
            return Err(FormatError::InvalidValue(
                "settings.min_r_squared_threshold must be in [0, 1]".into(),
            ));
        }
        if let Some(fb) = &self.settings.fallback_position
            && !self.positions.contains_key(fb)
        {
            // Not fatal: the engine substitutes built-in defaults, but the
            // operator should know their fallback id is dangling.
            tracing::warn!(fallback = %fb, "fallback_position not present in registry");
        }
        Ok(())
    }
}

/// Parse and validate a registry document from a JSON string.
pub fn load_registry_str(s: &str) -> eyre::Result<RegistryFile> {
    let file: RegistryFile = serde_json::from_str(s)
        .map_err(|e| FormatError::MalformedRegistry(e.to_string()))?;
    file.validate()?;
    Ok(file)
}

/// Load a registry document from disk.
pub fn load_registry(path: &Path) -> eyre::Result<RegistryFile> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read registry {:?}: {}", path, e))?;
    load_registry_str(&text)
}

/// Serialize a registry document to disk (pretty-printed JSON).
pub fn save_registry(path: &Path, file: &RegistryFile) -> eyre::Result<()> {
    let text = serde_json::to_string_pretty(file)
        .map_err(|e| eyre::eyre!("serialize registry: {}", e))?;
    std::fs::write(path, text).map_err(|e| eyre::eyre!("write registry {:?}: {}", path, e))?;
    Ok(())
}

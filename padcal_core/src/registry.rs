//! Calibration position registry.
//!
//! The registry is the only shared mutable state in the engine: loaded
//! wholesale from a registry file, read by the selector on every
//! conversion, written only by explicit update or replace calls.
//! `SharedRegistry` guards it with a read-write lock so a selection never
//! observes an entry mid-update.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::error::CalError;
use crate::map::CalibrationMap;

/// Distance between a pressure centroid and a stored position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    #[default]
    Euclidean,
    Manhattan,
    Chebyshev,
}

impl DistanceMetric {
    pub fn distance(self, a: (f64, f64), b: (f64, f64)) -> f64 {
        let dx = a.0 - b.0;
        let dy = a.1 - b.1;
        match self {
            Self::Euclidean => (dx * dx + dy * dy).sqrt(),
            Self::Manhattan => dx.abs() + dy.abs(),
            Self::Chebyshev => dx.abs().max(dy.abs()),
        }
    }
}

impl From<padcal_config::DistanceMethod> for DistanceMetric {
    fn from(m: padcal_config::DistanceMethod) -> Self {
        match m {
            padcal_config::DistanceMethod::Euclidean => Self::Euclidean,
            padcal_config::DistanceMethod::Manhattan => Self::Manhattan,
            padcal_config::DistanceMethod::Chebyshev => Self::Chebyshev,
        }
    }
}

impl From<DistanceMetric> for padcal_config::DistanceMethod {
    fn from(m: DistanceMetric) -> Self {
        match m {
            DistanceMetric::Euclidean => Self::Euclidean,
            DistanceMetric::Manhattan => Self::Manhattan,
            DistanceMetric::Chebyshev => Self::Chebyshev,
        }
    }
}

/// Linear pressure-to-weight model fitted at one position.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
    /// Fit quality in [0, 1].
    pub r_squared: f64,
    pub measurement_count: u32,
    pub last_updated: String,
}

/// A named calibration position in grid coordinates (same space as
/// pressure centroids).
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationPosition {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub calibration: LinearModel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSettings {
    pub metric: DistanceMetric,
    pub max_distance_threshold: f64,
    pub min_r_squared_threshold: f64,
    pub fallback_position: Option<String>,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::Euclidean,
            max_distance_threshold: 50.0,
            min_r_squared_threshold: 0.95,
            fallback_position: None,
        }
    }
}

/// In-memory registry: position id -> position, plus selection settings.
///
/// Iteration order is the ordered map's key order; when two positions are
/// exactly equidistant from a centroid, the first one encountered wins.
/// Positions are expected to be spatially distinct, so no stronger
/// tie-break is guaranteed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationRegistry {
    positions: BTreeMap<String, CalibrationPosition>,
    pub settings: SelectionSettings,
}

/// Read-only projection of one registry entry for diagnostics.
#[derive(Debug, Clone)]
pub struct PositionSummary {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub measurement_count: u32,
    pub last_updated: String,
}

impl CalibrationRegistry {
    pub fn new(settings: SelectionSettings) -> Self {
        Self {
            positions: BTreeMap::new(),
            settings,
        }
    }

    pub fn insert_position(&mut self, id: impl Into<String>, position: CalibrationPosition) {
        self.positions.insert(id.into(), position);
    }

    pub fn get(&self, id: &str) -> Option<&CalibrationPosition> {
        self.positions.get(id)
    }

    pub fn positions(&self) -> impl Iterator<Item = (&String, &CalibrationPosition)> {
        self.positions.iter()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Replace one entry's calibration block and refresh its timestamp.
    /// Fails without mutation when `id` is absent.
    pub fn update_position(
        &mut self,
        id: &str,
        slope: f64,
        intercept: f64,
        r_squared: f64,
        measurement_count: u32,
    ) -> Result<(), CalError> {
        let position = self
            .positions
            .get_mut(id)
            .ok_or_else(|| CalError::UnknownPosition(id.to_string()))?;
        position.calibration = LinearModel {
            slope,
            intercept,
            r_squared,
            measurement_count,
            last_updated: chrono::Utc::now().to_rfc3339(),
        };
        tracing::debug!(id, slope, intercept, r_squared, "position calibration updated");
        Ok(())
    }

    /// Read-only projection of all positions.
    pub fn summary(&self) -> Vec<PositionSummary> {
        self.positions
            .iter()
            .map(|(id, p)| PositionSummary {
                id: id.clone(),
                name: p.name.clone(),
                x: p.x,
                y: p.y,
                slope: p.calibration.slope,
                intercept: p.calibration.intercept,
                r_squared: p.calibration.r_squared,
                measurement_count: p.calibration.measurement_count,
                last_updated: p.calibration.last_updated.clone(),
            })
            .collect()
    }
}

impl From<&padcal_config::RegistryFile> for CalibrationRegistry {
    fn from(file: &padcal_config::RegistryFile) -> Self {
        let mut registry = Self::new(SelectionSettings {
            metric: file.settings.distance_calculation_method.into(),
            max_distance_threshold: file.settings.max_distance_threshold,
            min_r_squared_threshold: file.settings.min_r_squared_threshold,
            fallback_position: file.settings.fallback_position.clone(),
        });
        for (id, entry) in &file.positions {
            registry.insert_position(
                id.clone(),
                CalibrationPosition {
                    name: entry.name.clone(),
                    x: entry.x,
                    y: entry.y,
                    calibration: LinearModel {
                        slope: entry.calibration.slope,
                        intercept: entry.calibration.intercept,
                        r_squared: entry.calibration.r_squared,
                        measurement_count: entry.calibration.measurement_count,
                        last_updated: entry.calibration.last_updated.clone(),
                    },
                },
            );
        }
        registry
    }
}

impl From<&CalibrationRegistry> for padcal_config::RegistryFile {
    fn from(registry: &CalibrationRegistry) -> Self {
        let positions = registry
            .positions
            .iter()
            .map(|(id, p)| {
                (
                    id.clone(),
                    padcal_config::PositionEntry {
                        name: p.name.clone(),
                        x: p.x,
                        y: p.y,
                        calibration: padcal_config::CalibrationEntry {
                            slope: p.calibration.slope,
                            intercept: p.calibration.intercept,
                            r_squared: p.calibration.r_squared,
                            measurement_count: p.calibration.measurement_count,
                            last_updated: p.calibration.last_updated.clone(),
                        },
                    },
                )
            })
            .collect();
        padcal_config::RegistryFile {
            metadata: serde_json::Value::Null,
            positions,
            settings: padcal_config::SettingsEntry {
                distance_calculation_method: registry.settings.metric.into(),
                max_distance_threshold: registry.settings.max_distance_threshold,
                min_r_squared_threshold: registry.settings.min_r_squared_threshold,
                fallback_position: registry.settings.fallback_position.clone(),
            },
        }
    }
}

/// Thread-safe handle to the registry. Readers take a consistent snapshot
/// so a concurrent update can never pair a stale slope with a fresh fit
/// quality.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<CalibrationRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: CalibrationRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Clone the current registry state under the read lock.
    pub fn snapshot(&self) -> CalibrationRegistry {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Replace the whole registry (a `load` fully supersedes prior state).
    pub fn replace(&self, registry: CalibrationRegistry) {
        *self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = registry;
    }

    pub fn update_position(
        &self,
        id: &str,
        slope: f64,
        intercept: f64,
        r_squared: f64,
        measurement_count: u32,
    ) -> Result<(), CalError> {
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .update_position(id, slope, intercept, r_squared, measurement_count)
    }
}

/// Where calibration parameters come from, dispatched explicitly at scale
/// construction instead of probing loaded objects for capabilities.
#[derive(Debug, Clone)]
pub enum CalibrationSource {
    /// A single fixed linear model, applied regardless of load position.
    LinearModel(LinearModel),
    /// Only a per-cell correction map; weights use built-in default
    /// parameters.
    MapOnly(CalibrationMap),
    /// Full position registry with optional correction map.
    Registry {
        registry: CalibrationRegistry,
        map: Option<CalibrationMap>,
    },
}

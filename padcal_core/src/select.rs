//! Position selection: pick the calibration whose stored position is
//! nearest to the frame's pressure centroid, or fall back when nothing
//! qualifies. Selection is total: it always yields usable parameters.

use crate::frame::SensorFrame;
use crate::registry::{CalibrationRegistry, LinearModel};

/// Built-in parameters used when no stored calibration qualifies.
pub const DEFAULT_SLOPE: f64 = 1730.6905;
pub const DEFAULT_INTERCEPT: f64 = 126.1741;

/// The calibration chosen for one frame, with enough provenance to explain
/// the choice afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedCalibration {
    pub slope: f64,
    pub intercept: f64,
    /// Registry id of the chosen position; `None` for built-in defaults.
    pub position_id: Option<String>,
    pub position_name: Option<String>,
    /// Distance from centroid to the chosen position. Infinite when no
    /// centroid or no position was usable.
    pub distance: f64,
    pub r_squared: f64,
    pub pressure_center: Option<(f64, f64)>,
    pub is_fallback: bool,
}

impl SelectedCalibration {
    fn fallback(registry: &CalibrationRegistry, center: Option<(f64, f64)>) -> Self {
        if let Some(id) = registry.settings.fallback_position.as_deref()
            && let Some(p) = registry.get(id)
        {
            let distance = match center {
                Some(c) => registry.settings.metric.distance(c, (p.x, p.y)),
                None => f64::INFINITY,
            };
            return Self {
                slope: p.calibration.slope,
                intercept: p.calibration.intercept,
                position_id: Some(id.to_string()),
                position_name: Some(p.name.clone()),
                distance,
                r_squared: p.calibration.r_squared,
                pressure_center: center,
                is_fallback: true,
            };
        }
        Self {
            slope: DEFAULT_SLOPE,
            intercept: DEFAULT_INTERCEPT,
            position_id: None,
            position_name: None,
            distance: f64::INFINITY,
            r_squared: 0.0,
            pressure_center: center,
            is_fallback: true,
        }
    }

    pub fn from_model(model: &LinearModel) -> Self {
        Self {
            slope: model.slope,
            intercept: model.intercept,
            position_id: None,
            position_name: None,
            distance: f64::INFINITY,
            r_squared: model.r_squared,
            pressure_center: None,
            is_fallback: false,
        }
    }
}

/// Choose the calibration for `frame` against `registry`.
///
/// The single nearest position (by the configured metric) is found first;
/// ties go to the first in registry order. That one match is then gated:
/// too far from the centroid, or fit quality below the r² threshold, and
/// selection routes to the fallback rather than sliding to a farther
/// position. No centroid (empty frame) or empty registry also fall back.
pub fn select_calibration(
    registry: &CalibrationRegistry,
    frame: &SensorFrame,
) -> SelectedCalibration {
    let Some(center) = frame.centroid() else {
        tracing::warn!("no pressure detected, using fallback calibration");
        return SelectedCalibration::fallback(registry, None);
    };
    select_for_center(registry, center)
}

/// Same selection rule given an already-computed pressure centroid.
pub fn select_for_center(
    registry: &CalibrationRegistry,
    center: (f64, f64),
) -> SelectedCalibration {
    let settings = &registry.settings;
    let mut nearest: Option<(f64, &String)> = None;
    for (id, position) in registry.positions() {
        let d = settings.metric.distance(center, (position.x, position.y));
        if nearest.is_none_or(|(bd, _)| d < bd) {
            nearest = Some((d, id));
        }
    }
    let Some((distance, id)) = nearest else {
        tracing::warn!("registry holds no positions, using fallback");
        return SelectedCalibration::fallback(registry, Some(center));
    };
    // id came from this registry, so it resolves
    let p = match registry.get(id) {
        Some(p) => p,
        None => return SelectedCalibration::fallback(registry, Some(center)),
    };
    if distance > settings.max_distance_threshold {
        tracing::warn!(
            id,
            distance,
            threshold = settings.max_distance_threshold,
            "nearest position too far from centroid, using fallback"
        );
        return SelectedCalibration::fallback(registry, Some(center));
    }
    if p.calibration.r_squared < settings.min_r_squared_threshold {
        tracing::warn!(
            id,
            r_squared = p.calibration.r_squared,
            threshold = settings.min_r_squared_threshold,
            "nearest position fit quality too low, using fallback"
        );
        return SelectedCalibration::fallback(registry, Some(center));
    }
    tracing::debug!(
        id,
        distance,
        r_squared = p.calibration.r_squared,
        "selected position calibration"
    );
    SelectedCalibration {
        slope: p.calibration.slope,
        intercept: p.calibration.intercept,
        position_id: Some(id.clone()),
        position_name: Some(p.name.clone()),
        distance,
        r_squared: p.calibration.r_squared,
        pressure_center: Some(center),
        is_fallback: false,
    }
}

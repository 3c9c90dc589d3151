//! End-to-end weighing pipeline: correction map, position selection and
//! weight conversion behind one handle.

use crate::convert::{convert_weight, WeightResult};
use crate::error::CalError;
use crate::frame::SensorFrame;
use crate::map::CalibrationMap;
use crate::registry::{
    CalibrationRegistry, CalibrationSource, SelectionSettings, SharedRegistry,
};
use crate::select::{select_calibration, SelectedCalibration};

/// A calibrated weighing pad.
///
/// Construction fixes the frame shape; every frame passed in afterwards is
/// checked against it. The registry is shared so an external reload or
/// position update takes effect on the next measurement.
#[derive(Debug, Clone)]
pub struct PadScale {
    registry: SharedRegistry,
    map: Option<CalibrationMap>,
    zero_pressure: Option<f64>,
    rows: usize,
    cols: usize,
    fixed_model: Option<SelectedCalibration>,
}

impl PadScale {
    pub fn new(registry: SharedRegistry, map: Option<CalibrationMap>, rows: usize, cols: usize) -> Self {
        Self {
            registry,
            map,
            zero_pressure: None,
            rows,
            cols,
            fixed_model: None,
        }
    }

    /// Build a scale from an explicit calibration source.
    pub fn from_source(source: CalibrationSource, rows: usize, cols: usize) -> Self {
        match source {
            CalibrationSource::LinearModel(model) => {
                let mut scale = Self::new(SharedRegistry::default(), None, rows, cols);
                scale.fixed_model = Some(SelectedCalibration::from_model(&model));
                scale
            }
            CalibrationSource::MapOnly(map) => {
                let registry = CalibrationRegistry::new(SelectionSettings::default());
                Self::new(SharedRegistry::new(registry), Some(map), rows, cols)
            }
            CalibrationSource::Registry { registry, map } => {
                Self::new(SharedRegistry::new(registry), map, rows, cols)
            }
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Whether a usable tare reference is in effect. A reference captured
    /// over a quiet pad (zero total pressure) does not count as tared.
    pub fn is_tared(&self) -> bool {
        self.zero_pressure.is_some_and(|z| z > 0.0)
    }

    fn corrected(&self, frame: &SensorFrame) -> Result<SensorFrame, CalError> {
        frame.ensure_shape((self.rows, self.cols), "measurement frame")?;
        match &self.map {
            Some(map) => map.apply(frame),
            None => Ok(frame.clone()),
        }
    }

    /// Record the current corrected total pressure as the zero reference.
    pub fn tare(&mut self, frame: &SensorFrame) -> Result<f64, CalError> {
        let corrected = self.corrected(frame)?;
        let zero = corrected.total_pressure();
        self.zero_pressure = Some(zero);
        tracing::debug!(zero, "tare reference captured");
        Ok(zero)
    }

    pub fn clear_tare(&mut self) {
        self.zero_pressure = None;
    }

    /// Convert one frame to a weight reading.
    pub fn measure(&self, frame: &SensorFrame) -> Result<WeightResult, CalError> {
        let corrected = self.corrected(frame)?;
        let calibration = match &self.fixed_model {
            Some(model) => {
                let mut c = model.clone();
                c.pressure_center = corrected.centroid();
                c
            }
            None => {
                let snapshot = self.registry.snapshot();
                select_calibration(&snapshot, &corrected)
            }
        };
        Ok(convert_weight(
            corrected.total_pressure(),
            self.zero_pressure,
            calibration,
        ))
    }
}

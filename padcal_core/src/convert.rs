//! Pressure-to-weight conversion with tare semantics.

use crate::select::SelectedCalibration;

/// One converted reading with the calibration that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightResult {
    /// Converted weight in grams, never negative.
    pub grams: f64,
    pub raw_pressure: f64,
    pub net_pressure: f64,
    pub tared: bool,
    pub calibration: SelectedCalibration,
}

/// Convert a total pressure reading to grams.
///
/// With a positive tare reference the intercept is understood to be
/// absorbed by the tare, so only the slope applies to the net pressure.
/// A zero or negative tare reference carries no offset to absorb (a tare
/// captured over a quiet pad), so the full linear model applies, same as
/// no tare at all. Either way the result is clamped at zero: sensor noise
/// below the tare point reads as an empty pad, not negative mass.
pub fn convert_weight(
    total_pressure: f64,
    zero_pressure: Option<f64>,
    calibration: SelectedCalibration,
) -> WeightResult {
    let (net, grams, tared) = match zero_pressure {
        Some(zero) if zero > 0.0 => {
            let net = total_pressure - zero;
            (net, calibration.slope * net, true)
        }
        _ => (
            total_pressure,
            calibration.slope * total_pressure + calibration.intercept,
            false,
        ),
    };
    WeightResult {
        grams: grams.max(0.0),
        raw_pressure: total_pressure,
        net_pressure: net,
        tared,
        calibration,
    }
}

//! Consistency-audit document.
//!
//! Written by the offline analysis tooling after a guided measurement
//! session: for each guide position and each reference weight, the total
//! pressure observed and the derived sensitivity. The engine only
//! validates and summarizes these documents; it never produces them.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::FormatError;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GuidePosition {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WeightInfo {
    /// Reference mass in grams.
    pub mass: f64,
    pub unit: String,
    /// Gravitational force in newtons for the reference mass.
    pub force: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WeightMeasurement {
    pub weight_info: WeightInfo,
    pub avg_total_pressure: f64,
    pub std_total_pressure: f64,
    pub cv: f64,
    /// Total pressure per newton of applied force.
    pub sensitivity_total: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConsistencyDoc {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub guide_positions: BTreeMap<String, GuidePosition>,
    /// position_id -> weight_id -> measurement
    #[serde(default)]
    pub consistency_results: BTreeMap<String, BTreeMap<String, WeightMeasurement>>,
}

impl ConsistencyDoc {
    /// Report structural gaps without failing: positions with no data,
    /// empty result sets, measurements with non-finite values. The caller
    /// decides whether any issue is fatal.
    pub fn audit(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for pos_id in self.guide_positions.keys() {
            if !self.consistency_results.contains_key(pos_id) {
                issues.push(format!("position {pos_id} has no measurement data"));
            }
        }

        for (pos_id, results) in &self.consistency_results {
            if results.is_empty() {
                issues.push(format!("position {pos_id} has an empty result set"));
                continue;
            }
            for (weight_id, m) in results {
                if !m.sensitivity_total.is_finite() {
                    issues.push(format!(
                        "position {pos_id} weight {weight_id}: non-finite sensitivity"
                    ));
                }
                if !m.cv.is_finite() || m.cv < 0.0 {
                    issues.push(format!(
                        "position {pos_id} weight {weight_id}: invalid cv {}",
                        m.cv
                    ));
                }
            }
        }

        issues
    }
}

pub fn load_consistency(path: &Path) -> eyre::Result<ConsistencyDoc> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read consistency document {:?}: {}", path, e))?;
    let doc: ConsistencyDoc = serde_json::from_str(&text)
        .map_err(|e| FormatError::MalformedConsistency(e.to_string()))?;
    Ok(doc)
}

pub fn save_consistency(path: &Path, doc: &ConsistencyDoc) -> eyre::Result<()> {
    let text = serde_json::to_string_pretty(doc)
        .map_err(|e| eyre::eyre!("serialize consistency document: {}", e))?;
    std::fs::write(path, text)
        .map_err(|e| eyre::eyre!("write consistency document {:?}: {}", path, e))?;
    Ok(())
}

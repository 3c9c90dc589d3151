//! Command implementations: file loading, engine calls, output shaping.

use std::path::Path;

use eyre::WrapErr;
use serde_json::json;

use padcal_config::consistency::load_consistency;
use padcal_config::frame_file::{load_frame, save_frame};
use padcal_config::map_file::{load_map, save_map};
use padcal_config::{load_registry, save_registry, Config, RegistryFile};
use padcal_core::{
    analyze, correction_report, AnalysisOptions, CalibrationMap, CalibrationRegistry, FactorRange,
    GridAnalysis, PadScale, SensorFrame, SharedRegistry,
};

use crate::cli::JSON_MODE;

fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

fn read_frame_file(path: &Path) -> eyre::Result<SensorFrame> {
    let (rows, cols, cells) = load_frame(path)?;
    SensorFrame::new(rows, cols, cells)
        .wrap_err_with(|| format!("frame {} has an inconsistent shape", path.display()))
}

fn read_map_file(path: &Path) -> eyre::Result<CalibrationMap> {
    let (rows, cols, cells) = load_map(path)?;
    CalibrationMap::from_factors(rows, cols, cells)
        .wrap_err_with(|| format!("map {} has an inconsistent shape", path.display()))
}

fn analysis_json(a: &GridAnalysis) -> serde_json::Value {
    let mut out = json!({ "active_threshold": a.active_threshold });
    if let Some(b) = &a.basic {
        out["basic"] = json!({
            "mean": b.mean, "std": b.std, "cv": b.cv,
            "min": b.min, "max": b.max,
            "median": b.median, "q25": b.q25, "q75": b.q75,
            "active_cells": b.active_cells, "total_cells": b.total_cells,
            "active_ratio": b.active_ratio,
        });
    }
    out["spatial"] = json!({
        "neighbor_consistency": a.spatial.neighbor_consistency,
        "smoothness_std": a.spatial.smoothness_std,
        "high_variation_points": a.spatial.high_variation_points,
    });
    if let Some(u) = &a.uniformity {
        out["uniformity"] = json!({
            "uniformity_index": u.uniformity_index,
            "response_range": u.response_range,
            "relative_range": u.relative_range,
            "outlier_ratio": u.outlier_ratio,
            "response_ratio": if u.response_ratio.is_finite() {
                json!(u.response_ratio)
            } else {
                json!("inf")
            },
        });
    }
    out["dead_zones"] = json!({
        "dead_zone_ratio": a.dead_zones.dead_zone_ratio,
        "region_count": a.dead_zones.region_count,
        "avg_region_size": a.dead_zones.avg_region_size,
        "largest_region": a.dead_zones.largest_region,
    });
    if let Some(s) = &a.sensitivity {
        out["sensitivity"] = json!({
            "reference": s.reference,
            "mean_sensitivity": s.mean_sensitivity,
            "sensitivity_std": s.sensitivity_std,
            "low_sensitivity_ratio": s.low_sensitivity_ratio,
            "high_sensitivity_ratio": s.high_sensitivity_ratio,
        });
    }
    if let Some(g) = &a.gradient {
        out["gradient"] = json!({
            "avg_gradient": g.avg_gradient,
            "max_gradient": g.max_gradient,
            "gradient_std": g.gradient_std,
            "high_gradient_ratio": g.high_gradient_ratio,
        });
    }
    if let Some(c) = &a.clusters {
        out["clusters"] = json!({
            "cluster_count": c.cluster_count,
            "silhouette": c.silhouette,
            "clusters": c.clusters.iter().map(|k| json!({
                "size": k.size,
                "mean_response": k.mean_response,
                "std_response": k.std_response,
            })).collect::<Vec<_>>(),
        });
    }
    out
}

pub fn run_analyze(
    cfg: &Config,
    frame_path: &Path,
    threshold: Option<f64>,
    no_clusters: bool,
) -> eyre::Result<()> {
    let frame = read_frame_file(frame_path)?;
    let opts = AnalysisOptions {
        active_threshold: threshold,
        active_threshold_ratio: cfg.grid.active_threshold_ratio,
        sensitivity_reference: None,
        with_clusters: !no_clusters,
    };
    let a = analyze(&frame, &opts);

    if json_mode() {
        println!("{}", analysis_json(&a));
        return Ok(());
    }

    println!("frame: {} ({}x{})", frame_path.display(), frame.rows(), frame.cols());
    match &a.basic {
        Some(b) => {
            println!(
                "basic: mean={:.4} std={:.4} cv={:.4} range=[{:.4}, {:.4}]",
                b.mean, b.std, b.cv, b.min, b.max
            );
            println!(
                "       active {}/{} cells ({:.1}%)",
                b.active_cells,
                b.total_cells,
                100.0 * b.active_ratio
            );
        }
        None => println!("basic: no active cells above threshold {:.4}", a.active_threshold),
    }
    println!(
        "spatial: consistency={:.4} smoothness_std={:.4} high_variation={}",
        a.spatial.neighbor_consistency, a.spatial.smoothness_std, a.spatial.high_variation_points
    );
    if let Some(u) = &a.uniformity {
        println!(
            "uniformity: index={:.4} outliers={:.2}% ratio={:.3}",
            u.uniformity_index,
            100.0 * u.outlier_ratio,
            u.response_ratio
        );
    }
    println!(
        "dead zones: {:.2}% in {} region(s), largest {}",
        100.0 * a.dead_zones.dead_zone_ratio,
        a.dead_zones.region_count,
        a.dead_zones.largest_region
    );
    if let Some(g) = &a.gradient {
        println!(
            "gradient: avg={:.4} max={:.4} high_ratio={:.2}%",
            g.avg_gradient,
            g.max_gradient,
            100.0 * g.high_gradient_ratio
        );
    }
    if let Some(c) = &a.clusters {
        println!(
            "clusters: {} group(s), silhouette {:.3}",
            c.cluster_count, c.silhouette
        );
        for (i, k) in c.clusters.iter().enumerate() {
            println!(
                "  cluster {}: {} cells, mean {:.4}, std {:.4}",
                i, k.size, k.mean_response, k.std_response
            );
        }
    }
    Ok(())
}

pub fn run_gen_map(
    cfg: &Config,
    frame_path: &Path,
    out: &Path,
    target: Option<f64>,
) -> eyre::Result<()> {
    let frame = read_frame_file(frame_path)?;
    let clip = FactorRange::from(cfg.map);
    let map = CalibrationMap::from_reference(&frame, target, clip);
    if map.degenerate {
        tracing::warn!("reference frame had no active cells; writing a neutral map");
    }
    let (rows, cols) = map.shape();
    save_map(out, rows, cols, map.factors())?;

    if json_mode() {
        println!(
            "{}",
            json!({
                "out": out.display().to_string(),
                "rows": rows, "cols": cols,
                "target_response": map.target_response,
                "degenerate": map.degenerate,
            })
        );
    } else {
        println!(
            "wrote {}x{} map to {} (target {:.4}{})",
            rows,
            cols,
            out.display(),
            map.target_response,
            if map.degenerate { ", degenerate" } else { "" }
        );
    }
    Ok(())
}

pub fn run_apply_map(frame_path: &Path, map_path: &Path, out: Option<&Path>) -> eyre::Result<()> {
    let frame = read_frame_file(frame_path)?;
    let map = read_map_file(map_path)?;
    let corrected = map.apply(&frame)?;
    let report = correction_report(&frame, &map)?;

    if let Some(out) = out {
        save_frame(out, corrected.rows(), corrected.cols(), corrected.as_slice())?;
    }

    if json_mode() {
        let report_json = report.as_ref().map(|r| {
            json!({
                "cv_before": r.before.cv,
                "cv_after": r.after.cv,
                "cv_improvement_pct": r.cv_improvement_pct,
                "uniformity_improvement_pct": r.uniformity_improvement_pct,
            })
        });
        println!(
            "{}",
            json!({
                "out": out.map(|p| p.display().to_string()),
                "report": report_json,
            })
        );
        return Ok(());
    }

    match report {
        Some(r) => println!(
            "cv {:.4} -> {:.4} ({:+.1}%), uniformity {:+.1}%",
            r.before.cv, r.after.cv, r.cv_improvement_pct, r.uniformity_improvement_pct
        ),
        None => println!("no active cells; nothing to report"),
    }
    if let Some(out) = out {
        println!("corrected frame written to {}", out.display());
    }
    Ok(())
}

pub fn run_weigh(
    registry_path: &Path,
    frame_path: &Path,
    map_path: Option<&Path>,
    tare_path: Option<&Path>,
) -> eyre::Result<()> {
    let file = load_registry(registry_path)?;
    let registry = CalibrationRegistry::from(&file);
    let frame = read_frame_file(frame_path)?;
    let map = map_path.map(read_map_file).transpose()?;
    let (rows, cols) = frame.shape();

    let mut scale = PadScale::new(SharedRegistry::new(registry), map, rows, cols);
    if let Some(tare_path) = tare_path {
        let tare_frame = read_frame_file(tare_path)?;
        let zero = scale.tare(&tare_frame)?;
        tracing::info!(zero, "tare applied");
    }
    let result = scale.measure(&frame)?;

    if json_mode() {
        let c = &result.calibration;
        println!(
            "{}",
            json!({
                "grams": result.grams,
                "raw_pressure": result.raw_pressure,
                "net_pressure": result.net_pressure,
                "tared": result.tared,
                "calibration": {
                    "position_id": c.position_id,
                    "position_name": c.position_name,
                    "slope": c.slope,
                    "intercept": c.intercept,
                    "r_squared": c.r_squared,
                    "distance": if c.distance.is_finite() { json!(c.distance) } else { json!("inf") },
                    "pressure_center": c.pressure_center.map(|(x, y)| json!([x, y])),
                    "is_fallback": c.is_fallback,
                },
            })
        );
        return Ok(());
    }

    println!("weight: {:.2} g{}", result.grams, if result.tared { " (tared)" } else { "" });
    let c = &result.calibration;
    match (&c.position_id, c.is_fallback) {
        (Some(id), false) => println!(
            "calibration: position {:?} at distance {:.2} (r2 {:.3})",
            id, c.distance, c.r_squared
        ),
        (Some(id), true) => println!("calibration: fallback position {id:?}"),
        (None, _) => println!("calibration: built-in defaults (no qualifying position)"),
    }
    Ok(())
}

pub fn run_registry_summary(registry_path: &Path) -> eyre::Result<()> {
    let file = load_registry(registry_path)?;
    let registry = CalibrationRegistry::from(&file);
    let summary = registry.summary();

    if json_mode() {
        let entries: Vec<_> = summary
            .iter()
            .map(|p| {
                json!({
                    "id": p.id, "name": p.name,
                    "x": p.x, "y": p.y,
                    "slope": p.slope, "intercept": p.intercept,
                    "r_squared": p.r_squared,
                    "measurement_count": p.measurement_count,
                    "last_updated": p.last_updated,
                })
            })
            .collect();
        println!("{}", json!({ "positions": entries }));
        return Ok(());
    }

    if summary.is_empty() {
        println!("registry is empty");
        return Ok(());
    }
    for p in summary {
        println!(
            "{:12} {:20} ({:6.1},{:6.1})  slope {:10.4}  intercept {:9.4}  r2 {:.3}  n={}",
            p.id, p.name, p.x, p.y, p.slope, p.intercept, p.r_squared, p.measurement_count
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn run_registry_update(
    registry_path: &Path,
    id: &str,
    slope: f64,
    intercept: f64,
    r_squared: f64,
    measurement_count: u32,
) -> eyre::Result<()> {
    let file = load_registry(registry_path)?;
    let mut registry = CalibrationRegistry::from(&file);
    registry.update_position(id, slope, intercept, r_squared, measurement_count)?;

    // Keep tooling metadata from the original document.
    let mut updated = RegistryFile::from(&registry);
    updated.metadata = file.metadata;
    updated.validate()?;
    save_registry(registry_path, &updated)?;

    if json_mode() {
        println!("{}", json!({ "updated": id }));
    } else {
        println!("updated position {id:?}");
    }
    Ok(())
}

pub fn run_audit(doc_path: &Path) -> eyre::Result<()> {
    let doc = load_consistency(doc_path)?;
    let issues = doc.audit();

    if json_mode() {
        println!("{}", json!({ "issues": issues }));
        return Ok(());
    }
    if issues.is_empty() {
        println!("no issues found");
    } else {
        for issue in &issues {
            println!("issue: {issue}");
        }
        println!("{} issue(s)", issues.len());
    }
    Ok(())
}

pub fn run_self_check(cfg: &Config, registry_path: Option<&Path>) -> eyre::Result<()> {
    cfg.validate()?;
    if let Some(path) = registry_path {
        let file = load_registry(path)?;
        tracing::info!(positions = file.positions.len(), "registry is valid");
    }
    if json_mode() {
        println!("{}", json!({ "ok": true }));
    } else {
        println!("ok");
    }
    Ok(())
}

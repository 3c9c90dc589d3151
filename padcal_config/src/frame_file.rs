//! Sensor frame persistence.
//!
//! Same two representations as calibration maps (headerless CSV and a
//! JSON 2-D array), but cells are pressure readings: any finite value of
//! zero or above is accepted.

use std::path::Path;

use crate::FormatError;

/// A raw reading grid as read from disk: `(rows, cols, row-major cells)`.
pub type FrameGrid = (usize, usize, Vec<f64>);

fn check_reading(v: f64, row: usize, col: usize) -> Result<f64, FormatError> {
    if v.is_finite() && v >= 0.0 {
        Ok(v)
    } else {
        Err(FormatError::BadFrameCell { row, col })
    }
}

/// Load a reading grid from a headerless CSV of floats.
pub fn load_frame_csv(path: &Path) -> eyre::Result<FrameGrid> {
    // flexible so ragged rows reach the typed length check below
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open frame CSV {:?}: {}", path, e))?;

    let mut cells = Vec::new();
    let mut cols = 0usize;
    let mut rows = 0usize;
    for (row_idx, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(|e| eyre::eyre!("read CSV row {}: {}", row_idx + 1, e))?;
        if row_idx == 0 {
            cols = rec.len();
        } else if rec.len() != cols {
            return Err(FormatError::RaggedMap {
                row: row_idx,
                got: rec.len(),
                expected: cols,
            }
            .into());
        }
        for (col_idx, field) in rec.iter().enumerate() {
            let v: f64 = field.trim().parse().map_err(|_| FormatError::BadFrameCell {
                row: row_idx,
                col: col_idx,
            })?;
            cells.push(check_reading(v, row_idx, col_idx)?);
        }
        rows += 1;
    }
    if rows == 0 || cols == 0 {
        eyre::bail!("frame CSV {:?} is empty", path);
    }
    Ok((rows, cols, cells))
}

/// Load a reading grid from a JSON 2-D array.
pub fn load_frame_json(path: &Path) -> eyre::Result<FrameGrid> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read frame {:?}: {}", path, e))?;
    let grid: Vec<Vec<f64>> =
        serde_json::from_str(&text).map_err(|e| eyre::eyre!("parse frame {:?}: {}", path, e))?;
    let rows = grid.len();
    let cols = grid.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        eyre::bail!("frame {:?} is empty", path);
    }
    let mut cells = Vec::with_capacity(rows * cols);
    for (row_idx, row) in grid.iter().enumerate() {
        if row.len() != cols {
            return Err(FormatError::RaggedMap {
                row: row_idx,
                got: row.len(),
                expected: cols,
            }
            .into());
        }
        for (col_idx, &v) in row.iter().enumerate() {
            cells.push(check_reading(v, row_idx, col_idx)?);
        }
    }
    Ok((rows, cols, cells))
}

/// Load a reading grid, dispatching on the file extension.
pub fn load_frame(path: &Path) -> eyre::Result<FrameGrid> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => load_frame_csv(path),
        Some("json") => load_frame_json(path),
        other => Err(FormatError::UnsupportedMapFormat(format!("{other:?}")).into()),
    }
}

/// Save a reading grid, dispatching on the file extension. The layout is
/// identical to calibration maps so the same tooling can open both.
pub fn save_frame(path: &Path, rows: usize, cols: usize, cells: &[f64]) -> eyre::Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => crate::map_file::save_map_csv(path, rows, cols, cells),
        Some("json") => crate::map_file::save_map_json(path, rows, cols, cells),
        other => Err(FormatError::UnsupportedMapFormat(format!("{other:?}")).into()),
    }
}

//! Calibration map persistence.
//!
//! Two interchangeable representations of the same R×C factor grid:
//! a headerless CSV (one row per grid row) and a JSON 2-D array. The
//! loader dispatches on the file extension; anything else is rejected
//! up front rather than sniffed.

use std::path::Path;

use crate::FormatError;

/// A raw factor grid as read from disk: `(rows, cols, row-major cells)`.
///
/// Shape agreement with the deployment's frame shape is the engine's
/// concern, not this loader's; here we only enforce rectangularity and
/// positive finite cells.
pub type MapGrid = (usize, usize, Vec<f64>);

fn check_cell(v: f64, row: usize, col: usize) -> Result<f64, FormatError> {
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(FormatError::BadMapCell { row, col })
    }
}

/// Load a factor grid from a headerless CSV of floats.
pub fn load_map_csv(path: &Path) -> eyre::Result<MapGrid> {
    // flexible so ragged rows reach the typed length check below instead
    // of erroring inside the reader
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration map CSV {:?}: {}", path, e))?;

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
            let v: f64 = field
                .trim()
                .parse()
                .map_err(|_| FormatError::BadMapCell {
                    row: row_idx,
                    col: col_idx,
                })?;
            cells.push(check_cell(v, row_idx, col_idx)?);
        }
        rows += 1;
    }
    if rows == 0 || cols == 0 {
        eyre::bail!("calibration map CSV {:?} is empty", path);
    }
    Ok((rows, cols, cells))
}

/// Load a factor grid from a JSON 2-D array.
pub fn load_map_json(path: &Path) -> eyre::Result<MapGrid> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read calibration map {:?}: {}", path, e))?;
    let grid: Vec<Vec<f64>> = serde_json::from_str(&text)
        .map_err(|e| eyre::eyre!("parse calibration map {:?}: {}", path, e))?;
    let rows = grid.len();
    let cols = grid.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        eyre::bail!("calibration map {:?} is empty", path);
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
            cells.push(check_cell(v, row_idx, col_idx)?);
        }
    }
    Ok((rows, cols, cells))
}

/// Load a factor grid, dispatching on the file extension.
pub fn load_map(path: &Path) -> eyre::Result<MapGrid> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => load_map_csv(path),
        Some("json") => load_map_json(path),
        other => Err(FormatError::UnsupportedMapFormat(format!("{other:?}")).into()),
    }
}

/// Save a factor grid, dispatching on the file extension.
pub fn save_map(path: &Path, rows: usize, cols: usize, cells: &[f64]) -> eyre::Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => save_map_csv(path, rows, cols, cells),
        Some("json") => save_map_json(path, rows, cols, cells),
        other => Err(FormatError::UnsupportedMapFormat(format!("{other:?}")).into()),
    }
}

/// Save a factor grid as headerless CSV.
pub fn save_map_csv(path: &Path, rows: usize, cols: usize, cells: &[f64]) -> eyre::Result<()> {
    if cells.len() != rows * cols {
        eyre::bail!(
            "map grid has {} cells, expected {}x{}",
            cells.len(),
            rows,
            cols
        );
    }
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| eyre::eyre!("create calibration map CSV {:?}: {}", path, e))?;
    for r in 0..rows {
        let row: Vec<String> = cells[r * cols..(r + 1) * cols]
            .iter()
            .map(|v| format!("{v}"))
            .collect();
        wtr.write_record(&row)
            .map_err(|e| eyre::eyre!("write CSV row {}: {}", r, e))?;
    }
    wtr.flush()
        .map_err(|e| eyre::eyre!("flush calibration map CSV {:?}: {}", path, e))?;
    Ok(())
}

/// Save a factor grid as a JSON 2-D array.
pub fn save_map_json(path: &Path, rows: usize, cols: usize, cells: &[f64]) -> eyre::Result<()> {
    if cells.len() != rows * cols {
        eyre::bail!(
            "map grid has {} cells, expected {}x{}",
            cells.len(),
            rows,
            cols
        );
    }
    let grid: Vec<&[f64]> = (0..rows).map(|r| &cells[r * cols..(r + 1) * cols]).collect();
    let text = serde_json::to_string(&grid)
        .map_err(|e| eyre::eyre!("serialize calibration map: {}", e))?;
    std::fs::write(path, text)
        .map_err(|e| eyre::eyre!("write calibration map {:?}: {}", path, e))?;
    Ok(())
}

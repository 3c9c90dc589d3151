//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use padcal_config::FormatError;
    use padcal_core::CalError;

    // Typed matches first
    if let Some(ce) = err.downcast_ref::<CalError>() {
        return match ce {
            CalError::ShapeMismatch { context, expected, got } => format!(
                "What happened: A {}x{} grid was given where {}x{} was expected ({context}).\nLikely causes: Frame, map, and configured grid dimensions disagree.\nHow to fix: Check grid.rows/grid.cols in the config and regenerate the map for this sensor.",
                got.0, got.1, expected.0, expected.1
            ),
            CalError::UnknownPosition(id) => format!(
                "What happened: Position {id:?} is not in the registry.\nLikely causes: Typo in the id, or the registry file is older than expected.\nHow to fix: Run `padcal registry summary <file>` to list valid ids."
            ),
            CalError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
            CalError::Io(msg) => format!(
                "What happened: I/O failure ({msg}).\nLikely causes: Missing file, bad path, or permissions.\nHow to fix: Check the path and rerun."
            ),
        };
    }

    if let Some(fe) = err.downcast_ref::<FormatError>() {
        return match fe {
            FormatError::MalformedRegistry(msg) => format!(
                "What happened: The registry JSON could not be parsed ({msg}).\nLikely causes: Truncated file or hand-edit gone wrong.\nHow to fix: Validate the JSON and compare against a known-good registry."
            ),
            FormatError::InvalidValue(msg) => format!(
                "What happened: A registry value is out of range ({msg}).\nLikely causes: r_squared outside [0,1], non-finite numbers, or a bad threshold.\nHow to fix: Correct the offending value in the registry file."
            ),
            FormatError::RaggedMap { row, got, expected } => format!(
                "What happened: Grid row {row} has {got} columns, expected {expected}.\nLikely causes: A truncated or hand-edited row.\nHow to fix: Make every row the same length and reload."
            ),
            FormatError::BadMapCell { row, col } => format!(
                "What happened: Map cell ({row},{col}) is not a positive finite number.\nLikely causes: Zero, negative, or non-numeric factor.\nHow to fix: Correction factors must be > 0; regenerate the map."
            ),
            FormatError::BadFrameCell { row, col } => format!(
                "What happened: Frame cell ({row},{col}) is not a finite non-negative number.\nLikely causes: Corrupt capture or wrong file given as a frame.\nHow to fix: Re-capture the frame or fix the offending cell."
            ),
            FormatError::UnsupportedMapFormat(ext) => format!(
                "What happened: Unsupported file extension {ext}.\nLikely causes: Only .csv and .json grids are understood.\nHow to fix: Convert the file or rename it to match its contents."
            ),
            FormatError::MalformedConsistency(msg) => format!(
                "What happened: The consistency document could not be parsed ({msg}).\nLikely causes: Truncated export or schema drift.\nHow to fix: Re-export the document from the analysis tooling."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per error family; unknown errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use padcal_config::FormatError;
    use padcal_core::CalError;
    if let Some(ce) = err.downcast_ref::<CalError>() {
        return match ce {
            CalError::ShapeMismatch { .. } => 2,
            CalError::UnknownPosition(_) => 3,
            CalError::Config(_) => 4,
            CalError::Io(_) => 5,
        };
    }
    if err.downcast_ref::<FormatError>().is_some() {
        return 6;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({
        "error": err.to_string(),
        "detail": humanize(err),
        "exit_code": exit_code_for_error(err),
    })
    .to_string()
}

//! Dataset loading.
//!
//! The file is checked structurally with the `csv` reader first (header
//! present, unique column names, every record the same width as the header)
//! and only then handed to polars for type inference. Polars pads short rows
//! with nulls, which would hide a ragged file.

use crate::error::{AnalysisError, Result, ResultExt};
use polars::prelude::*;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Load a comma-delimited file with a header row.
///
/// # Errors
///
/// Returns [`AnalysisError::Parse`] if the file cannot be read, has no
/// header, repeats a column name, or has a record whose field count differs
/// from the header.
pub fn load(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    info!("Loading dataset from: {}", path.display());

    let bytes = std::fs::read(path).map_err(|e| {
        AnalysisError::Parse(format!("cannot read '{}': {}", path.display(), e))
    })?;

    load_from_bytes(bytes).context(format!("Loading {}", path.display()))
}

/// Parse an in-memory CSV buffer.
pub fn load_from_bytes(bytes: Vec<u8>) -> Result<DataFrame> {
    let records = validate_structure(&bytes)?;
    debug!("CSV structure valid: {} records", records);

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| AnalysisError::Parse(e.to_string()))?;

    info!("Dataset loaded successfully: {:?}", df.shape());
    Ok(df)
}

/// Check the header and record widths, returning the record count.
fn validate_structure(bytes: &[u8]) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let headers = reader.headers().map_err(csv_parse_error)?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AnalysisError::Parse("missing header row".to_string()));
    }

    let mut seen = HashSet::new();
    for header in headers.iter() {
        if !seen.insert(header) {
            return Err(AnalysisError::Parse(format!(
                "duplicate column name '{}'",
                header
            )));
        }
    }

    let mut records = 0;
    for record in reader.records() {
        record.map_err(csv_parse_error)?;
        records += 1;
    }
    Ok(records)
}

fn csv_parse_error(err: csv::Error) -> AnalysisError {
    match err.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => {
            let line = pos.as_ref().map(|p| p.line()).unwrap_or_default();
            AnalysisError::Parse(format!(
                "record on line {} has {} fields, expected {}",
                line, len, expected_len
            ))
        }
        _ => AnalysisError::Parse(err.to_string()),
    }
}

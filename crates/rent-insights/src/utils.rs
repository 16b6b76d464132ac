//! Shared column-access helpers.
//!
//! Every operation in the crate reads columns through these functions so that
//! unknown columns and non-numeric columns are reported the same way.

use crate::error::{AnalysisError, Result, ResultExt};
use polars::prelude::*;

/// Label used for correlations that could not be computed.
pub const UNDEFINED_LABEL: &str = "n/a";

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Names of all numeric columns, in schema order.
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

/// Look up a column, mapping absence to [`AnalysisError::InvalidArgument`].
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| AnalysisError::column_not_found(name))
}

/// Read a numeric column as `f64` values.
///
/// Nulls and NaNs both come back as `None`. A non-numeric column is an
/// invalid argument rather than a cast failure.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let col = require_column(df, name)?;
    if !is_numeric_dtype(col.dtype()) {
        return Err(AnalysisError::InvalidArgument(format!(
            "column '{}' is not numeric (dtype {:?})",
            name,
            col.dtype()
        )));
    }

    let float_series = col.as_materialized_series().cast(&DataType::Float64)?;
    let values = float_series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|val| !val.is_nan()))
        .collect();
    Ok(values)
}

/// Read any column as optional strings.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let col = require_column(df, name)?;
    let str_series = col.as_materialized_series().cast(&DataType::String)?;
    let values = str_series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

/// Keep the rows whose mask entry is `true`, returning a new frame.
pub fn filter_by_mask(df: &DataFrame, mask: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("mask".into(), mask);
    df.filter(&mask).context("Filtering rows by mask")
}

/// Display label for a coefficient, rounded to two decimals.
pub fn format_label(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => UNDEFINED_LABEL.to_string(),
    }
}

use crate::error::{AnalysisError, Result};
use crate::types::{ColumnExtent, ConsistencyCheck};
use crate::utils::numeric_values;
use polars::prelude::*;

/// Compare `total_column` against the sum of `part_columns`, row by row.
///
/// Only observes; nothing is removed or corrected. Rows missing any of the
/// involved values are not checked.
pub fn total_consistency(
    df: &DataFrame,
    part_columns: &[String],
    total_column: &str,
    tolerance: f64,
) -> Result<ConsistencyCheck> {
    if part_columns.is_empty() {
        return Err(AnalysisError::InvalidArgument(
            "consistency check needs at least one part column".to_string(),
        ));
    }
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(AnalysisError::InvalidArgument(format!(
            "tolerance must be a non-negative number, got {}",
            tolerance
        )));
    }

    let totals = numeric_values(df, total_column)?;
    let parts: Vec<Vec<Option<f64>>> = part_columns
        .iter()
        .map(|c| numeric_values(df, c))
        .collect::<Result<_>>()?;

    let mut rows_checked = 0;
    let mut rows_inconsistent = 0;
    let mut max_deviation: f64 = 0.0;

    for (row, total) in totals.iter().enumerate() {
        let Some(total) = total else { continue };
        let sum: Option<f64> = parts.iter().map(|p| p[row]).sum();
        let Some(sum) = sum else { continue };

        rows_checked += 1;
        let deviation = (total - sum).abs();
        max_deviation = max_deviation.max(deviation);
        if deviation > tolerance {
            rows_inconsistent += 1;
        }
    }

    Ok(ConsistencyCheck {
        total_column: total_column.to_string(),
        part_columns: part_columns.to_vec(),
        tolerance,
        rows_checked,
        rows_inconsistent,
        max_deviation,
    })
}

/// Minimum and maximum of a numeric column; `None` if it has no values.
pub fn column_extent(df: &DataFrame, column: &str) -> Result<Option<ColumnExtent>> {
    let extent = numeric_values(df, column)?
        .into_iter()
        .flatten()
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        });

    Ok(extent.map(|(min, max)| ColumnExtent {
        column: column.to_string(),
        min,
        max,
    }))
}

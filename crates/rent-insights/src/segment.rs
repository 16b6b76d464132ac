//! Selection-driven segments.
//!
//! A [`Selection`] is what an interactive control produces: a dropdown value,
//! a brushed interval, or a set of clicked bars. Selections are translated
//! into ordinary row filters and applied one after another; they never feed
//! back into the outlier pipeline.

use crate::error::{AnalysisError, Result};
use crate::pipeline::filter::{Bound, ThresholdFilter, filter_threshold};
use crate::summary::mean_by_category;
use crate::types::CategoryMean;
use crate::utils::{filter_by_mask, numeric_values, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One user selection over a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    /// Categorical value must match exactly.
    Equals { column: String, value: String },
    /// Numeric value must lie in `[min, max]`.
    Range { column: String, min: f64, max: f64 },
    /// Numeric value must be one of `values`; an empty set selects everything.
    OneOf { column: String, values: Vec<f64> },
}

impl Selection {
    pub fn column(&self) -> &str {
        match self {
            Selection::Equals { column, .. }
            | Selection::Range { column, .. }
            | Selection::OneOf { column, .. } => column,
        }
    }

    fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            Selection::Equals { column, value } => {
                let mask: Vec<bool> = string_values(df, column)?
                    .iter()
                    .map(|v| v.as_deref() == Some(value.as_str()))
                    .collect();
                filter_by_mask(df, &mask)
            }
            Selection::Range { column, min, max } => {
                let filter = ThresholdFilter::new(
                    column.clone(),
                    Bound::Between {
                        min: *min,
                        max: *max,
                    },
                );
                filter.validate().map_err(AnalysisError::InvalidArgument)?;
                Ok(filter.apply(df)?.0)
            }
            Selection::OneOf { column, values } => {
                if values.is_empty() {
                    // still reject unknown columns
                    numeric_values(df, column)?;
                    return Ok(df.clone());
                }
                filter_threshold(df, column, |v| values.contains(&v))
            }
        }
    }
}

/// Apply selections in order, returning the matching rows.
pub fn apply_selections(df: &DataFrame, selections: &[Selection]) -> Result<DataFrame> {
    let mut current = df.clone();
    for selection in selections {
        let before = current.height();
        current = selection.apply(&current)?;
        debug!(
            "Selection on '{}': {} -> {} rows",
            selection.column(),
            before,
            current.height()
        );
    }
    Ok(current)
}

/// Per-city view of one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentComparison {
    /// Rows in the segment.
    pub rows: usize,
    /// Mean of the value column over the whole segment.
    pub overall_mean: Option<f64>,
    /// Per-city means, ascending.
    pub cities: Vec<CategoryMean>,
}

/// Compare cities inside the segment described by `selections`.
pub fn compare_cities(
    df: &DataFrame,
    city_column: &str,
    value_column: &str,
    selections: &[Selection],
) -> Result<SegmentComparison> {
    let segment = apply_selections(df, selections)?;
    let cities = mean_by_category(&segment, city_column, value_column)?;

    let values: Vec<f64> = numeric_values(&segment, value_column)?
        .into_iter()
        .flatten()
        .collect();
    let overall_mean = if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    };

    Ok(SegmentComparison {
        rows: segment.height(),
        overall_mean,
        cities,
    })
}

//! Row filtering.
//!
//! Every function here returns a new `DataFrame`; the input is never
//! touched. Rows whose value in the filtered column is missing never satisfy
//! a predicate and are dropped.

use crate::error::{AnalysisError, Result};
use crate::types::FilterStep;
use crate::utils::{filter_by_mask, numeric_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Keep only the rows where `predicate(row[column])` holds.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidArgument`] if the column does not exist
/// or is not numeric.
pub fn filter_threshold<P>(df: &DataFrame, column: &str, predicate: P) -> Result<DataFrame>
where
    P: Fn(f64) -> bool,
{
    let values = numeric_values(df, column)?;
    let mask: Vec<bool> = values
        .iter()
        .map(|v| v.map(&predicate).unwrap_or(false))
        .collect();
    filter_by_mask(df, &mask)
}

/// A numeric bound a value must satisfy to be kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// `value <= limit`
    AtMost(f64),
    /// `value < limit`
    Below(f64),
    /// `value >= limit`
    AtLeast(f64),
    /// `value > limit`
    Above(f64),
    /// `min <= value <= max`
    Between { min: f64, max: f64 },
}

impl Bound {
    /// Check whether a value satisfies the bound.
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Bound::AtMost(limit) => value <= limit,
            Bound::Below(limit) => value < limit,
            Bound::AtLeast(limit) => value >= limit,
            Bound::Above(limit) => value > limit,
            Bound::Between { min, max } => value >= min && value <= max,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match *self {
            Bound::AtMost(v) | Bound::Below(v) | Bound::AtLeast(v) | Bound::Above(v) => {
                if v.is_finite() {
                    Ok(())
                } else {
                    Err(format!("bound limit must be finite, got {}", v))
                }
            }
            Bound::Between { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    Err(format!("range bounds must be finite, got [{}, {}]", min, max))
                } else if min > max {
                    Err(format!("range minimum {} exceeds maximum {}", min, max))
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::AtMost(v) => write!(f, "<= {}", v),
            Bound::Below(v) => write!(f, "< {}", v),
            Bound::AtLeast(v) => write!(f, ">= {}", v),
            Bound::Above(v) => write!(f, "> {}", v),
            Bound::Between { min, max } => write!(f, "in [{}, {}]", min, max),
        }
    }
}

/// A named bound on one column, usable as a configured outlier cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdFilter {
    pub column: String,
    pub bound: Bound,
}

impl ThresholdFilter {
    pub fn new(column: impl Into<String>, bound: Bound) -> Self {
        Self {
            column: column.into(),
            bound,
        }
    }

    /// Drop rows whose value exceeds `limit`.
    pub fn at_most(column: impl Into<String>, limit: f64) -> Self {
        Self::new(column, Bound::AtMost(limit))
    }

    /// Check the filter is well-formed without looking at any data.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.column.trim().is_empty() {
            return Err("filter column name is empty".to_string());
        }
        self.bound.validate()
    }

    /// Apply the filter, returning the reduced frame and a record of the pass.
    pub fn apply(&self, df: &DataFrame) -> Result<(DataFrame, FilterStep)> {
        self.validate().map_err(AnalysisError::InvalidArgument)?;

        let rows_before = df.height();
        let filtered = filter_threshold(df, &self.column, |v| self.bound.contains(v))?;
        let step = FilterStep {
            column: self.column.clone(),
            bound: self.bound,
            rows_before,
            rows_after: filtered.height(),
        };

        debug!(
            "Filter '{}' {}: {} -> {} rows",
            self.column,
            self.bound,
            rows_before,
            step.rows_after
        );
        Ok((filtered, step))
    }
}

impl fmt::Display for ThresholdFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.bound)
    }
}

/// An ordered sequence of independent filtering passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterChain {
    filters: Vec<ThresholdFilter>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pass to the end of the chain.
    pub fn then(mut self, filter: ThresholdFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(&self) -> &[ThresholdFilter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every pass in order, each on the output of the previous one.
    pub fn apply(&self, df: &DataFrame) -> Result<(DataFrame, Vec<FilterStep>)> {
        let mut current = df.clone();
        let mut steps = Vec::with_capacity(self.filters.len());

        for filter in &self.filters {
            let (next, step) = filter.apply(&current)?;
            if step.rows_removed() > 0 {
                info!(
                    "Removed {} rows where {} does not hold",
                    step.rows_removed(),
                    filter
                );
            }
            steps.push(step);
            current = next;
        }

        Ok((current, steps))
    }
}

impl From<Vec<ThresholdFilter>> for FilterChain {
    fn from(filters: Vec<ThresholdFilter>) -> Self {
        Self { filters }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(df: &DataFrame) -> Vec<f64> {
        numeric_values(df, "total (R$)")
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn test_filter_threshold_drops_total_outlier() {
        let df = df!["total (R$)" => [1000.0, 2000.0, 35000.0, 3000.0]].unwrap();

        let filtered = filter_threshold(&df, "total (R$)", |v| v <= 32000.0).unwrap();

        assert_eq!(filtered.height(), 3);
        assert_eq!(totals(&filtered), vec![1000.0, 2000.0, 3000.0]);
    }

    #[test]
    fn test_filter_threshold_drops_area_outlier() {
        let df = df!["area" => [50i64, 100, 1500, 80]].unwrap();

        let filtered = filter_threshold(&df, "area", |v| v <= 1100.0).unwrap();

        let areas: Vec<f64> = numeric_values(&filtered, "area")
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(areas, vec![50.0, 100.0, 80.0]);
    }

    #[test]
    fn test_filter_threshold_does_not_mutate_input() {
        let df = df!["total (R$)" => [1000.0, 35000.0]].unwrap();
        let _ = filter_threshold(&df, "total (R$)", |v| v <= 32000.0).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_filter_threshold_keeps_other_columns_aligned() {
        let df = df![
            "city" => ["São Paulo", "Rio de Janeiro", "Campinas"],
            "total (R$)" => [5618.0, 40000.0, 1300.0],
        ]
        .unwrap();

        let filtered = filter_threshold(&df, "total (R$)", |v| v <= 32000.0).unwrap();

        let cities = crate::utils::string_values(&filtered, "city").unwrap();
        assert_eq!(
            cities,
            vec![Some("São Paulo".to_string()), Some("Campinas".to_string())]
        );
    }

    #[test]
    fn test_filter_threshold_drops_missing_values() {
        let df = df!["area" => [Some(50.0), None, Some(80.0)]].unwrap();
        let filtered = filter_threshold(&df, "area", |v| v <= 1100.0).unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn test_filter_threshold_unknown_column() {
        let df = df!["area" => [50.0]].unwrap();
        let err = filter_threshold(&df, "size", |v| v <= 1.0).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_filter_threshold_to_empty_is_valid() {
        let df = df!["area" => [5000.0, 6000.0]].unwrap();
        let filtered = filter_threshold(&df, "area", |v| v <= 1100.0).unwrap();
        assert_eq!(filtered.height(), 0);
        assert_eq!(filtered.width(), 1);
    }

    #[test]
    fn test_bound_contains() {
        assert!(Bound::AtMost(10.0).contains(10.0));
        assert!(!Bound::Below(10.0).contains(10.0));
        assert!(Bound::AtLeast(10.0).contains(10.0));
        assert!(!Bound::Above(10.0).contains(10.0));
        let range = Bound::Between { min: 0.0, max: 100.0 };
        assert!(range.contains(0.0) && range.contains(100.0));
        assert!(!range.contains(100.5));
    }

    #[test]
    fn test_threshold_filter_rejects_inverted_range() {
        let filter = ThresholdFilter::new("area", Bound::Between { min: 10.0, max: 1.0 });
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_chain_applies_passes_in_order() {
        let df = df![
            "area" => [50.0, 3000.0, 1500.0, 80.0, 900.0],
            "total (R$)" => [1000.0, 2000.0, 3000.0, 35000.0, 4000.0],
        ]
        .unwrap();

        let chain = FilterChain::new()
            .then(ThresholdFilter::at_most("total (R$)", 32000.0))
            .then(ThresholdFilter::at_most("area", 2000.0))
            .then(ThresholdFilter::at_most("area", 1100.0));

        let (filtered, steps) = chain.apply(&df).unwrap();

        assert_eq!(filtered.height(), 2);
        assert_eq!(totals(&filtered), vec![1000.0, 4000.0]);
        let removed: Vec<usize> = steps.iter().map(|s| s.rows_removed()).collect();
        assert_eq!(removed, vec![1, 1, 1]);
        assert_eq!(steps[0].rows_before, 5);
        assert_eq!(steps[2].rows_after, 2);
    }

    #[test]
    fn test_bound_json_shape() {
        let filter = ThresholdFilter::at_most("area", 1100.0);
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["bound"]["at_most"], 1100.0);

        let parsed: ThresholdFilter = serde_json::from_str(
            r#"{"column": "area", "bound": {"between": {"min": 0.0, "max": 100.0}}}"#,
        )
        .unwrap();
        assert_eq!(parsed.bound, Bound::Between { min: 0.0, max: 100.0 });
    }
}

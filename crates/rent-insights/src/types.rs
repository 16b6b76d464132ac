use crate::error::UndefinedCorrelation;
use crate::pipeline::filter::Bound;
use serde::{Deserialize, Serialize};

/// One cell of the long-form correlation table.
///
/// `correlation` is `None` when the pair is undefined; the reason is kept in
/// `undefined_reason` and the label reads `"n/a"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationEntry {
    pub variable_a: String,
    pub variable_b: String,
    pub correlation: Option<f64>,
    /// Coefficient rounded to two decimals, for display.
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undefined_reason: Option<UndefinedCorrelation>,
}

/// Record of one filtering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterStep {
    pub column: String,
    pub bound: Bound,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl FilterStep {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Number of rows carrying one value of a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

/// Mean of a numeric column within one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMean {
    pub value: String,
    pub mean: f64,
    pub count: usize,
}

/// Observed range of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnExtent {
    pub column: String,
    pub min: f64,
    pub max: f64,
}

/// Outcome of comparing a total column against the sum of its parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyCheck {
    pub total_column: String,
    pub part_columns: Vec<String>,
    pub tolerance: f64,
    /// Rows with every involved value present.
    pub rows_checked: usize,
    /// Rows where `|total - sum(parts)| > tolerance`.
    pub rows_inconsistent: usize,
    pub max_deviation: f64,
}

impl ConsistencyCheck {
    pub fn inconsistent_percentage(&self) -> f64 {
        if self.rows_checked == 0 {
            0.0
        } else {
            (self.rows_inconsistent as f64 / self.rows_checked as f64) * 100.0
        }
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_removed: usize,
    pub columns: usize,
    /// Columns the correlation matrix was computed over.
    pub correlation_columns: Vec<String>,
    /// Number of ordered pairs whose correlation is undefined.
    pub undefined_pairs: usize,
    pub warnings: Vec<String>,
}

impl AnalysisSummary {
    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Calculate the percentage of rows removed.
    pub fn rows_removed_percentage(&self) -> f64 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_removed as f64 / self.rows_before as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_step_rows_removed() {
        let step = FilterStep {
            column: "total (R$)".to_string(),
            bound: Bound::AtMost(32000.0),
            rows_before: 10692,
            rows_after: 10685,
        };
        assert_eq!(step.rows_removed(), 7);
    }

    #[test]
    fn test_rows_removed_percentage() {
        let summary = AnalysisSummary {
            rows_before: 200,
            rows_after: 150,
            rows_removed: 50,
            ..Default::default()
        };
        assert_eq!(summary.rows_removed_percentage(), 25.0);
        assert_eq!(AnalysisSummary::default().rows_removed_percentage(), 0.0);
    }

    #[test]
    fn test_correlation_entry_skips_missing_reason() {
        let entry = CorrelationEntry {
            variable_a: "area".to_string(),
            variable_b: "rooms".to_string(),
            correlation: Some(0.19),
            label: "0.19".to_string(),
            undefined_reason: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("undefined_reason"));
    }
}

//! Pairwise Pearson correlation.
//!
//! Coefficients are computed over pairwise-complete rows: a row counts for
//! the pair (A, B) only if both A and B are present. A pair whose columns
//! have zero variance over those rows, or that has fewer than two such rows,
//! is reported as [`UndefinedCorrelation`] instead of NaN.

use crate::error::{AnalysisError, Result, UndefinedCorrelation};
use crate::types::CorrelationEntry;
use crate::utils::{format_label, numeric_column_names, numeric_values};
use polars::prelude::cov::pearson_corr;
use polars::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Coefficient of one ordered pair.
pub type Coefficient = std::result::Result<f64, UndefinedCorrelation>;

/// Square matrix of coefficients, indexed by column position.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    columns: Vec<String>,
    // Row-major, columns.len() squared.
    cells: Vec<Coefficient>,
}

impl CorrelationMatrix {
    /// Column names in the order the matrix was requested.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Coefficient for `(a, b)`, or `None` if either column is not in the matrix.
    pub fn get(&self, a: &str, b: &str) -> Option<&Coefficient> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        self.cells.get(i * self.columns.len() + j)
    }

    /// Iterate all ordered pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Coefficient)> {
        let n = self.columns.len();
        self.cells.iter().enumerate().map(move |(idx, coef)| {
            (
                self.columns[idx / n].as_str(),
                self.columns[idx % n].as_str(),
                coef,
            )
        })
    }

    /// Number of ordered pairs whose coefficient is undefined.
    pub fn undefined_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_err()).count()
    }

    /// Coefficients of every other column against `target`, strongest first.
    ///
    /// Sorted by descending absolute value; undefined pairs go last in
    /// column order.
    pub fn ranked_against(&self, target: &str) -> Result<Vec<CorrelationEntry>> {
        if self.index_of(target).is_none() {
            return Err(AnalysisError::InvalidArgument(format!(
                "column '{}' is not part of the correlation matrix",
                target
            )));
        }

        let mut ranked: Vec<CorrelationEntry> = self
            .columns
            .iter()
            .filter(|c| c.as_str() != target)
            .filter_map(|c| self.get(c, target).map(|coef| entry(c, target, coef)))
            .collect();

        ranked.sort_by(|x, y| match (x.correlation, y.correlation) {
            (Some(a), Some(b)) => b.abs().partial_cmp(&a.abs()).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Ok(ranked)
    }
}

/// Compute the Pearson coefficient for every ordered pair of `columns`.
///
/// Self-pairs are exactly 1.0 for columns with nonzero variance. The result
/// is symmetric: each unordered pair is computed once and mirrored.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidArgument`] if `columns` is empty or
/// names a column that is missing or not numeric.
pub fn correlation_matrix(df: &DataFrame, columns: &[String]) -> Result<CorrelationMatrix> {
    if columns.is_empty() {
        return Err(AnalysisError::InvalidArgument(
            "correlation requires at least one numeric column".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    if let Some(repeated) = columns.iter().find(|c| !seen.insert(c.as_str())) {
        return Err(AnalysisError::InvalidArgument(format!(
            "column '{}' is listed more than once",
            repeated
        )));
    }

    let values: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|c| numeric_values(df, c))
        .collect::<Result<_>>()?;

    let n = columns.len();
    let mut cells: Vec<Coefficient> = vec![Ok(0.0); n * n];

    for i in 0..n {
        for j in i..n {
            let coef = pearson(&columns[i], &values[i], &columns[j], &values[j]);
            if let Err(reason) = &coef {
                debug!("Correlation undefined: {}", reason);
            }
            cells[j * n + i] = coef.clone();
            cells[i * n + j] = coef;
        }
    }

    let matrix = CorrelationMatrix {
        columns: columns.to_vec(),
        cells,
    };

    let undefined = matrix.undefined_count();
    if undefined > 0 {
        warn!(
            "{} of {} correlation pairs are undefined",
            undefined,
            n * n
        );
    }
    Ok(matrix)
}

/// Correlation matrix over every numeric column of the frame.
pub fn numeric_correlation_matrix(df: &DataFrame) -> Result<CorrelationMatrix> {
    correlation_matrix(df, &numeric_column_names(df))
}

/// Flatten a matrix into `(A, B, coefficient, label)` rows.
///
/// Produces `n * n` entries in row-major order with no duplicate pairs.
pub fn to_long_form(matrix: &CorrelationMatrix) -> Vec<CorrelationEntry> {
    matrix.iter().map(|(a, b, coef)| entry(a, b, coef)).collect()
}

/// Numeric columns other than `target`, in schema order.
pub fn feature_columns(df: &DataFrame, target: &str) -> Vec<String> {
    numeric_column_names(df)
        .into_iter()
        .filter(|c| c != target)
        .collect()
}

fn entry(a: &str, b: &str, coef: &Coefficient) -> CorrelationEntry {
    let correlation = coef.as_ref().ok().copied();
    CorrelationEntry {
        variable_a: a.to_string(),
        variable_b: b.to_string(),
        correlation,
        label: format_label(correlation),
        undefined_reason: coef.as_ref().err().cloned(),
    }
}

/// Pearson coefficient over the rows where both columns are present.
///
/// Constancy is decided from the values themselves, so a fractional constant
/// whose computed mean is off by rounding is still zero variance.
fn pearson(name_a: &str, a: &[Option<f64>], name_b: &str, b: &[Option<f64>]) -> Coefficient {
    let (x, y): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();

    let n = x.len();
    if n < 2 {
        return Err(UndefinedCorrelation::InsufficientData {
            column_a: name_a.to_string(),
            column_b: name_b.to_string(),
            observations: n,
        });
    }

    if is_constant(&x) {
        return Err(UndefinedCorrelation::ZeroVariance {
            column: name_a.to_string(),
        });
    }
    if is_constant(&y) {
        return Err(UndefinedCorrelation::ZeroVariance {
            column: name_b.to_string(),
        });
    }

    if name_a == name_b {
        return Ok(1.0);
    }

    let x = Float64Chunked::from_vec(name_a.into(), x);
    let y = Float64Chunked::from_vec(name_b.into(), y);
    match pearson_corr(&x, &y) {
        Some(r) if r.is_finite() => Ok(r.clamp(-1.0, 1.0)),
        // distinct values whose spread underflows
        _ => Err(UndefinedCorrelation::ZeroVariance {
            column: name_a.to_string(),
        }),
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.first().is_none_or(|first| values.iter().all(|v| v == first))
}

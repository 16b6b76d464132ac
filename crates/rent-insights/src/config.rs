//! Configuration types for the analysis pipeline.
//!
//! Outlier cutoffs are plain configuration: the defaults reproduce the cuts
//! chosen by inspection for the rental dataset, and any caller can replace
//! them.

use crate::error::{AnalysisError, Result};
use crate::listing::columns;
use crate::pipeline::filter::ThresholdFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default cutoff on total rent.
pub const DEFAULT_MAX_TOTAL: f64 = 32000.0;

/// Default area cutoffs, applied in order.
pub const DEFAULT_MAX_AREAS: [f64; 2] = [2000.0, 1100.0];

/// The cutoffs used when none are configured.
pub fn default_outlier_cutoffs() -> Vec<ThresholdFilter> {
    let mut cutoffs = vec![ThresholdFilter::at_most(columns::TOTAL, DEFAULT_MAX_TOTAL)];
    cutoffs.extend(
        DEFAULT_MAX_AREAS
            .iter()
            .map(|&limit| ThresholdFilter::at_most(columns::AREA, limit)),
    );
    cutoffs
}

/// Configuration for the analysis pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use rent_insights::config::PipelineConfig;
/// use rent_insights::pipeline::ThresholdFilter;
///
/// let config = PipelineConfig::builder()
///     .outlier_cutoffs(vec![ThresholdFilter::at_most("total (R$)", 20000.0)])
///     .target_column("total (R$)")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Filters applied in order before any analysis.
    /// Default: total (R$) <= 32000, area <= 2000, area <= 1100
    pub outlier_cutoffs: Vec<ThresholdFilter>,

    /// Columns to correlate. `None` means every numeric column.
    /// Default: None
    pub correlation_columns: Option<Vec<String>>,

    /// Column the features are ranked against.
    /// Default: "total (R$)"
    pub target_column: String,

    /// Categorical column used for the per-city summaries.
    /// Default: "city"
    pub city_column: String,

    /// Allowed absolute gap between total and the sum of its parts.
    /// Default: 1.0
    pub consistency_tolerance: f64,

    /// Output directory for exported files.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// Base name for exported files. If None, derived from the input file.
    /// Default: None
    pub output_name: Option<String>,

    /// Whether to export the cleaned data, correlations and report to disk.
    /// Default: false
    pub save_to_disk: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            outlier_cutoffs: default_outlier_cutoffs(),
            correlation_columns: None,
            target_column: columns::TOTAL.to_string(),
            city_column: columns::CITY.to_string(),
            consistency_tolerance: 1.0,
            output_dir: PathBuf::from("outputs"),
            output_name: None,
            save_to_disk: false,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config
            .validate()
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        for (index, cutoff) in self.outlier_cutoffs.iter().enumerate() {
            cutoff
                .validate()
                .map_err(|reason| ConfigValidationError::InvalidCutoff { index, reason })?;
        }

        if let Some(columns) = &self.correlation_columns {
            if columns.is_empty() {
                return Err(ConfigValidationError::EmptyCorrelationColumns);
            }
            if columns.iter().any(|c| c.trim().is_empty()) {
                return Err(ConfigValidationError::EmptyColumnName(
                    "correlation_columns".to_string(),
                ));
            }
            let mut seen = HashSet::new();
            if let Some(repeated) = columns.iter().find(|c| !seen.insert(c.as_str())) {
                return Err(ConfigValidationError::DuplicateCorrelationColumn(
                    repeated.clone(),
                ));
            }
        }

        if self.target_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyColumnName(
                "target_column".to_string(),
            ));
        }

        if self.city_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyColumnName(
                "city_column".to_string(),
            ));
        }

        if !self.consistency_tolerance.is_finite() || self.consistency_tolerance < 0.0 {
            return Err(ConfigValidationError::InvalidTolerance(
                self.consistency_tolerance,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid outlier cutoff #{index}: {reason}")]
    InvalidCutoff { index: usize, reason: String },

    #[error("correlation_columns is set but empty")]
    EmptyCorrelationColumns,

    #[error("correlation column '{0}' is listed more than once")]
    DuplicateCorrelationColumn(String),

    #[error("'{0}' must name a column")]
    EmptyColumnName(String),

    #[error("Invalid consistency tolerance: {0} (must be a non-negative number)")]
    InvalidTolerance(f64),
}

impl From<ConfigValidationError> for AnalysisError {
    fn from(err: ConfigValidationError) -> Self {
        AnalysisError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    outlier_cutoffs: Option<Vec<ThresholdFilter>>,
    correlation_columns: Option<Vec<String>>,
    target_column: Option<String>,
    city_column: Option<String>,
    consistency_tolerance: Option<f64>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    save_to_disk: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Replace the outlier cutoffs. An empty list disables filtering.
    pub fn outlier_cutoffs(mut self, cutoffs: Vec<ThresholdFilter>) -> Self {
        self.outlier_cutoffs = Some(cutoffs);
        self
    }

    /// Append one cutoff to the configured (or default) list.
    pub fn add_cutoff(mut self, cutoff: ThresholdFilter) -> Self {
        self.outlier_cutoffs
            .get_or_insert_with(default_outlier_cutoffs)
            .push(cutoff);
        self
    }

    /// Restrict the correlation matrix to these columns, in this order.
    pub fn correlation_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.correlation_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the column features are ranked against.
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Set the categorical column used for per-city summaries.
    pub fn city_column(mut self, column: impl Into<String>) -> Self {
        self.city_column = Some(column.into());
        self
    }

    /// Set the tolerance of the total-versus-parts check.
    pub fn consistency_tolerance(mut self, tolerance: f64) -> Self {
        self.consistency_tolerance = Some(tolerance);
        self
    }

    /// Set the output directory for exported files.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set a custom base name for exported files.
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Enable or disable exporting results to disk.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            outlier_cutoffs: self.outlier_cutoffs.unwrap_or(defaults.outlier_cutoffs),
            correlation_columns: self.correlation_columns,
            target_column: self.target_column.unwrap_or(defaults.target_column),
            city_column: self.city_column.unwrap_or(defaults.city_column),
            consistency_tolerance: self
                .consistency_tolerance
                .unwrap_or(defaults.consistency_tolerance),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_name: self.output_name,
            save_to_disk: self.save_to_disk.unwrap_or(defaults.save_to_disk),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::filter::Bound;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.outlier_cutoffs,
            vec![
                ThresholdFilter::at_most("total (R$)", 32000.0),
                ThresholdFilter::at_most("area", 2000.0),
                ThresholdFilter::at_most("area", 1100.0),
            ]
        );
        assert_eq!(config.target_column, "total (R$)");
        assert_eq!(config.city_column, "city");
        assert!(config.correlation_columns.is_none());
        assert!(!config.save_to_disk);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .outlier_cutoffs(vec![ThresholdFilter::at_most("area", 500.0)])
            .correlation_columns(["area", "total (R$)"])
            .consistency_tolerance(5.0)
            .save_to_disk(true)
            .build()
            .unwrap();

        assert_eq!(config.outlier_cutoffs.len(), 1);
        assert_eq!(
            config.correlation_columns,
            Some(vec!["area".to_string(), "total (R$)".to_string()])
        );
        assert_eq!(config.consistency_tolerance, 5.0);
        assert!(config.save_to_disk);
    }

    #[test]
    fn test_builder_add_cutoff_extends_defaults() {
        let config = PipelineConfig::builder()
            .add_cutoff(ThresholdFilter::at_most("rooms", 10.0))
            .build()
            .unwrap();
        assert_eq!(config.outlier_cutoffs.len(), 4);
        assert_eq!(config.outlier_cutoffs[3].column, "rooms");
    }

    #[test]
    fn test_validation_invalid_cutoff() {
        let result = PipelineConfig::builder()
            .outlier_cutoffs(vec![ThresholdFilter::new("area", Bound::AtMost(f64::NAN))])
            .build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidCutoff { index: 0, .. }
        ));
    }

    #[test]
    fn test_validation_empty_correlation_columns() {
        let result = PipelineConfig::builder()
            .correlation_columns(Vec::<String>::new())
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyCorrelationColumns
        ));
    }

    #[test]
    fn test_validation_repeated_correlation_column() {
        let result = PipelineConfig::builder()
            .correlation_columns(["area", "total (R$)", "area"])
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::DuplicateCorrelationColumn(column) if column == "area"
        ));
    }

    #[test]
    fn test_validation_negative_tolerance() {
        let result = PipelineConfig::builder().consistency_tolerance(-1.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidTolerance(_)
        ));
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{
            "outlier_cutoffs": [
                {"column": "total (R$)", "bound": {"at_most": 55000.0}}
            ],
            "target_column": "rent amount (R$)"
        }"#;

        let config: PipelineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.outlier_cutoffs,
            vec![ThresholdFilter::at_most("total (R$)", 55000.0)]
        );
        assert_eq!(config.target_column, "rent amount (R$)");
        assert_eq!(config.city_column, "city");
        assert_eq!(config.consistency_tolerance, 1.0);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}

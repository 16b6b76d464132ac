//! Main analysis pipeline module.
//!
//! This module provides the `Pipeline` struct and builder that compose the
//! individual steps: outlier cutoffs, correlation, per-city summaries and
//! the optional export.

use crate::config::PipelineConfig;
use crate::error::{AnalysisError, Result, ResultExt};
use crate::listing::{columns, monetary_part_columns};
use crate::loader;
use crate::pipeline::correlation::{CorrelationMatrix, correlation_matrix, to_long_form};
use crate::pipeline::filter::FilterChain;
use crate::reporting::{AnalysisReport, ExportedFiles, ReportGenerator};
use crate::summary::{
    column_extent, listings_per_city, mean_by_category, sorted_categories, total_consistency,
};
use crate::types::{
    AnalysisSummary, CategoryCount, CategoryMean, ColumnExtent, ConsistencyCheck, CorrelationEntry,
    FilterStep,
};
use crate::utils::numeric_column_names;
use polars::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

/// The analysis pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use rent_insights::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::default())
///     .build()?
///     .process_file("houses_to_rent_v2.csv")?;
///
/// for entry in &result.target_ranking {
///     println!("{} vs {}: {}", entry.variable_a, entry.variable_b, entry.label);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Rows that survived every outlier cutoff.
    pub cleaned: DataFrame,
    /// One record per cutoff, in the order applied.
    pub steps: Vec<FilterStep>,
    pub correlations: CorrelationMatrix,
    /// Long-form correlation table, row-major.
    pub long_form: Vec<CorrelationEntry>,
    /// Every other correlated column against the target, strongest first.
    pub target_ranking: Vec<CorrelationEntry>,
    /// Listings per city, ascending.
    pub listings_per_city: Vec<CategoryCount>,
    /// Mean target value per city, ascending.
    pub mean_target_by_city: Vec<CategoryMean>,
    /// Distinct cities in lexicographic order, the fixed category axis of the charts.
    pub city_domain: Vec<String>,
    /// Range of the target over the cleaned rows, the fixed value axis.
    pub target_extent: Option<ColumnExtent>,
    pub consistency: Option<ConsistencyCheck>,
    pub summary: AnalysisSummary,
    /// Files written when `save_to_disk` is set.
    pub exported: Option<ExportedFiles>,
}

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a CSV file and run the pipeline on it.
    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<PipelineResult> {
        let path = path.as_ref();
        let df = loader::load(path)?;
        let input_file = path.to_string_lossy();
        self.run(df, Some(input_file.as_ref()))
    }

    /// Run the pipeline on an already loaded frame.
    ///
    /// The frame is consumed; the cleaned result is a new frame.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        self.run(df, None)
    }

    fn run(&self, df: DataFrame, input_file: Option<&str>) -> Result<PipelineResult> {
        match self.process_internal(df, input_file) {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn process_internal(&self, df: DataFrame, input_file: Option<&str>) -> Result<PipelineResult> {
        let start = Instant::now();
        let config = &self.config;
        let mut summary = AnalysisSummary {
            rows_before: df.height(),
            ..Default::default()
        };

        info!("Starting analysis on {:?} dataset", df.shape());

        // Step 1: outlier cutoffs, each an independent pass
        let chain = FilterChain::from(config.outlier_cutoffs.clone());
        let (cleaned, steps) = chain.apply(&df).context("Applying outlier cutoffs")?;

        if cleaned.height() == 0 {
            summary.add_warning("Outlier cutoffs removed every row");
        }

        // Step 2: correlation matrix and long form
        let correlation_columns = config
            .correlation_columns
            .clone()
            .unwrap_or_else(|| numeric_column_names(&cleaned));
        let correlations = correlation_matrix(&cleaned, &correlation_columns)
            .context("Computing correlation matrix")?;
        let long_form = to_long_form(&correlations);

        let undefined_pairs = correlations.undefined_count();
        if undefined_pairs > 0 {
            summary.add_warning(format!(
                "{} correlation pairs are undefined",
                undefined_pairs
            ));
        }

        // Step 3: target ranking
        let target = config.target_column.as_str();
        let target_ranking = if correlations.columns().iter().any(|c| c == target) {
            correlations.ranked_against(target)?
        } else {
            summary.add_warning(format!(
                "Target column '{}' is not among the correlated columns",
                target
            ));
            Vec::new()
        };

        // Step 4: per-city summaries
        let (city_counts, city_means, city_domain) =
            self.city_summaries(&cleaned, &mut summary)?;
        let target_extent = if numeric_column_names(&cleaned).iter().any(|c| c == target) {
            column_extent(&cleaned, target)?
        } else {
            None
        };

        // Step 5: total-versus-parts observation
        let consistency = self.consistency_check(&cleaned, &mut summary)?;

        summary.rows_after = cleaned.height();
        summary.rows_removed = summary.rows_before.saturating_sub(summary.rows_after);
        summary.columns = cleaned.width();
        summary.correlation_columns = correlation_columns;
        summary.undefined_pairs = undefined_pairs;
        summary.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Analysis complete: {} -> {} rows, {} correlation pairs",
            summary.rows_before,
            summary.rows_after,
            long_form.len()
        );

        let mut result = PipelineResult {
            cleaned,
            steps,
            correlations,
            long_form,
            target_ranking,
            listings_per_city: city_counts,
            mean_target_by_city: city_means,
            city_domain,
            target_extent,
            consistency,
            summary,
            exported: None,
        };

        if config.save_to_disk {
            let generator =
                ReportGenerator::new(config.output_dir.clone(), config.output_name.clone());
            let report = AnalysisReport::from_result(&result, config, input_file);
            result.exported = Some(
                generator
                    .export(&result, &report, input_file)
                    .context("Exporting results")?,
            );
        }

        Ok(result)
    }

    fn city_summaries(
        &self,
        cleaned: &DataFrame,
        summary: &mut AnalysisSummary,
    ) -> Result<(Vec<CategoryCount>, Vec<CategoryMean>, Vec<String>)> {
        let city = self.config.city_column.as_str();
        let target = self.config.target_column.as_str();

        if cleaned.column(city).is_err() {
            summary.add_warning(format!(
                "City column '{}' not found; skipping per-city summaries",
                city
            ));
            return Ok((Vec::new(), Vec::new(), Vec::new()));
        }

        let counts = listings_per_city(cleaned, city)?;
        let means = if numeric_column_names(cleaned).iter().any(|c| c == target) {
            mean_by_category(cleaned, city, target)?
        } else {
            Vec::new()
        };
        let domain = sorted_categories(cleaned, city)?;
        Ok((counts, means, domain))
    }

    fn consistency_check(
        &self,
        cleaned: &DataFrame,
        summary: &mut AnalysisSummary,
    ) -> Result<Option<ConsistencyCheck>> {
        let parts = monetary_part_columns(cleaned);
        if parts.is_empty() || cleaned.column(columns::TOTAL).is_err() {
            return Ok(None);
        }

        let check = total_consistency(
            cleaned,
            &parts,
            columns::TOTAL,
            self.config.consistency_tolerance,
        )?;
        if check.rows_inconsistent > 0 {
            warn!(
                "{} of {} rows have a total that differs from the sum of its parts",
                check.rows_inconsistent, check.rows_checked
            );
            summary.add_warning(format!(
                "{} rows ({:.1}%) have '{}' != sum of parts",
                check.rows_inconsistent,
                check.inconsistent_percentage(),
                columns::TOTAL
            ));
        }
        Ok(Some(check))
    }
}

/// Builder for creating a [`Pipeline`] with custom configuration.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pipeline.
    ///
    /// Validates the configuration again, since a config can also be built
    /// by hand or deserialized.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        Ok(Pipeline { config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::filter::ThresholdFilter;

    fn listings() -> DataFrame {
        df![
            "city" => ["São Paulo", "Porto Alegre", "Rio de Janeiro", "São Paulo", "Campinas", "Belo Horizonte"],
            "area" => [70i64, 320, 1500, 80, 51, 3000],
            "rooms" => [2i64, 4, 5, 1, 2, 6],
            "hoa (R$)" => [2065i64, 1200, 1000, 270, 0, 500],
            "rent amount (R$)" => [3300i64, 4960, 30000, 2800, 1112, 10000],
            "property tax (R$)" => [211i64, 1750, 3000, 0, 22, 1000],
            "fire insurance (R$)" => [42i64, 63, 1000, 41, 17, 200],
            "total (R$)" => [5618i64, 7973, 35000, 3111, 1200, 11700],
        ]
        .unwrap()
    }

    fn pipeline(config: PipelineConfig) -> Pipeline {
        Pipeline::builder().config(config).build().unwrap()
    }

    #[test]
    fn test_default_pipeline_applies_source_cutoffs() {
        let result = pipeline(PipelineConfig::default()).process(listings()).unwrap();

        assert_eq!(result.summary.rows_before, 6);
        assert_eq!(result.summary.rows_after, 4);
        let removed: Vec<usize> = result.steps.iter().map(|s| s.rows_removed()).collect();
        assert_eq!(removed, vec![1, 1, 0]);
    }

    #[test]
    fn test_long_form_covers_all_numeric_columns() {
        let result = pipeline(PipelineConfig::default()).process(listings()).unwrap();

        let n = result.summary.correlation_columns.len();
        assert_eq!(n, 7);
        assert_eq!(result.long_form.len(), n * n);
        assert_eq!(result.target_ranking.len(), n - 1);
    }

    #[test]
    fn test_city_summaries_and_consistency() {
        let result = pipeline(PipelineConfig::default()).process(listings()).unwrap();

        let sp = result
            .listings_per_city
            .iter()
            .find(|c| c.value == "São Paulo")
            .unwrap();
        assert_eq!(sp.count, 2);
        assert_eq!(result.listings_per_city.last().unwrap().value, "São Paulo");

        let consistency = result.consistency.unwrap();
        assert_eq!(consistency.rows_checked, 4);
        assert_eq!(consistency.rows_inconsistent, 1);
        assert!(!result.summary.warnings.is_empty());
    }

    #[test]
    fn test_chart_domains_follow_cleaned_rows() {
        let result = pipeline(PipelineConfig::default()).process(listings()).unwrap();

        assert_eq!(
            result.city_domain,
            vec!["Campinas", "Porto Alegre", "São Paulo"]
        );
        let extent = result.target_extent.unwrap();
        assert_eq!(extent.column, "total (R$)");
        assert_eq!((extent.min, extent.max), (1200.0, 7973.0));
    }

    #[test]
    fn test_explicit_correlation_columns() {
        let config = PipelineConfig::builder()
            .outlier_cutoffs(vec![])
            .correlation_columns(["rent amount (R$)", "total (R$)"])
            .build()
            .unwrap();

        let result = pipeline(config).process(listings()).unwrap();

        assert_eq!(result.summary.rows_after, 6);
        assert_eq!(result.long_form.len(), 4);
    }

    #[test]
    fn test_unknown_cutoff_column_fails() {
        let config = PipelineConfig::builder()
            .outlier_cutoffs(vec![ThresholdFilter::at_most("size", 10.0)])
            .build()
            .unwrap();

        let err = pipeline(config).process(listings()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_missing_city_column_degrades_gracefully() {
        let df = listings().drop("city").unwrap();
        let result = pipeline(PipelineConfig::default()).process(df).unwrap();

        assert!(result.listings_per_city.is_empty());
        assert!(result.city_domain.is_empty());
        assert!(result.target_extent.is_some());
        assert!(
            result
                .summary
                .warnings
                .iter()
                .any(|w| w.contains("City column"))
        );
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let config = PipelineConfig {
            consistency_tolerance: -1.0,
            ..Default::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }
}

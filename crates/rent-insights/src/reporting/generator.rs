use crate::config::PipelineConfig;
use crate::error::{Result, ResultExt};
use crate::pipeline::PipelineResult;
use crate::types::{
    AnalysisSummary, CategoryCount, CategoryMean, ColumnExtent, ConsistencyCheck, CorrelationEntry,
    FilterStep,
};
use chrono::Local;
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// Report Types
// ============================================================================

/// Serializable account of one pipeline run.
///
/// Used both for `--json` output on stdout and for the report file.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file, when the run started from a file
    pub input_file: Option<String>,
    /// Configuration the run used
    pub config: PipelineConfig,
    pub summary: AnalysisSummary,
    pub filter_steps: Vec<FilterStep>,
    /// Long-form correlation table
    pub correlations: Vec<CorrelationEntry>,
    pub target_ranking: Vec<CorrelationEntry>,
    pub listings_per_city: Vec<CategoryCount>,
    pub mean_target_by_city: Vec<CategoryMean>,
    /// Category axis shared by the per-city charts
    pub city_domain: Vec<String>,
    /// Value axis shared by the target charts
    pub target_extent: Option<ColumnExtent>,
    pub consistency: Option<ConsistencyCheck>,
}

impl AnalysisReport {
    pub fn from_result(
        result: &PipelineResult,
        config: &PipelineConfig,
        input_file: Option<&str>,
    ) -> Self {
        Self {
            generated_at: Local::now().to_rfc3339(),
            input_file: input_file.map(str::to_string),
            config: config.clone(),
            summary: result.summary.clone(),
            filter_steps: result.steps.clone(),
            correlations: result.long_form.clone(),
            target_ranking: result.target_ranking.clone(),
            listings_per_city: result.listings_per_city.clone(),
            mean_target_by_city: result.mean_target_by_city.clone(),
            city_domain: result.city_domain.clone(),
            target_extent: result.target_extent.clone(),
            consistency: result.consistency.clone(),
        }
    }
}

/// Paths written by [`ReportGenerator::export`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFiles {
    pub cleaned_csv: PathBuf,
    pub correlations_csv: PathBuf,
    pub report_json: PathBuf,
}

// ============================================================================
// Generator
// ============================================================================

pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
            output_name: None,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: Option<String>) -> Self {
        Self {
            output_dir,
            output_name,
        }
    }

    /// Base name for output files: the configured name, else the input stem.
    pub fn file_stem(&self, input_file: Option<&str>) -> String {
        if let Some(name) = &self.output_name {
            return name.clone();
        }
        input_file
            .and_then(|p| Path::new(p).file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or("rent_analysis")
            .to_string()
    }

    /// Write cleaned rows, correlations and the report.
    pub fn export(
        &self,
        result: &PipelineResult,
        report: &AnalysisReport,
        input_file: Option<&str>,
    ) -> Result<ExportedFiles> {
        let stem = self.file_stem(input_file);
        Ok(ExportedFiles {
            cleaned_csv: self.write_cleaned_csv(&result.cleaned, &stem)?,
            correlations_csv: self.write_correlations_csv(&result.long_form, &stem)?,
            report_json: self.write_report_to_file(report, &stem)?,
        })
    }

    /// Save the cleaned rows as `<stem>_cleaned.csv`.
    pub fn write_cleaned_csv(&self, df: &DataFrame, stem: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let output_path = self.output_dir.join(format!("{}_cleaned.csv", stem));
        let mut file = File::create(&output_path)?;

        let mut df = df.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(&mut df)
            .context("Writing cleaned CSV")?;

        info!("Cleaned dataset saved: {}", output_path.display());
        Ok(output_path)
    }

    /// Save the long-form table as `<stem>_correlations.csv`.
    ///
    /// Undefined coefficients are written as an empty field.
    pub fn write_correlations_csv(
        &self,
        entries: &[CorrelationEntry],
        stem: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let output_path = self.output_dir.join(format!("{}_correlations.csv", stem));
        let mut writer = csv::Writer::from_path(&output_path)?;

        writer.write_record(["variable_a", "variable_b", "correlation", "label"])?;
        for entry in entries {
            let correlation = entry
                .correlation
                .map(|c| c.to_string())
                .unwrap_or_default();
            writer.write_record([
                entry.variable_a.as_str(),
                entry.variable_b.as_str(),
                correlation.as_str(),
                entry.label.as_str(),
            ])?;
        }
        writer.flush()?;

        info!("Correlations saved: {}", output_path.display());
        Ok(output_path)
    }

    /// Write the report as pretty JSON to `<stem>_report.json`.
    pub fn write_report_to_file(&self, report: &AnalysisReport, stem: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let report_path = self.output_dir.join(format!("{}_report.json", stem));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}

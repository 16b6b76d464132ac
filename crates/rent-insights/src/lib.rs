//! Rental Listing Analysis Library
//!
//! Loads a CSV of rental listings, removes outliers with configurable
//! cutoffs, and computes the pairwise correlation table that a charting
//! layer renders as a heatmap. Built on Polars.
//!
//! # Overview
//!
//! - **Loading**: strict CSV loading; ragged rows are a parse error
//! - **Filtering**: threshold filters composed as independent sequential passes
//! - **Correlation**: pairwise Pearson matrix with per-pair undefined results
//! - **Long form**: `(variable A, variable B, coefficient, label)` rows
//! - **Summaries**: listings and mean rent per city, total-versus-parts check
//! - **Segments**: selection filters for comparing cities on similar listings
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use rent_insights::{Pipeline, PipelineConfig, ThresholdFilter};
//!
//! let config = PipelineConfig::builder()
//!     .outlier_cutoffs(vec![
//!         ThresholdFilter::at_most("total (R$)", 32000.0),
//!         ThresholdFilter::at_most("area", 1100.0),
//!     ])
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .build()?
//!     .process_file("houses_to_rent_v2.csv")?;
//!
//! for entry in &result.long_form {
//!     println!("{} / {}: {}", entry.variable_a, entry.variable_b, entry.label);
//! }
//! ```
//!
//! # Individual operations
//!
//! ```rust,ignore
//! use rent_insights::{load, filter_threshold, correlation_matrix, to_long_form};
//!
//! let df = load("houses.csv")?;
//! let df = filter_threshold(&df, "total (R$)", |v| v <= 32000.0)?;
//! let df = filter_threshold(&df, "area", |v| v <= 1100.0)?;
//! let matrix = correlation_matrix(&df, &["area".into(), "total (R$)".into()])?;
//! let table = to_long_form(&matrix);
//! ```

pub mod config;
pub mod error;
pub mod listing;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod segment;
pub mod summary;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{AnalysisError, Result as AnalysisResult, ResultExt, UndefinedCorrelation};
pub use listing::{AnimalPolicy, Furnishing, Listing, listings};
pub use loader::{load, load_from_bytes};
pub use pipeline::{
    Bound, Coefficient, CorrelationMatrix, FilterChain, Pipeline, PipelineBuilder,
    PipelineResult, ThresholdFilter, correlation_matrix, feature_columns, filter_threshold,
    numeric_correlation_matrix, to_long_form,
};
pub use reporting::{AnalysisReport, ExportedFiles, ReportGenerator};
pub use segment::{Selection, SegmentComparison, apply_selections, compare_cities};
pub use types::{
    AnalysisSummary, CategoryCount, CategoryMean, ColumnExtent, ConsistencyCheck,
    CorrelationEntry, FilterStep,
};
pub use utils::numeric_column_names;

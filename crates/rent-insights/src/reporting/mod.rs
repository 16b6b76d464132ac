//! Report generation module.
//!
//! This module turns a pipeline result into the files a charting layer
//! consumes: the cleaned rows as CSV, the long-form correlation table as CSV,
//! and an [`AnalysisReport`] as JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use rent_insights::reporting::{AnalysisReport, ReportGenerator};
//!
//! let report = AnalysisReport::from_result(&result, pipeline.config(), Some("houses.csv"));
//!
//! // Print as JSON
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! // Or write everything to disk
//! let generator = ReportGenerator::new(PathBuf::from("outputs"), None);
//! generator.export(&result, &report, Some("houses.csv"))?;
//! ```

mod generator;

pub use generator::{AnalysisReport, ExportedFiles, ReportGenerator};

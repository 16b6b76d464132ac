//! Error types for the rental analysis pipeline.
//!
//! Fatal conditions (unreadable input, bad arguments) are variants of
//! [`AnalysisError`]. A correlation that cannot be computed for one pair of
//! columns is not fatal: it is reported per pair as [`UndefinedCorrelation`]
//! so the rest of the matrix stays usable.
//!
//! Errors are serializable so the report layer can hand them to a frontend
//! as `{ code, message }`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Input file is missing, unreadable or structurally malformed.
    #[error("Failed to parse dataset: {0}")]
    Parse(String),

    /// An operation was called with arguments it cannot act on
    /// (unknown column, non-numeric column, empty column list).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// CSV structure error wrapper.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Shorthand for an unknown column.
    pub fn column_not_found(column: &str) -> Self {
        AnalysisError::InvalidArgument(format!("column '{}' not found in dataset", column))
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "PARSE_ERROR",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Csv(_) => "CSV_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// True for errors caused by the input file rather than the caller.
    pub fn is_parse_error(&self) -> bool {
        match self {
            Self::Parse(_) | Self::Csv(_) => true,
            Self::WithContext { source, .. } => source.is_parse_error(),
            _ => false,
        }
    }
}

/// Serialized as a struct with `code` and `message` fields.
impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Why a Pearson coefficient could not be computed for a column pair.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UndefinedCorrelation {
    /// The column holds the same value in every complete row.
    #[error("column '{column}' has zero variance")]
    ZeroVariance { column: String },

    /// Fewer than two rows have values in both columns.
    #[error("only {observations} complete observations for '{column_a}' and '{column_b}'")]
    InsufficientData {
        column_a: String,
        column_b: String,
        observations: usize,
    },
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}

//! Pipeline module.
//!
//! Row filtering, correlation, and the [`Pipeline`] that composes them.

mod builder;
pub mod correlation;
pub mod filter;

pub use builder::{Pipeline, PipelineBuilder, PipelineResult};
pub use correlation::{
    Coefficient, CorrelationMatrix, correlation_matrix, feature_columns,
    numeric_correlation_matrix, to_long_form,
};
pub use filter::{Bound, FilterChain, ThresholdFilter, filter_threshold};

//! Descriptive summaries of a dataset.
//!
//! These back the overview charts: listings per city, mean total rent per
//! city, axis extents, and the total-versus-parts sanity check.

mod categories;
mod consistency;

pub use categories::{listings_per_city, mean_by_category, sorted_categories};
pub use consistency::{column_extent, total_consistency};

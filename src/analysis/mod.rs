//! Aggregation and statistics.
//!
//! Categorizes per-run metrics, merges runs per model and reduces each
//! metric's values to a confidence interval.

pub mod aggregator;
pub mod categorize;
pub mod confidence;
pub mod summary;

pub use aggregator::{aggregate_metrics_by_model, run_identity};
pub use categorize::PrefixPolicy;
pub use summary::compute_ci_by_model;

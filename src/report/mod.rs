//! Report generation.
//!
//! [`table`] decides row and column layout; [`writer`] persists it as CSV.

pub mod table;
pub mod writer;

pub use table::ReportOptions;
pub use writer::save_metrics_to_csv;

//! Error types for the summary pipeline.
//!
//! Only fatal conditions live here. Per-run anomalies (unreadable event files,
//! unmapped names, empty reports) are recorded as warnings in
//! [`crate::models::Diagnostics`] and never abort a run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, SummaryError>;

/// Fatal pipeline errors.
#[derive(Error, Debug)]
pub enum SummaryError {
    /// Confidence level outside the open interval (0, 1)
    #[error("Confidence level must be between 0 and 1 (exclusive), got {0}")]
    InvalidConfidence(f64),

    /// Prefix policy was neither a list of prefixes nor a prefix mapping
    #[error("prefix_file_mapping must be a list or a mapping: {0}")]
    InvalidPrefixPolicy(String),

    /// No logs directory configured
    #[error("The logs directory must be specified either via --logs-dir or in the config file")]
    MissingLogsDir,

    /// Inline list/mapping flag could not be parsed
    #[error("Invalid inline argument '{value}': must be a valid list or mapping ({reason})")]
    InvalidInlineArgument {
        /// Raw flag value
        value: String,
        /// Parser message
        reason: String,
    },

    /// Discovery found nothing under the root
    #[error("No event files found in logs directory {}", .0.display())]
    NoLogsFound(PathBuf),

    /// Event file is not nested as `logs_dir/model/run/<file>`
    #[error(
        "Event file {} does not follow the logs_dir/model/run/<event file> layout",
        .0.display()
    )]
    InvalidLayout(PathBuf),

    /// Corrupt record framing or protobuf payload
    #[error("Malformed event file {}: {reason}", path.display())]
    EventFile {
        /// Offending file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Directory traversal error
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

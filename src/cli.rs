//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// tbsummary - TensorBoard scalars to CSV with confidence intervals
///
/// Reads the latest event file of every run under a logs directory,
/// aggregates runs of the same model and writes one row per model.
///
/// Assumed directory structure:
///   logs_dir/
///     model_name/
///       run_name/
///         events.out.tfevents.*
///
/// Metric tags must carry a prefix, e.g. 'test/Acc', 'shift/ECE', 'ood/AUROC'.
///
/// Examples:
///   tbsummary --logs-dir logs
///   tbsummary --logs-dir logs --prefix-file-mapping '["test", "shift", "ood"]'
///   tbsummary -c report.yaml --confidence 0.99 --separate-columns
///   tbsummary --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to a TOML or YAML configuration file
    ///
    /// CLI arguments override values in the config. If not specified,
    /// looks for .tbsummary.toml in the current directory.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the logs directory
    ///
    /// Required unless specified in the config file.
    #[arg(short, long, value_name = "DIR", env = "TBSUMMARY_LOGS_DIR")]
    pub logs_dir: Option<PathBuf>,

    /// Prefixes to split output files by
    ///
    /// A list of prefixes (e.g. '["test", "shift", "ood"]') writes
    /// '<prefix>_metrics.csv' per prefix. A mapping of prefixes to file names
    /// (e.g. '{"test": "test.csv", "val": "test.csv"}') writes the named files.
    /// If not provided, all metrics are saved to all_metrics.csv.
    #[arg(long, value_name = "LIST|MAP")]
    pub prefix_file_mapping: Option<String>,

    /// Mapping of model directory names to display names
    ///
    /// Example: '{"mc_dropout": "MC Dropout", "ensemble": "Deep Ensemble"}'
    #[arg(long, value_name = "MAP")]
    pub model_name_mapping: Option<String>,

    /// Custom row order by model directory name
    ///
    /// Example: '["standard", "mc_dropout", "ensemble"]'
    #[arg(long, value_name = "LIST")]
    pub model_sort_order: Option<String>,

    /// Mapping of metric keys to column headers
    ///
    /// Example: '{"Acc": "Accuracy", "ECE": "Expected Calibration Error"}'
    #[arg(long, value_name = "MAP")]
    pub metric_name_mapping: Option<String>,

    /// Custom column order by metric key
    ///
    /// Unlisted metrics follow in alphabetical order.
    #[arg(long, value_name = "LIST")]
    pub metric_sort_order: Option<String>,

    /// Confidence level for intervals (default: 0.95)
    #[arg(long, value_name = "LEVEL")]
    pub confidence: Option<f64>,

    /// Write mean and margin into separate columns
    #[arg(long, conflicts_with = "combine_columns")]
    pub separate_columns: bool,

    /// Write "mean ±margin" into one column per metric
    #[arg(long, conflicts_with = "separate_columns")]
    pub combine_columns: bool,

    /// Include the Step column
    #[arg(long)]
    pub include_step: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: list the event files that would be read and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .tbsummary.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(confidence) = self.confidence {
            if !(confidence > 0.0 && confidence < 1.0) {
                return Err("Confidence must be between 0 and 1 (exclusive)".to_string());
            }
        }

        if let Some(ref logs_dir) = self.logs_dir {
            if !logs_dir.is_dir() {
                return Err(format!(
                    "Logs directory does not exist: {}",
                    logs_dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            config: None,
            logs_dir: None,
            prefix_file_mapping: None,
            model_name_mapping: None,
            model_sort_order: None,
            metric_name_mapping: None,
            metric_sort_order: None,
            confidence: None,
            separate_columns: false,
            combine_columns: false,
            include_step: false,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "tbsummary",
            "--logs-dir",
            "logs",
            "--prefix-file-mapping",
            r#"["test", "ood"]"#,
            "--confidence",
            "0.9",
            "--separate-columns",
        ])
        .unwrap();
        assert_eq!(args.logs_dir, Some(PathBuf::from("logs")));
        assert_eq!(args.prefix_file_mapping.as_deref(), Some(r#"["test", "ood"]"#));
        assert_eq!(args.confidence, Some(0.9));
        assert!(args.separate_columns);
    }

    #[test]
    fn test_column_flags_conflict() {
        let result = Args::try_parse_from([
            "tbsummary",
            "--separate-columns",
            "--combine-columns",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_confidence() {
        let mut args = make_args();
        args.confidence = Some(1.5);
        assert!(args.validate().is_err());
        args.confidence = Some(0.99);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_logs_dir() {
        let mut args = make_args();
        args.logs_dir = Some(PathBuf::from("/definitely/not/here"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}

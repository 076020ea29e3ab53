//! Configuration file handling.
//!
//! This module handles loading configuration from TOML or YAML files,
//! merging CLI overrides and resolving the validated [`Settings`].

use crate::analysis::confidence::validate_confidence;
use crate::cli::Args;
use crate::error::SummaryError;
use crate::pipeline::{ReportLayout, Settings};
use crate::report::ReportOptions;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".tbsummary.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Logs directory containing `model/run/events.out.tfevents.*`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_dir: Option<PathBuf>,

    /// Confidence level for intervals.
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    /// Combine mean and margin into one `"mean ±margin"` cell.
    #[serde(default = "default_true")]
    pub combine_columns: bool,

    /// Include the Step column.
    #[serde(default)]
    pub include_step: bool,

    /// Row order by model key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_sort_order: Option<Vec<String>>,

    /// Column order by metric key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_sort_order: Option<Vec<String>>,

    /// List of prefixes, or mapping of prefix to output file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_file_mapping: Option<Value>,

    /// Model key to display name.
    #[serde(default)]
    pub model_name_mapping: BTreeMap<String, String>,

    /// Metric key to display name.
    #[serde(default)]
    pub metric_name_mapping: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logs_dir: None,
            confidence: default_confidence(),
            combine_columns: true,
            include_step: false,
            model_sort_order: None,
            metric_sort_order: None,
            prefix_file_mapping: None,
            model_name_mapping: BTreeMap::new(),
            metric_name_mapping: BTreeMap::new(),
        }
    }
}

fn default_confidence() -> f64 {
    0.95
}

fn default_true() -> bool {
    true
}

/// Parse an inline list or mapping flag such as `'["a", "b"]'` or `'{"a": "b"}'`.
///
/// Values are read as YAML flow collections, which also accepts JSON.
pub fn parse_inline_argument(raw: &str) -> std::result::Result<Value, SummaryError> {
    let invalid = |reason: String| SummaryError::InvalidInlineArgument {
        value: raw.to_string(),
        reason,
    };
    let value: Value = serde_yaml::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    match value {
        Value::Sequence(_) | Value::Mapping(_) => Ok(value),
        _ => Err(invalid("not a list or mapping".to_string())),
    }
}

fn parse_inline_as<T: DeserializeOwned>(raw: &str) -> std::result::Result<T, SummaryError> {
    let value = parse_inline_argument(raw)?;
    serde_yaml::from_value(value).map_err(|e| SummaryError::InvalidInlineArgument {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

impl Config {
    /// Load configuration from a file path. `.yaml`/`.yml` files are read as
    /// YAML, everything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        let config: Config = if is_yaml {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        };

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_default_in(Path::new("."))
    }

    /// Look for [`DEFAULT_CONFIG_FILE`] in `dir`.
    pub fn load_default_in(dir: &Path) -> Result<Option<Self>> {
        let default_path = dir.join(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(&default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided flags override the config.
    pub fn merge_with_args(&mut self, args: &Args) -> std::result::Result<(), SummaryError> {
        if let Some(ref logs_dir) = args.logs_dir {
            self.logs_dir = Some(logs_dir.clone());
        }

        if let Some(ref raw) = args.prefix_file_mapping {
            self.prefix_file_mapping = Some(parse_inline_argument(raw)?);
        }
        if let Some(ref raw) = args.model_name_mapping {
            self.model_name_mapping = parse_inline_as(raw)?;
        }
        if let Some(ref raw) = args.model_sort_order {
            self.model_sort_order = Some(parse_inline_as(raw)?);
        }
        if let Some(ref raw) = args.metric_name_mapping {
            self.metric_name_mapping = parse_inline_as(raw)?;
        }
        if let Some(ref raw) = args.metric_sort_order {
            self.metric_sort_order = Some(parse_inline_as(raw)?);
        }

        if let Some(confidence) = args.confidence {
            self.confidence = confidence;
        }

        if args.separate_columns {
            self.combine_columns = false;
        } else if args.combine_columns {
            self.combine_columns = true;
        }

        // Flags always override
        if args.include_step {
            self.include_step = true;
        }

        Ok(())
    }

    /// Validate and resolve into run settings.
    pub fn into_settings(self) -> std::result::Result<Settings, SummaryError> {
        let logs_dir = self
            .logs_dir
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(SummaryError::MissingLogsDir)?;
        validate_confidence(self.confidence)?;
        let layout = ReportLayout::from_value(self.prefix_file_mapping.as_ref())?;

        Ok(Settings {
            logs_dir,
            layout,
            report: ReportOptions {
                model_name_mapping: self.model_name_mapping,
                model_sort_order: self.model_sort_order,
                metric_name_mapping: self.metric_name_mapping,
                metric_sort_order: self.metric_sort_order,
                include_step: self.include_step,
            },
            confidence: self.confidence,
            combine_columns: self.combine_columns,
        })
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config {
            logs_dir: Some(PathBuf::from("logs")),
            ..Config::default()
        };
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

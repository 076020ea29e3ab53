//! Data models for the summary pipeline.
//!
//! This module contains the structures passed between discovery, aggregation,
//! statistics and report generation: per-run extractions, per-model aggregates,
//! confidence-interval summaries and the diagnostics channel.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Bare metric name to the values collected across runs.
pub type MetricValues = BTreeMap<String, Vec<f64>>;

/// Metric (or derived column) name to its rendered cell.
pub type DisplayMetrics = BTreeMap<String, String>;

/// Ordered model rows handed to the report formatter.
pub type ReportRows = Vec<(String, DisplayMetrics)>;

/// Name of the synthetic step column.
pub const STEP_COLUMN: &str = "Step";

/// One sample of a scalar series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarSample {
    /// Global step the value was logged at.
    pub step: i64,
    /// Logged value.
    pub value: f64,
    /// Wall-clock time in seconds since the epoch.
    #[allow(dead_code)] // Kept for parity with the event record
    pub wall_time: f64,
}

/// A named scalar series as read from one event file.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSeries {
    /// Full tag, e.g. `test/Acc`.
    pub tag: String,
    /// Samples in file order.
    pub samples: Vec<ScalarSample>,
}

impl ScalarSeries {
    /// Create an empty series.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            samples: Vec::new(),
        }
    }

    /// The sample that wins: the last one in file order.
    pub fn latest(&self) -> Option<&ScalarSample> {
        self.samples.last()
    }
}

/// Latest scalar values of a single run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunMetrics {
    /// Full metric name to its latest value.
    pub metrics: BTreeMap<String, f64>,
    /// Step of the series that was read last (not the maximum step).
    pub last_step: Option<i64>,
}

impl RunMetrics {
    /// Reduce series to their latest samples.
    ///
    /// Series are consumed in the order given; `last_step` follows the last
    /// non-empty one.
    pub fn from_series(series: &[ScalarSeries]) -> Self {
        let mut run = Self::default();
        for s in series {
            if let Some(sample) = s.latest() {
                run.metrics.insert(s.tag.clone(), sample.value);
                run.last_step = Some(sample.step);
            }
        }
        run
    }

    /// Returns true if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Values accumulated for one model across all of its runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetrics {
    /// Model key (directory two levels above the event file).
    pub key: String,
    /// Run names merged into this model, in discovery order.
    pub runs: Vec<String>,
    /// Step reported by the first (most recent) run.
    pub last_step: Option<i64>,
    /// Category to per-metric value lists, in declaration order.
    pub categories: Vec<(String, MetricValues)>,
}

impl ModelMetrics {
    /// Look up a category by name.
    pub fn category(&self, name: &str) -> Option<&MetricValues> {
        self.categories
            .iter()
            .find(|(category, _)| category == name)
            .map(|(_, values)| values)
    }
}

/// Immutable snapshot of all models, in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelAggregate {
    pub models: Vec<ModelMetrics>,
}

impl ModelAggregate {
    /// Look up a model by key.
    #[allow(dead_code)] // Lookup utility
    pub fn get(&self, key: &str) -> Option<&ModelMetrics> {
        self.models.iter().find(|m| m.key == key)
    }
}

/// Confidence-interval cells for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub key: String,
    pub last_step: Option<i64>,
    /// Category to rendered metric cells, in declaration order.
    pub categories: Vec<(String, DisplayMetrics)>,
}

impl ModelSummary {
    pub fn category(&self, name: &str) -> Option<&DisplayMetrics> {
        self.categories
            .iter()
            .find(|(category, _)| category == name)
            .map(|(_, cells)| cells)
    }

    /// All categories merged into one mapping. Later categories win on collisions.
    pub fn flattened(&self) -> DisplayMetrics {
        let mut merged = DisplayMetrics::new();
        for (_, cells) in &self.categories {
            merged.extend(cells.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }
}

/// Confidence-interval summary for every model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CiSummary {
    pub models: Vec<ModelSummary>,
}

/// A non-fatal anomaly noticed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Event file yielded no scalars.
    EmptyRun { path: PathBuf },
    /// Event file could not be read.
    UnreadableRun { path: PathBuf, reason: String },
    /// Model missing from the model sort order.
    UnlistedModel { model: String },
    /// Metric missing from the metric sort order.
    UnlistedMetric { metric: String },
    /// Model missing from the model name mapping.
    UnmappedModel { model: String },
    /// Metric missing from the metric name mapping.
    UnmappedMetric { metric: String },
    /// Report had no models and was not written.
    EmptyReport { path: PathBuf },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::EmptyRun { path } => {
                write!(f, "No metrics extracted from {}. Skipping...", path.display())
            }
            Warning::UnreadableRun { path, reason } => {
                write!(f, "Failed to read {}: {}. Skipping...", path.display(), reason)
            }
            Warning::UnlistedModel { model } => write!(
                f,
                "Model '{}' is not included in the model sort order. Adding it to the end.",
                model
            ),
            Warning::UnlistedMetric { metric } => write!(
                f,
                "Metric '{}' is not included in the metric sort order. Adding it to the end.",
                metric
            ),
            Warning::UnmappedModel { model } => write!(
                f,
                "Model '{}' is not included in the model name mapping. Using the name as-is.",
                model
            ),
            Warning::UnmappedMetric { metric } => write!(
                f,
                "Metric '{}' is not included in the metric name mapping. Using the key as-is.",
                metric
            ),
            Warning::EmptyReport { path } => {
                write!(f, "No metrics found. Skipping {}.", path.display())
            }
        }
    }
}

/// Collected warnings; the caller decides how to render them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.
    pub fn push(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(tag: &str, points: &[(i64, f64)]) -> ScalarSeries {
        ScalarSeries {
            tag: tag.to_string(),
            samples: points
                .iter()
                .map(|&(step, value)| ScalarSample {
                    step,
                    value,
                    wall_time: 0.0,
                })
                .collect(),
        }
    }

    #[test]
    fn test_run_metrics_takes_latest_sample() {
        let run = RunMetrics::from_series(&[series("test/Acc", &[(1, 0.5), (2, 0.9)])]);
        assert_eq!(run.metrics.get("test/Acc"), Some(&0.9));
        assert_eq!(run.last_step, Some(2));
    }

    #[test]
    fn test_last_step_follows_last_series_not_max() {
        let run = RunMetrics::from_series(&[
            series("train/Loss", &[(100, 0.1)]),
            series("test/Acc", &[(10, 0.9)]),
        ]);
        assert_eq!(run.last_step, Some(10));
    }

    #[test]
    fn test_empty_series_ignored() {
        let run = RunMetrics::from_series(&[series("test/Acc", &[])]);
        assert!(run.is_empty());
        assert_eq!(run.last_step, None);
    }

    #[test]
    fn test_flattened_later_category_wins() {
        let summary = ModelSummary {
            key: "m".to_string(),
            last_step: None,
            categories: vec![
                ("a".to_string(), [("Acc".to_string(), "1".to_string())].into()),
                ("b".to_string(), [("Acc".to_string(), "2".to_string())].into()),
            ],
        };
        assert_eq!(summary.flattened().get("Acc").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_warning_display() {
        let w = Warning::UnlistedModel {
            model: "C".to_string(),
        };
        assert!(w.to_string().contains("'C'"));
    }
}

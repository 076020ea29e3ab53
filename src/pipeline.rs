//! End-to-end orchestration.
//!
//! Discovery, aggregation, confidence intervals and report fan-out for one
//! invocation. Everything runs sequentially on the calling thread.

use crate::analysis::confidence::validate_confidence;
use crate::analysis::{aggregate_metrics_by_model, compute_ci_by_model, PrefixPolicy};
use crate::error::{Result, SummaryError};
use crate::events::ScalarReader;
use crate::models::{
    CiSummary, Diagnostics, DisplayMetrics, ModelSummary, ReportRows, STEP_COLUMN,
};
use crate::report::table::order_by_preference;
use crate::report::{save_metrics_to_csv, ReportOptions};
use crate::scanner::find_event_files;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File written when no prefix mapping is configured.
pub const COMBINED_FILE: &str = "all_metrics.csv";

/// How categories are split across output files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReportLayout {
    /// Every metric, under its full name, in [`COMBINED_FILE`].
    #[default]
    Combined,
    /// One file per category of the policy.
    PerCategory(PrefixPolicy),
}

impl ReportLayout {
    /// Resolve the `prefix_file_mapping` setting.
    ///
    /// A list of prefixes writes `<prefix>_metrics.csv` per prefix. A mapping
    /// of prefix to file name uses the file name as category, so prefixes
    /// sharing a file are merged into it.
    pub fn from_value(value: Option<&Value>) -> Result<Self> {
        match value {
            None | Some(Value::Null) => Ok(ReportLayout::Combined),
            Some(Value::Sequence(items)) if items.is_empty() => Ok(ReportLayout::Combined),
            Some(Value::Mapping(map)) if map.is_empty() => Ok(ReportLayout::Combined),
            Some(value) => Ok(ReportLayout::PerCategory(PrefixPolicy::from_value(value)?)),
        }
    }

    /// Policy used to categorize metrics, if any.
    pub fn policy(&self) -> Option<&PrefixPolicy> {
        match self {
            ReportLayout::Combined => None,
            ReportLayout::PerCategory(policy) => Some(policy),
        }
    }

    /// Category and file name of every output, in declaration order.
    pub fn outputs(&self) -> Vec<(String, String)> {
        match self {
            ReportLayout::Combined => Vec::new(),
            ReportLayout::PerCategory(policy @ PrefixPolicy::PrefixSet(_)) => policy
                .categories()
                .into_iter()
                .map(|c| {
                    let file = format!("{}_metrics.csv", c);
                    (c, file)
                })
                .collect(),
            ReportLayout::PerCategory(policy @ PrefixPolicy::PrefixToCategory(_)) => policy
                .categories()
                .into_iter()
                .map(|c| (c.clone(), c))
                .collect(),
        }
    }
}

/// Validated settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub logs_dir: PathBuf,
    pub layout: ReportLayout,
    pub report: ReportOptions,
    pub confidence: f64,
    pub combine_columns: bool,
}

/// Progress notifications for front ends.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// Discovery finished with this many event files.
    Discovered(usize),
    /// About to read an event file.
    Reading(&'a Path),
    /// All event files were read.
    Aggregated,
}

/// Result of a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Files written, in output order.
    pub written: Vec<PathBuf>,
    /// Number of models that produced metrics.
    pub models: usize,
    /// Number of runs merged into those models.
    pub runs: usize,
    /// Number of event files discovered.
    pub event_files: usize,
    pub diagnostics: Diagnostics,
}

/// Run the whole pipeline.
pub fn run<R: ScalarReader + ?Sized>(
    settings: &Settings,
    reader: &R,
    mut progress: impl FnMut(Progress<'_>),
) -> Result<RunOutcome> {
    validate_confidence(settings.confidence)?;

    let logs_dir = settings.logs_dir.as_path();
    let event_files = discover(logs_dir)?;
    info!("Found {} event files in {}", event_files.len(), logs_dir.display());
    progress(Progress::Discovered(event_files.len()));

    let mut outcome = RunOutcome {
        event_files: event_files.len(),
        ..Default::default()
    };

    let aggregate = aggregate_metrics_by_model(
        logs_dir,
        &event_files,
        settings.layout.policy(),
        reader,
        &mut outcome.diagnostics,
        |path| progress(Progress::Reading(path)),
    )?;
    progress(Progress::Aggregated);
    outcome.models = aggregate.models.len();
    outcome.runs = aggregate.models.iter().map(|m| m.runs.len()).sum();

    let summary = compute_ci_by_model(&aggregate, settings.confidence, settings.combine_columns)?;
    let summary = sort_models(summary, settings.report.model_sort_order.as_deref());

    for (file_name, rows) in fan_out(&summary, &settings.layout) {
        let path = logs_dir.join(&file_name);
        debug!("Writing {} models to {}", rows.len(), path.display());
        if save_metrics_to_csv(&rows, &path, &settings.report, &mut outcome.diagnostics)? {
            outcome.written.push(path);
        }
    }

    Ok(outcome)
}

/// Find the event files to read. An absent or empty logs directory is fatal.
pub fn discover(logs_dir: &Path) -> Result<Vec<PathBuf>> {
    if !logs_dir.is_dir() {
        return Err(SummaryError::NoLogsFound(logs_dir.to_path_buf()));
    }
    let event_files = find_event_files(logs_dir)?;
    if event_files.is_empty() {
        return Err(SummaryError::NoLogsFound(logs_dir.to_path_buf()));
    }
    Ok(event_files)
}

/// Apply the model sort order to the summary: listed models first, the rest
/// in discovery order.
pub fn sort_models(summary: CiSummary, order: Option<&[String]>) -> CiSummary {
    let keys: Vec<&str> = summary.models.iter().map(|m| m.key.as_str()).collect();
    let (ordered, _) = order_by_preference(&keys, order);

    let mut slots: Vec<Option<ModelSummary>> = summary.models.into_iter().map(Some).collect();
    CiSummary {
        models: ordered
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect(),
    }
}

/// Split the summary into `(file name, rows)` per output file.
fn fan_out(summary: &CiSummary, layout: &ReportLayout) -> Vec<(String, ReportRows)> {
    match layout {
        ReportLayout::Combined => {
            let rows = summary
                .models
                .iter()
                .map(|m| (m.key.clone(), with_step(m.flattened(), m.last_step)))
                .collect();
            vec![(COMBINED_FILE.to_string(), rows)]
        }
        ReportLayout::PerCategory(_) => layout
            .outputs()
            .into_iter()
            .map(|(category, file_name)| {
                let rows = summary
                    .models
                    .iter()
                    .map(|m| {
                        let cells = m.category(&category).cloned().unwrap_or_default();
                        (m.key.clone(), with_step(cells, m.last_step))
                    })
                    .collect();
                (file_name, rows)
            })
            .collect(),
    }
}

fn with_step(mut cells: DisplayMetrics, step: Option<i64>) -> DisplayMetrics {
    if let Some(step) = step {
        cells.insert(STEP_COLUMN.to_string(), step.to_string());
    }
    cells
}

//! Per-model aggregation of run metrics.
//!
//! Runs of the same model (directories sharing a parent) are merged into
//! per-category, per-metric value lists, one value per run in discovery order.

use crate::analysis::categorize::{Categorized, PrefixPolicy};
use crate::error::{Result, SummaryError};
use crate::events::{extract_metrics, ScalarReader};
use crate::models::{Diagnostics, ModelAggregate, ModelMetrics, RunMetrics, Warning};
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path};
use tracing::{debug, info};

/// Category used when no prefix policy is configured: every metric is kept
/// under its full name.
pub const ALL_METRICS: &str = "all";

/// Identity of a run derived from the directory layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentity {
    pub model_key: String,
    pub run_name: String,
}

/// Derive `(model_key, run_name)` from `logs_dir/model_key/run_name/<file>`.
///
/// Deeper nesting is allowed; the two directories directly above the file are
/// used. Paths outside `logs_dir` are interpreted as given.
pub fn run_identity(logs_dir: &Path, event_file: &Path) -> Result<RunIdentity> {
    let relative = event_file.strip_prefix(logs_dir).unwrap_or(event_file);
    let dirs: Vec<String> = relative
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    match dirs.as_slice() {
        [.., model_key, run_name] => Ok(RunIdentity {
            model_key: model_key.clone(),
            run_name: run_name.clone(),
        }),
        _ => Err(SummaryError::InvalidLayout(event_file.to_path_buf())),
    }
}

/// Owns all accumulation state for one pipeline run.
pub struct ModelAggregateBuilder<'a> {
    policy: Option<&'a PrefixPolicy>,
    models: Vec<ModelMetrics>,
    index: HashMap<String, usize>,
}

impl<'a> ModelAggregateBuilder<'a> {
    /// Create a builder. Without a policy, metrics keep their full names in a
    /// single [`ALL_METRICS`] category.
    pub fn new(policy: Option<&'a PrefixPolicy>) -> Self {
        Self {
            policy,
            models: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn declared_categories(&self) -> Vec<String> {
        match self.policy {
            Some(policy) => policy.categories(),
            None => vec![ALL_METRICS.to_string()],
        }
    }

    fn categorize(&self, run: &RunMetrics) -> Categorized {
        match self.policy {
            Some(policy) => policy.categorize(&run.metrics),
            None => vec![(ALL_METRICS.to_string(), run.metrics.clone())],
        }
    }

    /// Merge one run into its model.
    pub fn add_run(&mut self, identity: &RunIdentity, run: &RunMetrics) {
        let idx = match self.index.get(&identity.model_key) {
            Some(&idx) => idx,
            None => {
                let categories = self
                    .declared_categories()
                    .into_iter()
                    .map(|c| (c, BTreeMap::new()))
                    .collect();
                self.models.push(ModelMetrics {
                    key: identity.model_key.clone(),
                    runs: Vec::new(),
                    last_step: run.last_step,
                    categories,
                });
                self.index
                    .insert(identity.model_key.clone(), self.models.len() - 1);
                self.models.len() - 1
            }
        };

        let categorized = self.categorize(run);
        let model = &mut self.models[idx];
        model.runs.push(identity.run_name.clone());

        for (category, values) in categorized {
            let Some((_, bucket)) = model.categories.iter_mut().find(|(c, _)| *c == category)
            else {
                continue;
            };
            for (metric, value) in values {
                bucket.entry(metric).or_default().push(value);
            }
        }
    }

    /// Freeze the accumulated state.
    pub fn build(self) -> ModelAggregate {
        ModelAggregate {
            models: self.models,
        }
    }
}

/// Read every event file and merge its metrics into per-model aggregates.
///
/// Unreadable or empty files are skipped with a warning. A file outside the
/// `logs_dir/model/run/<file>` layout aborts the aggregation.
pub fn aggregate_metrics_by_model<R: ScalarReader + ?Sized>(
    logs_dir: &Path,
    event_files: &[impl AsRef<Path>],
    policy: Option<&PrefixPolicy>,
    reader: &R,
    diagnostics: &mut Diagnostics,
    mut on_progress: impl FnMut(&Path),
) -> Result<ModelAggregate> {
    let mut builder = ModelAggregateBuilder::new(policy);

    for event_file in event_files {
        let event_file = event_file.as_ref();
        let identity = run_identity(logs_dir, event_file)?;
        on_progress(event_file);

        let run = match extract_metrics(reader, event_file) {
            Ok(run) => run,
            Err(e) => {
                diagnostics.push(Warning::UnreadableRun {
                    path: event_file.to_path_buf(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if run.is_empty() {
            diagnostics.push(Warning::EmptyRun {
                path: event_file.to_path_buf(),
            });
            continue;
        }

        debug!(
            "{}/{}: {} metrics",
            identity.model_key,
            identity.run_name,
            run.metrics.len()
        );
        builder.add_run(&identity, &run);
    }

    let aggregate = builder.build();
    info!("Aggregated {} models", aggregate.models.len());
    Ok(aggregate)
}

//! Reduction of aggregated runs to confidence-interval cells.

use crate::analysis::confidence::{compute_confidence_interval, format_value};
use crate::error::Result;
use crate::models::{CiSummary, DisplayMetrics, ModelAggregate, ModelSummary};

/// Suffix of the mean column when columns are separated.
pub const MEAN_SUFFIX: &str = "Mean";
/// Suffix of the margin column when columns are separated.
pub const CI_SUFFIX: &str = "± CI";

/// Compute a confidence interval for every (model, category, metric) list.
///
/// With `combine_columns` each metric becomes one `"mean ±margin"` cell;
/// otherwise it becomes `"<metric> Mean"` and `"<metric> ± CI"` cells.
pub fn compute_ci_by_model(
    aggregate: &ModelAggregate,
    confidence: f64,
    combine_columns: bool,
) -> Result<CiSummary> {
    let mut models = Vec::with_capacity(aggregate.models.len());

    for model in &aggregate.models {
        let mut categories = Vec::with_capacity(model.categories.len());
        for (category, metrics) in &model.categories {
            let mut cells = DisplayMetrics::new();
            for (metric, values) in metrics {
                let Some(ci) = compute_confidence_interval(values, confidence)? else {
                    continue;
                };
                if combine_columns {
                    cells.insert(metric.clone(), ci.combined());
                } else {
                    cells.insert(format!("{} {}", metric, MEAN_SUFFIX), format_value(ci.mean));
                    cells.insert(format!("{} {}", metric, CI_SUFFIX), format_value(ci.margin));
                }
            }
            categories.push((category.clone(), cells));
        }
        models.push(ModelSummary {
            key: model.key.clone(),
            last_step: model.last_step,
            categories,
        });
    }

    Ok(CiSummary { models })
}

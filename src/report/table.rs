//! Row and column layout of metric reports.
//!
//! Turns ordered model rows into a header plus cell grid: selects and orders
//! columns, orders rows, applies display names and fills gaps with `N/A`.

use crate::models::{Diagnostics, ReportRows, Warning, STEP_COLUMN};
use std::collections::{BTreeMap, BTreeSet};

/// Cell value for a metric a model does not have.
pub const MISSING: &str = "N/A";

/// Header of the model name column.
pub const NAME_COLUMN: &str = "Name";

/// Naming and ordering options for a report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportOptions {
    /// Model key to display name.
    pub model_name_mapping: BTreeMap<String, String>,
    /// Preferred row order by model key.
    pub model_sort_order: Option<Vec<String>>,
    /// Metric key to display name.
    pub metric_name_mapping: BTreeMap<String, String>,
    /// Preferred column order by metric key.
    pub metric_sort_order: Option<Vec<String>>,
    /// Emit the `Step` column after `Name`.
    pub include_step: bool,
}

/// A fully laid out report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Order items by an explicit preference list.
///
/// Listed items present in `items` come first in list order; the rest follow
/// in their original order. Returns the ordered indices and the unlisted items.
pub fn order_by_preference<'a>(
    items: &[&'a str],
    order: Option<&[String]>,
) -> (Vec<usize>, Vec<&'a str>) {
    let Some(order) = order.filter(|o| !o.is_empty()) else {
        return ((0..items.len()).collect(), Vec::new());
    };

    let mut ordered = Vec::with_capacity(items.len());
    for wanted in order {
        if let Some(idx) = items.iter().position(|item| item == wanted) {
            if !ordered.contains(&idx) {
                ordered.push(idx);
            }
        }
    }

    let mut unlisted = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        if !ordered.contains(&idx) {
            ordered.push(idx);
            unlisted.push(*item);
        }
    }

    (ordered, unlisted)
}

/// Select and order metric columns.
///
/// `Step` is never a metric column. Listed columns come first in list order,
/// the remainder in ascending lexicographic order.
pub fn order_columns(
    rows: &ReportRows,
    order: Option<&[String]>,
    diagnostics: &mut Diagnostics,
) -> Vec<String> {
    let keys: BTreeSet<&str> = rows
        .iter()
        .flat_map(|(_, metrics)| metrics.keys().map(String::as_str))
        .filter(|k| *k != STEP_COLUMN)
        .collect();
    let sorted: Vec<&str> = keys.into_iter().collect();

    let (ordered, unlisted) = order_by_preference(&sorted, order);
    for metric in unlisted {
        diagnostics.push(Warning::UnlistedMetric {
            metric: metric.to_string(),
        });
    }

    ordered.into_iter().map(|i| sorted[i].to_string()).collect()
}

/// Lay out a report. Returns `None` when there are no models.
pub fn build_table(
    rows: &ReportRows,
    options: &ReportOptions,
    diagnostics: &mut Diagnostics,
) -> Option<ReportTable> {
    if rows.is_empty() {
        return None;
    }

    let models: Vec<&str> = rows.iter().map(|(name, _)| name.as_str()).collect();
    let (row_order, unlisted) =
        order_by_preference(&models, options.model_sort_order.as_deref());
    for model in unlisted {
        diagnostics.push(Warning::UnlistedModel {
            model: model.to_string(),
        });
    }

    let columns = order_columns(rows, options.metric_sort_order.as_deref(), diagnostics);

    let mut header = vec![NAME_COLUMN.to_string()];
    if options.include_step {
        header.push(STEP_COLUMN.to_string());
    }
    for column in &columns {
        header.push(display_name(
            column,
            &options.metric_name_mapping,
            diagnostics,
            |metric| Warning::UnmappedMetric { metric },
        ));
    }

    let body = row_order
        .into_iter()
        .map(|idx| {
            let (model, metrics) = &rows[idx];
            let mut row = vec![display_name(
                model,
                &options.model_name_mapping,
                diagnostics,
                |model| Warning::UnmappedModel { model },
            )];
            if options.include_step {
                row.push(cell(metrics.get(STEP_COLUMN)));
            }
            row.extend(columns.iter().map(|c| cell(metrics.get(c))));
            row
        })
        .collect();

    Some(ReportTable { header, rows: body })
}

/// Mapped display name, or the key itself. Only warns when a mapping is given.
fn display_name(
    key: &str,
    mapping: &BTreeMap<String, String>,
    diagnostics: &mut Diagnostics,
    warning: impl FnOnce(String) -> Warning,
) -> String {
    if mapping.is_empty() {
        return key.to_string();
    }
    match mapping.get(key) {
        Some(name) => name.clone(),
        None => {
            diagnostics.push(warning(key.to_string()));
            key.to_string()
        }
    }
}

fn cell(value: Option<&String>) -> String {
    value.cloned().unwrap_or_else(|| MISSING.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DisplayMetrics;

    fn rows(data: &[(&str, Vec<(&str, &str)>)]) -> ReportRows {
        data.iter()
            .map(|(model, cells)| {
                let metrics: DisplayMetrics = cells
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                (model.to_string(), metrics)
            })
            .collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_layout() {
        let data = rows(&[
            ("Model A", vec![("Acc", "0.95 ±0.01"), ("Loss", "0.1 ±0.02")]),
            ("Model B", vec![("Loss", "0.15 ±0.03"), ("Acc", "0.90 ±0.02")]),
        ]);
        let mut diagnostics = Diagnostics::new();
        let table = build_table(&data, &ReportOptions::default(), &mut diagnostics).unwrap();

        assert_eq!(table.header, strings(&["Name", "Acc", "Loss"]));
        assert_eq!(table.rows[0], strings(&["Model A", "0.95 ±0.01", "0.1 ±0.02"]));
        assert_eq!(table.rows[1], strings(&["Model B", "0.90 ±0.02", "0.15 ±0.03"]));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_model_sort_order() {
        let data = rows(&[("A", vec![("x", "1")]), ("C", vec![("x", "2")])]);
        let options = ReportOptions {
            model_sort_order: Some(strings(&["B", "A"])),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let table = build_table(&data, &options, &mut diagnostics).unwrap();

        let names: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::UnlistedModel {
                model: "C".to_string()
            }]
        );
    }

    #[test]
    fn test_model_sort_order_reorders() {
        let data = rows(&[("A", vec![]), ("B", vec![]), ("C", vec![])]);
        let options = ReportOptions {
            model_sort_order: Some(strings(&["C", "A"])),
            ..Default::default()
        };
        let table = build_table(&data, &options, &mut Diagnostics::new()).unwrap();
        let names: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_metric_sort_order() {
        let data = rows(&[("m", vec![("y", "1"), ("z", "2"), ("x", "3")])]);
        let options = ReportOptions {
            metric_sort_order: Some(strings(&["x", "y"])),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let table = build_table(&data, &options, &mut diagnostics).unwrap();

        assert_eq!(table.header, strings(&["Name", "x", "y", "z"]));
        assert_eq!(table.rows[0], strings(&["m", "3", "1", "2"]));
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::UnlistedMetric {
                metric: "z".to_string()
            }]
        );
    }

    #[test]
    fn test_unlisted_metrics_sorted_after_listed() {
        let data = rows(&[("m", vec![("b", "1"), ("a", "2"), ("ECE", "3"), ("Acc", "4")])]);
        let options = ReportOptions {
            metric_sort_order: Some(strings(&["ECE"])),
            ..Default::default()
        };
        let table = build_table(&data, &options, &mut Diagnostics::new()).unwrap();
        assert_eq!(table.header, strings(&["Name", "ECE", "Acc", "a", "b"]));
    }

    #[test]
    fn test_renaming_with_warnings() {
        let data = rows(&[("mc", vec![("Acc", "1"), ("ECE", "2")]), ("ens", vec![("Acc", "3")])]);
        let options = ReportOptions {
            model_name_mapping: [("mc".to_string(), "MC Dropout".to_string())].into(),
            metric_name_mapping: [("Acc".to_string(), "Accuracy".to_string())].into(),
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let table = build_table(&data, &options, &mut diagnostics).unwrap();

        assert_eq!(table.header, strings(&["Name", "Accuracy", "ECE"]));
        assert_eq!(table.rows[0], strings(&["MC Dropout", "1", "2"]));
        assert_eq!(table.rows[1], strings(&["ens", "3", "N/A"]));
        assert!(diagnostics.warnings().contains(&Warning::UnmappedMetric {
            metric: "ECE".to_string()
        }));
        assert!(diagnostics.warnings().contains(&Warning::UnmappedModel {
            model: "ens".to_string()
        }));
    }

    #[test]
    fn test_step_column() {
        let data = rows(&[("a", vec![("Step", "10"), ("Acc", "1")]), ("b", vec![("Acc", "2")])]);

        let table = build_table(&data, &ReportOptions::default(), &mut Diagnostics::new()).unwrap();
        assert_eq!(table.header, strings(&["Name", "Acc"]));

        let options = ReportOptions {
            include_step: true,
            ..Default::default()
        };
        let table = build_table(&data, &options, &mut Diagnostics::new()).unwrap();
        assert_eq!(table.header, strings(&["Name", "Step", "Acc"]));
        assert_eq!(table.rows[0], strings(&["a", "10", "1"]));
        assert_eq!(table.rows[1], strings(&["b", "N/A", "2"]));
    }

    #[test]
    fn test_empty_rows() {
        assert!(build_table(&Vec::new(), &ReportOptions::default(), &mut Diagnostics::new()).is_none());
    }

    #[test]
    fn test_empty_sort_order_is_ignored() {
        let empty: Vec<String> = Vec::new();
        let (order, unlisted) = order_by_preference(&["b", "a"], Some(empty.as_slice()));
        assert_eq!(order, vec![0, 1]);
        assert!(unlisted.is_empty());
    }
}

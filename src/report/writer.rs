//! CSV output of metric reports.

use super::table::{build_table, ReportOptions, ReportTable};
use crate::error::Result;
use crate::models::{Diagnostics, ReportRows, Warning};
use std::path::Path;
use tracing::info;

/// Write a laid out table to `path`, replacing any existing file.
pub fn write_table(table: &ReportTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Lay out and save a report.
///
/// Returns `Ok(false)` without touching the file system when there are no
/// models; an [`Warning::EmptyReport`] is recorded instead.
pub fn save_metrics_to_csv(
    rows: &ReportRows,
    path: &Path,
    options: &ReportOptions,
    diagnostics: &mut Diagnostics,
) -> Result<bool> {
    let Some(table) = build_table(rows, options, diagnostics) else {
        diagnostics.push(Warning::EmptyReport {
            path: path.to_path_buf(),
        });
        return Ok(false);
    };

    write_table(&table, path)?;
    info!("Wrote {} rows to {}", table.rows.len(), path.display());
    Ok(true)
}

use crate::error::ReportResult;
use crate::stats::AnalyticsSummary;
use crate::types::{MetricPreviewRow, ReportArtifact};
use crate::util::{truncate, TABLE_CELL_MAX};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table};
use tracing::info;

/// Write `artifact` into `dir` under its own filename and return the full path.
pub fn write_artifact(dir: impl AsRef<Path>, artifact: &ReportArtifact) -> ReportResult<PathBuf> {
    let path = dir.as_ref().join(&artifact.filename);
    std::fs::write(&path, &artifact.bytes)?;
    info!(path = %path.display(), bytes = artifact.bytes.len(), "artifact written");
    Ok(path)
}

pub fn preview_rows(summary: &AnalyticsSummary) -> Vec<MetricPreviewRow> {
    summary
        .entries()
        .into_iter()
        .map(|(metric, value)| MetricPreviewRow {
            metric: truncate(metric, TABLE_CELL_MAX),
            value: truncate(&value, TABLE_CELL_MAX),
        })
        .collect()
}

pub fn preview_table(summary: &AnalyticsSummary) -> String {
    Table::new(preview_rows(summary)).with(Style::markdown()).to_string()
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::report::{LoadTestReport, RequestRecord, RunSummary};

pub const CSV_HEADER: &str = "id,username,status,elapsed_ms,output";

/// Writes the per-request CSV table and the JSON summary under `dir`,
/// timestamp-named so repeated runs never collide.
pub fn write_artifacts(dir: &Path, report: &LoadTestReport) -> Result<(PathBuf, PathBuf)> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let csv_path = dir.join(format!("radius_results_{stamp}.csv"));
    let json_path = dir.join(format!("radius_summary_{stamp}.json"));

    fs::write(&csv_path, records_csv(&report.records))
        .with_context(|| format!("failed to write `{}`", csv_path.display()))?;
    fs::write(&json_path, summary_json(&report.summary)?)
        .with_context(|| format!("failed to write `{}`", json_path.display()))?;

    Ok((csv_path, json_path))
}

fn records_csv(records: &[RequestRecord]) -> String {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');
    for record in records {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            record.id,
            csv_escape(&record.username),
            record.status.as_str(),
            record.elapsed_ms,
            csv_escape(&record.output)
        ));
    }
    out
}

fn summary_json(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("serialize run summary")
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use super::result::{RunReport, Summary};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportDocument<'a> {
    #[serde(flatten)]
    report: &'a RunReport,
    base_url: &'a str,
    summary: Summary,
    exit_code: i32,
}

/// Render a finished run as pretty JSON.
pub fn render_report(report: &RunReport, base_url: &str) -> Result<String> {
    let summary = report.summary();
    let document = ReportDocument {
        report,
        base_url,
        summary,
        exit_code: summary.exit_code(),
    };
    serde_json::to_string_pretty(&document).context("serializing run report")
}

pub fn write_report(path: &Path, report: &RunReport, base_url: &str) -> Result<()> {
    let rendered = render_report(report, base_url)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    fs::write(path, rendered).with_context(|| format!("writing report to {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote run report");
    Ok(())
}

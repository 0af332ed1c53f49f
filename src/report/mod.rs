// Presentation of a finished run: text summary, ASCII timeline, CSV samples, JSON report.

pub mod csv;
pub mod summary;
pub mod timeline;

use std::path::Path;

use crate::models::Report;

pub fn write_report_json(path: &str, report: &Report) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

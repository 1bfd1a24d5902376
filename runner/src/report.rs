//! One-shot report: run the agent once and save its answer to a fresh file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::io::agent::{AgentRunner, generate_chunk};

const REPORT_STEM: &str = "report";
const REPORT_EXTENSION: &str = "md";

/// First free name among `report.md`, `report1.md`, `report2.md`, ... in `dir`.
pub fn next_report_path(dir: &Path) -> PathBuf {
    let mut candidate = dir.join(format!("{REPORT_STEM}.{REPORT_EXTENSION}"));
    let mut counter = 0u32;
    while candidate.exists() {
        counter += 1;
        candidate = dir.join(format!("{REPORT_STEM}{counter}.{REPORT_EXTENSION}"));
    }
    candidate
}

/// Write `content` to the next free report path and return that path.
pub fn write_report(dir: &Path, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create report dir {}", dir.display()))?;
    let path = next_report_path(dir);
    fs::write(&path, content).with_context(|| format!("write report {}", path.display()))?;
    info!(path = %path.display(), bytes = content.len(), "report saved");
    Ok(path)
}

/// Run `runner` with empty input and save the output as a new report.
pub fn run_report<A: AgentRunner>(runner: &A, dir: &Path) -> Result<PathBuf> {
    let output = generate_chunk(runner, String::new())?;
    write_report(dir, &output)
}

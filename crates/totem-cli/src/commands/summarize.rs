//! `totem summarize`

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use totem_tribe::{decode_fact_log, TribeFactDelta, TribeFactReducer};

/// Counts over a persisted fact log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogSummary {
    /// Bindings in the file
    pub facts: usize,
    /// Bindings that are not tribe facts or did not decode
    pub skipped: usize,
    /// Per-kind counts
    pub summary: TribeFactDelta,
}

/// Read and reduce a fact log written by `totem run --facts-out`.
pub fn load(path: &Path) -> Result<LogSummary> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read fact log {}", path.display()))?;
    let encoded = decode_fact_log(&bytes)
        .with_context(|| format!("Invalid fact log {}", path.display()))?;

    let (summary, skipped) = TribeFactReducer.reduce_encoded(&encoded);
    if skipped > 0 {
        tracing::warn!(path = %path.display(), skipped, "Skipped undecodable facts");
    }
    Ok(LogSummary {
        facts: encoded.len(),
        skipped,
        summary,
    })
}

/// Print the summary of a fact log as JSON.
pub fn run(path: &Path) -> Result<()> {
    let summary = load(path)?;
    let json = serde_json::to_string_pretty(&summary).context("Failed to encode summary")?;
    println!("{json}");
    Ok(())
}

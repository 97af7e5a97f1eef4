//! `totem check-config`

use anyhow::{Context, Result};
use std::path::Path;
use totem_core::ConfigLoad;
use totem_tribe::GovernanceConfig;

/// Load and validate a governance configuration file.
pub fn load(path: &Path) -> Result<GovernanceConfig> {
    GovernanceConfig::load_from_file(path)
        .with_context(|| format!("Invalid configuration {}", path.display()))
}

/// Validate a configuration file and print a short summary.
pub fn run(path: &Path) -> Result<()> {
    let config = load(path)?;
    tracing::info!(path = %path.display(), "Configuration valid");
    println!("admin: {}", config.admin);
    println!("max_tribe_name_len: {}", describe_limit(config.max_tribe_name_len));
    println!("max_artifact_uri_len: {}", describe_limit(config.max_artifact_uri_len));
    println!("allow_empty_artifact_uri: {}", config.allow_empty_artifact_uri);
    Ok(())
}

fn describe_limit(limit: Option<usize>) -> String {
    limit.map_or_else(|| "unbounded".to_string(), |limit| limit.to_string())
}

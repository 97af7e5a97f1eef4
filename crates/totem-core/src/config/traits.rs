//! Core configuration traits

use crate::config::validation::ValidationError;
use crate::TotemError;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Trait for configuration validation
pub trait ConfigValidation {
    /// Validate this configuration, returning the first violated rule
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Trait for configuration types loadable from TOML files
pub trait ConfigLoad: DeserializeOwned + ConfigValidation + Sized {
    /// Parse and validate configuration from a TOML string
    fn from_toml_str(content: &str) -> Result<Self, TotemError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    fn load_from_file(path: &Path) -> Result<Self, TotemError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TotemError::from(e)
                .with_context(format!("Failed to read config file {}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }
}

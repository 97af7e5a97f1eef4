//! Governance configuration
//!
//! Loaded from TOML by the embedding runtime. Only `admin` is required; the
//! input limits are opt-in and every tribe name and artifact URI is accepted
//! when they are left unset:
//!
//! ```toml
//! admin = "addr-00000000-0000-0000-0000-000000000001"
//! max_tribe_name_len = 64
//! max_artifact_uri_len = 2048
//! allow_empty_artifact_uri = false
//! ```

use crate::error::TribeError;
use serde::{Deserialize, Serialize};
use totem_core::{Address, ConfigLoad, ConfigValidation, ConfigValidator, ValidationError};

/// Configuration for the governance service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Initial global admin (contract owner)
    pub admin: Address,

    /// Maximum tribe display name length in bytes, unbounded when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tribe_name_len: Option<usize>,

    /// Maximum initiation artifact URI length in bytes, unbounded when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_artifact_uri_len: Option<usize>,

    /// Whether a join request may carry an empty artifact URI
    #[serde(default = "GovernanceConfig::default_allow_empty_artifact_uri")]
    pub allow_empty_artifact_uri: bool,
}

impl GovernanceConfig {
    fn default_allow_empty_artifact_uri() -> bool {
        true
    }

    /// No input limits, with the given admin
    pub fn with_admin(admin: Address) -> Self {
        Self {
            admin,
            max_tribe_name_len: None,
            max_artifact_uri_len: None,
            allow_empty_artifact_uri: Self::default_allow_empty_artifact_uri(),
        }
    }

    /// Check a tribe name against the configured limit.
    pub fn check_tribe_name(&self, name: &str) -> Result<(), TribeError> {
        match self.max_tribe_name_len {
            Some(limit) if name.len() > limit => Err(TribeError::invalid_input(format!(
                "tribe name is {} bytes, limit is {limit}",
                name.len()
            ))),
            _ => Ok(()),
        }
    }

    /// Check an initiation artifact URI against the configured limits.
    pub fn check_artifact_uri(&self, uri: &str) -> Result<(), TribeError> {
        if uri.is_empty() && !self.allow_empty_artifact_uri {
            return Err(TribeError::invalid_input("initiation artifact URI is empty"));
        }
        match self.max_artifact_uri_len {
            Some(limit) if uri.len() > limit => Err(TribeError::invalid_input(format!(
                "initiation artifact URI is {} bytes, limit is {limit}",
                uri.len()
            ))),
            _ => Ok(()),
        }
    }
}

impl ConfigValidation for GovernanceConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = ConfigValidator::new();
        validator.custom(
            "admin",
            &self.admin,
            |admin| !admin.uuid().is_nil(),
            "must not be the nil address",
        );
        if let Some(limit) = self.max_tribe_name_len {
            validator.range("max_tribe_name_len", limit, Some(1), None);
        }
        if let Some(limit) = self.max_artifact_uri_len {
            validator.range("max_artifact_uri_len", limit, Some(1), None);
        }
        validator.result()
    }
}

impl ConfigLoad for GovernanceConfig {}

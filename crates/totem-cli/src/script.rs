//! Governance replay scripts
//!
//! A script is a TOML document of `[[step]]` tables, each naming an
//! operation with `op` and the calling address with `caller`:
//!
//! ```toml
//! [[step]]
//! op = "create_tribe"
//! caller = "addr-00000000-0000-0000-0000-000000000001"
//! name = "Warriors"
//! leader = "addr-00000000-0000-0000-0000-000000000002"
//! quorum_threshold = 0
//!
//! [[step]]
//! op = "request_join"
//! caller = "addr-00000000-0000-0000-0000-000000000003"
//! tribe_id = 1
//! uri = "ipfs://initiation"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use totem_core::{Address, JoinRequestId, TribeId};

fn default_requires_approval() -> bool {
    true
}

/// One scripted operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Create a tribe
    CreateTribe {
        /// Calling address
        caller: Address,
        /// Display name
        name: String,
        /// Leader address
        leader: Address,
        /// Whether joining needs approval (default `true`)
        #[serde(default = "default_requires_approval")]
        requires_approval: bool,
        /// Votes required, `0` for leader/admin approval
        #[serde(default)]
        quorum_threshold: u32,
    },
    /// Submit a join request as `caller`
    RequestJoin {
        /// Applicant address
        caller: Address,
        /// Tribe to join
        tribe_id: TribeId,
        /// Initiation artifact URI
        uri: String,
    },
    /// Approve a join request
    Approve {
        /// Calling address
        caller: Address,
        /// Request to approve
        request_id: JoinRequestId,
    },
    /// Reject a join request
    Reject {
        /// Calling address
        caller: Address,
        /// Request to reject
        request_id: JoinRequestId,
    },
    /// Admit a member directly
    AddMember {
        /// Calling address
        caller: Address,
        /// Tribe to add to
        tribe_id: TribeId,
        /// Address to admit
        member: Address,
    },
    /// Hand over the admin role
    TransferAdmin {
        /// Calling address
        caller: Address,
        /// Incoming admin
        new_admin: Address,
    },
}

impl Step {
    /// Operation name as written in the script.
    pub fn op(&self) -> &'static str {
        match self {
            Step::CreateTribe { .. } => "create_tribe",
            Step::RequestJoin { .. } => "request_join",
            Step::Approve { .. } => "approve",
            Step::Reject { .. } => "reject",
            Step::AddMember { .. } => "add_member",
            Step::TransferAdmin { .. } => "transfer_admin",
        }
    }

    /// Address the step runs as.
    pub fn caller(&self) -> Address {
        match self {
            Step::CreateTribe { caller, .. }
            | Step::RequestJoin { caller, .. }
            | Step::Approve { caller, .. }
            | Step::Reject { caller, .. }
            | Step::AddMember { caller, .. }
            | Step::TransferAdmin { caller, .. } => *caller,
        }
    }
}

/// An ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Script {
    /// Steps in execution order
    #[serde(rename = "step", default)]
    pub steps: Vec<Step>,
}

impl Script {
    /// Parse a script from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid script")
    }

    /// Read and parse a script file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::from_toml_str(&content)
    }
}

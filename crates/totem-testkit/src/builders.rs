//! Service builders
//!
//! `TribeServiceBuilder` assembles a `TribeService` backed by a
//! `MockArtifactIssuer`; `seed_tribe` creates a tribe and admits its initial
//! members through the direct-admission path.

use crate::fixtures::{as_admin, test_address, test_config};
use crate::mocks::MockArtifactIssuer;
use totem_core::{Address, TribeId};
use totem_tribe::{GovernanceConfig, TribeService};

/// Service type produced by `TribeServiceBuilder`.
pub type MockTribeService = TribeService<MockArtifactIssuer>;

/// Builder for a service under test.
#[derive(Debug, Clone)]
pub struct TribeServiceBuilder {
    config: GovernanceConfig,
    issuer: MockArtifactIssuer,
}

impl Default for TribeServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TribeServiceBuilder {
    /// Default configuration, test admin and a succeeding issuer.
    pub fn new() -> Self {
        Self {
            config: test_config(),
            issuer: MockArtifactIssuer::new(),
        }
    }

    /// Use a different global admin.
    pub fn with_admin(mut self, admin: Address) -> Self {
        self.config.admin = admin;
        self
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: GovernanceConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a specific issuer, typically a clone the test keeps a handle to.
    pub fn with_issuer(mut self, issuer: MockArtifactIssuer) -> Self {
        self.issuer = issuer;
        self
    }

    /// Build the service. Panics on an invalid configuration.
    pub fn build(self) -> MockTribeService {
        TribeService::new(self.config, self.issuer).expect("test configuration must be valid")
    }
}

/// Create a tribe as the default admin and directly admit `member_seeds`.
///
/// Assumes the service's admin is the default test admin.
pub fn seed_tribe(
    service: &mut MockTribeService,
    name: &str,
    leader_seed: u8,
    quorum_threshold: u32,
    member_seeds: &[u8],
) -> TribeId {
    let tribe_id = service
        .create_tribe(
            &as_admin(),
            name,
            test_address(leader_seed),
            true,
            quorum_threshold,
        )
        .unwrap();
    for seed in member_seeds {
        service
            .add_member_directly(&as_admin(), tribe_id, test_address(*seed))
            .unwrap();
    }
    tribe_id
}

//! Governance Test Fixtures
//!
//! Deterministic addresses and call contexts derived from a one-byte seed.
//! Seed `1` is the default global admin throughout the testkit.

use totem_core::{Address, CallContext};
use totem_tribe::GovernanceConfig;

/// Seed of the default global admin.
pub const ADMIN_SEED: u8 = 1;

/// Create a test address with a given seed.
pub fn test_address(seed: u8) -> Address {
    Address::new_from_entropy([seed; 32])
}

/// The default global admin address.
pub fn test_admin() -> Address {
    test_address(ADMIN_SEED)
}

/// Call context for the address with a given seed.
pub fn as_caller(seed: u8) -> CallContext {
    CallContext::new(test_address(seed))
}

/// Call context for the default global admin.
pub fn as_admin() -> CallContext {
    as_caller(ADMIN_SEED)
}

/// Default configuration with the test admin.
pub fn test_config() -> GovernanceConfig {
    GovernanceConfig::with_admin(test_admin())
}

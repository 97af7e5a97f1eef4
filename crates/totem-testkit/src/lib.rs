//! Totem Testing Infrastructure
//!
//! Shared fixtures, a mock artifact issuer and a service builder, so test
//! modules across the workspace set up governance state the same way.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! Add this to your crate's `Cargo.toml` dev-dependencies:
//! ```toml
//! [dev-dependencies]
//! totem-testkit = { path = "../totem-testkit" }
//! ```
//!
//! Then in your integration tests:
//! ```rust,ignore
//! use totem_testkit::*;
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let mut service = TribeServiceBuilder::new().build();
//!     let tribe_id = seed_tribe(&mut service, "Council", 2, 3, &[10, 11, 12]);
//!     // ... test logic
//! }
//! ```

pub mod builders;
pub mod fixtures;
pub mod mocks;

pub use builders::*;
pub use fixtures::*;
pub use mocks::*;

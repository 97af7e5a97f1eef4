//! Effect interfaces for external collaborators
//!
//! Pure trait signatures only. Implementations live with the runtime that
//! embeds the governance core (and in `totem-testkit` for tests).

pub mod artifact;

pub use artifact::{ArtifactError, InitiationArtifactEffects};

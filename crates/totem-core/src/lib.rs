//! Totem Core - shared foundation for tribe governance
//!
//! This crate holds the types every other Totem crate speaks in. It contains no
//! governance logic of its own.
//!
//! # Contents
//!
//! - `identifiers`: `Address`, `TribeId`, `JoinRequestId`, `ArtifactId`, `LedgerPosition`
//! - `errors`: the unified `TotemError` and `Result` alias
//! - `effects`: interfaces for external collaborators (artifact issuance)
//! - `config`: configuration loading and validation traits

#![forbid(unsafe_code)]

/// Principal and arena identifiers
pub mod identifiers;

/// Unified error handling
pub mod errors;

/// Interfaces to external collaborators
pub mod effects;

/// Configuration loading and validation
pub mod config;

pub use config::{ConfigLoad, ConfigValidation, ConfigValidator, ValidationError};
pub use effects::{ArtifactError, InitiationArtifactEffects};
pub use errors::{Result, TotemError};
pub use identifiers::{Address, ArtifactId, CallContext, JoinRequestId, LedgerPosition, TribeId};

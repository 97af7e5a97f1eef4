//! Configuration loading and validation
//!
//! Configuration types are plain serde structs. They opt into file loading via
//! `ConfigLoad` and describe their invariants via `ConfigValidation`, which
//! collects problems through a `ConfigValidator`.

pub mod traits;
pub mod validation;

pub use traits::{ConfigLoad, ConfigValidation};
pub use validation::{ConfigValidator, ValidationError, ValidationResult};

//! Totem Tribe - Membership Governance
//!
//! This crate decides who may join a tribe and when. It provides:
//!
//! - `TribeRegistry`: tribes, their approval policy and live membership
//! - `JoinRequestLedger`: join requests, vote accumulation and finalization
//! - `GovernanceEngine`: pure approval and rejection decisions
//! - `AuthorizationGate`: global admin, tribe leader and tribe member predicates
//! - `TribeService`: the coordinator that runs each operation as one unit
//!
//! # Architecture
//!
//! The registry exclusively owns tribe membership and the ledger exclusively
//! owns request votes and outcomes. The engine reads both and returns a
//! decision; the service applies it through the owners and appends a
//! `TribeFact` for every change.
//!
//! # Example
//!
//! ```ignore
//! use totem_core::CallContext;
//! use totem_tribe::{GovernanceConfig, TribeService};
//!
//! let mut service = TribeService::new(GovernanceConfig::with_admin(admin), issuer)?;
//! let tribe_id = service.create_tribe(&CallContext::new(admin), "Warriors", leader, true, 0)?;
//!
//! let request_id = service
//!     .request_to_join_tribe(&CallContext::new(applicant), tribe_id, "ipfs://initiation")
//!     .await?;
//! service.approve_join_request(&CallContext::new(leader), request_id)?;
//! assert!(service.is_tribe_member(tribe_id, &applicant));
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod facts;
pub mod gate;
pub mod governance;
pub mod ledger;
pub mod registry;
pub mod service;

// Re-export primary types
pub use config::GovernanceConfig;
pub use error::{ErrorKind, TribeError};
pub use facts::{
    decode_fact_log, encode_fact_log, AdmissionPath, EncodedFact, FactLog, FinalOutcome,
    RecordedFact, TribeFact, TribeFactDelta, TribeFactReducer, TRIBE_FACT_SCHEMA_VERSION,
    TRIBE_FACT_TYPE_ID,
};
pub use gate::{AuthorizationGate, CallerRoles, Role};
pub use governance::{ApprovalDecision, GovernanceEngine};
pub use ledger::{JoinRequest, JoinRequestLedger, RequestStatus};
pub use registry::{ApprovalPolicy, Tribe, TribeRegistry};
pub use service::{ApprovalOutcome, GovernanceSnapshot, RequestProgress, TribeService};

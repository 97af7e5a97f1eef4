//! Tribe governance error types
//!
//! Every failure is detected by a precondition check before any state is
//! touched, so an error always means "the operation did not happen".

use serde::{Deserialize, Serialize};
use thiserror::Error;
use totem_core::{Address, ArtifactError, JoinRequestId, TotemError, TribeId};

/// Coarse failure kinds callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Tribe or request id unknown
    NotFound,
    /// Caller lacks the role required for the attempted transition
    Unauthorized,
    /// Membership precondition violated
    AlreadyMember,
    /// Applicant already has an unprocessed request for the tribe
    DuplicateRequest,
    /// Same member voting twice on one request
    DuplicateVote,
    /// Mutation attempted on a terminal request
    AlreadyProcessed,
    /// Artifact collaborator failed
    ExternalIssuanceFailed,
    /// Input outside configured limits
    InvalidInput,
}

/// Errors from tribe governance operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TribeError {
    /// Tribe not found.
    #[error("tribe {0} not found")]
    TribeNotFound(TribeId),

    /// Join request not found.
    #[error("join request {0} not found")]
    RequestNotFound(JoinRequestId),

    /// Caller is not allowed to perform the action.
    #[error("{caller} is not authorized to {action}")]
    Unauthorized {
        /// The rejected caller
        caller: Address,
        /// Operation that was attempted
        action: &'static str,
    },

    /// Address is already a member of the tribe.
    #[error("{address} is already a member of tribe {tribe_id}")]
    AlreadyMember {
        /// The tribe in question
        tribe_id: TribeId,
        /// The existing member
        address: Address,
    },

    /// Applicant already has an unprocessed request for this tribe.
    #[error("{applicant} already has pending request {pending} for tribe {tribe_id}")]
    DuplicateRequest {
        /// The tribe in question
        tribe_id: TribeId,
        /// The applicant
        applicant: Address,
        /// The request still awaiting a decision
        pending: JoinRequestId,
    },

    /// Voter already approved this request.
    #[error("{voter} has already approved join request {request_id}")]
    DuplicateVote {
        /// The request in question
        request_id: JoinRequestId,
        /// The repeat voter
        voter: Address,
    },

    /// Request has already been finalized.
    #[error("join request {0} has already been processed")]
    AlreadyProcessed(JoinRequestId),

    /// Initiation artifact could not be issued.
    #[error("initiation artifact issuance failed: {0}")]
    ExternalIssuanceFailed(ArtifactError),

    /// Input rejected by configured limits.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Why the input was rejected
        reason: String,
    },
}

impl TribeError {
    /// Create an unauthorized error.
    pub fn unauthorized(caller: Address, action: &'static str) -> Self {
        Self::Unauthorized { caller, action }
    }

    /// Create an already-member error.
    pub fn already_member(tribe_id: TribeId, address: Address) -> Self {
        Self::AlreadyMember { tribe_id, address }
    }

    /// Create an invalid input error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// The failure kind, for callers that branch on it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TribeError::TribeNotFound(_) | TribeError::RequestNotFound(_) => ErrorKind::NotFound,
            TribeError::Unauthorized { .. } => ErrorKind::Unauthorized,
            TribeError::AlreadyMember { .. } => ErrorKind::AlreadyMember,
            TribeError::DuplicateRequest { .. } => ErrorKind::DuplicateRequest,
            TribeError::DuplicateVote { .. } => ErrorKind::DuplicateVote,
            TribeError::AlreadyProcessed(_) => ErrorKind::AlreadyProcessed,
            TribeError::ExternalIssuanceFailed(_) => ErrorKind::ExternalIssuanceFailed,
            TribeError::InvalidInput { .. } => ErrorKind::InvalidInput,
        }
    }
}

impl From<ArtifactError> for TribeError {
    fn from(err: ArtifactError) -> Self {
        Self::ExternalIssuanceFailed(err)
    }
}

impl From<TribeError> for TotemError {
    fn from(err: TribeError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => TotemError::not_found(message),
            ErrorKind::Unauthorized => TotemError::permission_denied(message),
            ErrorKind::AlreadyMember
            | ErrorKind::DuplicateRequest
            | ErrorKind::DuplicateVote
            | ErrorKind::AlreadyProcessed => TotemError::conflict(message),
            ErrorKind::ExternalIssuanceFailed => TotemError::external(message),
            ErrorKind::InvalidInput => TotemError::invalid(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_address(seed: u8) -> Address {
        Address::new_from_entropy([seed; 32])
    }

    #[test]
    fn test_error_display() {
        let err = TribeError::unauthorized(test_address(1), "approve join requests");
        assert!(err.to_string().contains("not authorized to approve join requests"));

        let err = TribeError::DuplicateRequest {
            tribe_id: TribeId::new(3),
            applicant: test_address(2),
            pending: JoinRequestId::new(9),
        };
        assert!(err.to_string().contains("request-9"));
        assert!(err.to_string().contains("tribe-3"));
    }

    #[test]
    fn test_kinds_are_distinct() {
        let errors = [
            TribeError::TribeNotFound(TribeId::new(1)),
            TribeError::unauthorized(test_address(1), "x"),
            TribeError::already_member(TribeId::new(1), test_address(1)),
            TribeError::DuplicateRequest {
                tribe_id: TribeId::new(1),
                applicant: test_address(1),
                pending: JoinRequestId::new(1),
            },
            TribeError::DuplicateVote {
                request_id: JoinRequestId::new(1),
                voter: test_address(1),
            },
            TribeError::AlreadyProcessed(JoinRequestId::new(1)),
            TribeError::ExternalIssuanceFailed(ArtifactError::Unavailable {
                reason: "down".to_string(),
            }),
            TribeError::invalid_input("too long"),
        ];

        let kinds: std::collections::HashSet<_> = errors.iter().map(TribeError::kind).collect();
        assert_eq!(kinds.len(), errors.len());
        assert_eq!(
            TribeError::RequestNotFound(JoinRequestId::new(4)).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_conversion_to_unified_error() {
        let err: TotemError = TribeError::unauthorized(test_address(1), "x").into();
        assert!(matches!(err, TotemError::PermissionDenied { .. }));

        let err: TotemError = TribeError::AlreadyProcessed(JoinRequestId::new(2)).into();
        assert!(matches!(err, TotemError::Conflict { .. }));
    }
}

//! Join-request ledger
//!
//! Owns the lifecycle of applications to join a tribe:
//!
//! ```text
//! Pending ──(threshold met / authority approval)──> Approved
//!    └────────────(leader or admin rejection)─────> Rejected
//! ```
//!
//! The ledger is the only writer of `approvers`, `processed` and `approved`.
//! It also enforces that each `(tribe, applicant)` pair has at most one
//! unprocessed request.
//!
//! Requests have no expiry. A request whose quorum can never be reached stays
//! `Pending` indefinitely; that liveness gap is accepted.

use crate::error::TribeError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use totem_core::{Address, ArtifactId, JoinRequestId, TribeId};

/// Derived status of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Awaiting a decision
    Pending,
    /// Finalized, applicant admitted
    Approved,
    /// Finalized, applicant not admitted
    Rejected,
}

/// An applicant's ask to join a tribe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Unique request identifier
    pub request_id: JoinRequestId,
    /// Tribe being applied to
    pub tribe_id: TribeId,
    /// Address that submitted the request
    pub applicant: Address,
    /// Opaque URI handed to the artifact issuer
    pub initiation_artifact_uri: String,
    /// Artifact minted when the request was submitted
    pub artifact_id: ArtifactId,
    /// Terminal flag; no transitions once set
    pub processed: bool,
    /// Outcome, meaningful only once `processed` is set
    pub approved: bool,
    /// Members that have cast an approval vote
    pub approvers: BTreeSet<Address>,
}

impl JoinRequest {
    /// Number of distinct approvals recorded.
    pub fn approval_count(&self) -> usize {
        self.approvers.len()
    }

    /// Whether `address` has already voted on this request.
    pub fn has_approved(&self, address: &Address) -> bool {
        self.approvers.contains(address)
    }

    /// Check if the request is still awaiting a decision.
    pub fn is_pending(&self) -> bool {
        !self.processed
    }

    /// Current status.
    pub fn status(&self) -> RequestStatus {
        match (self.processed, self.approved) {
            (false, _) => RequestStatus::Pending,
            (true, true) => RequestStatus::Approved,
            (true, false) => RequestStatus::Rejected,
        }
    }

    /// Fail with `AlreadyProcessed` unless the request is pending.
    pub fn ensure_pending(&self) -> Result<(), TribeError> {
        if self.processed {
            return Err(TribeError::AlreadyProcessed(self.request_id));
        }
        Ok(())
    }
}

/// Arena of join requests plus the pending-request index.
#[derive(Debug, Clone)]
pub struct JoinRequestLedger {
    requests: BTreeMap<JoinRequestId, JoinRequest>,
    pending: HashMap<(TribeId, Address), JoinRequestId>,
    next_id: JoinRequestId,
}

impl Default for JoinRequestLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl JoinRequestLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            requests: BTreeMap::new(),
            pending: HashMap::new(),
            next_id: JoinRequestId::FIRST,
        }
    }

    /// Id the next submitted request will receive.
    pub fn next_id(&self) -> JoinRequestId {
        self.next_id
    }

    /// Unprocessed request for `(tribe_id, applicant)`, if any.
    pub fn pending_for(&self, tribe_id: TribeId, applicant: &Address) -> Option<JoinRequestId> {
        self.pending.get(&(tribe_id, *applicant)).copied()
    }

    /// Fail with `DuplicateRequest` if the applicant already has a pending request.
    pub fn ensure_no_pending(
        &self,
        tribe_id: TribeId,
        applicant: &Address,
    ) -> Result<(), TribeError> {
        match self.pending_for(tribe_id, applicant) {
            Some(pending) => Err(TribeError::DuplicateRequest {
                tribe_id,
                applicant: *applicant,
                pending,
            }),
            None => Ok(()),
        }
    }

    /// Store a new pending request and return its id.
    pub fn submit(
        &mut self,
        tribe_id: TribeId,
        applicant: Address,
        initiation_artifact_uri: impl Into<String>,
        artifact_id: ArtifactId,
    ) -> Result<JoinRequestId, TribeError> {
        self.ensure_no_pending(tribe_id, &applicant)?;

        let request_id = self.next_id;
        self.next_id = request_id.next();
        self.requests.insert(
            request_id,
            JoinRequest {
                request_id,
                tribe_id,
                applicant,
                initiation_artifact_uri: initiation_artifact_uri.into(),
                artifact_id,
                processed: false,
                approved: false,
                approvers: BTreeSet::new(),
            },
        );
        self.pending.insert((tribe_id, applicant), request_id);
        Ok(request_id)
    }

    /// Look up a request.
    pub fn get(&self, request_id: JoinRequestId) -> Result<&JoinRequest, TribeError> {
        self.requests
            .get(&request_id)
            .ok_or(TribeError::RequestNotFound(request_id))
    }

    fn get_pending_mut(
        &mut self,
        request_id: JoinRequestId,
    ) -> Result<&mut JoinRequest, TribeError> {
        let request = self
            .requests
            .get_mut(&request_id)
            .ok_or(TribeError::RequestNotFound(request_id))?;
        request.ensure_pending()?;
        Ok(request)
    }

    /// Record an approval vote and return the new approval count.
    pub fn record_approval(
        &mut self,
        request_id: JoinRequestId,
        approver: Address,
    ) -> Result<usize, TribeError> {
        let request = self.get_pending_mut(request_id)?;
        if !request.approvers.insert(approver) {
            return Err(TribeError::DuplicateVote {
                request_id,
                voter: approver,
            });
        }
        Ok(request.approval_count())
    }

    /// Mark a pending request processed with the given outcome.
    pub fn finalize(
        &mut self,
        request_id: JoinRequestId,
        approved: bool,
    ) -> Result<&JoinRequest, TribeError> {
        let request = self.get_pending_mut(request_id)?;
        request.processed = true;
        request.approved = approved;
        let key = (request.tribe_id, request.applicant);
        self.pending.remove(&key);
        self.get(request_id)
    }

    /// Pending requests for a tribe, in submission order.
    pub fn pending_for_tribe(&self, tribe_id: TribeId) -> Vec<&JoinRequest> {
        self.requests
            .values()
            .filter(|request| request.tribe_id == tribe_id && request.is_pending())
            .collect()
    }

    /// Iterate over all requests in id order.
    pub fn iter(&self) -> impl Iterator<Item = &JoinRequest> {
        self.requests.values()
    }

    /// Number of requests ever submitted.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether no request has been submitted yet.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

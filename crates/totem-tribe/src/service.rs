//! Tribe Service
//!
//! Main coordinator for tribe governance operations.
//!
//! # Architecture
//!
//! Every public mutation follows the same order:
//!
//! 1. Resolve the caller from the `CallContext` and validate inputs
//! 2. Capture the caller's roles through the `AuthorizationGate`
//! 3. Ask the `GovernanceEngine` for a decision (pure, no mutation)
//! 4. Apply the decision through the owning component (`TribeRegistry` or
//!    `JoinRequestLedger`) and append the resulting facts
//!
//! All fallible checks happen before step 4, so a failed call leaves no trace.
//! Mutations take `&mut self`, which serializes operations one whole call at a
//! time. The only await point is the artifact issuer call inside
//! `request_to_join_tribe`; it runs after validation and before any write, so
//! an issuer failure discards the submission entirely.

use crate::config::GovernanceConfig;
use crate::error::TribeError;
use crate::facts::{
    AdmissionPath, FactLog, FinalOutcome, RecordedFact, TribeFact, TribeFactDelta,
    TribeFactReducer,
};
use crate::gate::AuthorizationGate;
use crate::governance::{ApprovalDecision, GovernanceEngine};
use crate::ledger::{JoinRequest, JoinRequestLedger, RequestStatus};
use crate::registry::{Tribe, TribeRegistry};
use serde::{Deserialize, Serialize};
use totem_core::{
    Address, CallContext, ConfigValidation, InitiationArtifactEffects, JoinRequestId,
    LedgerPosition, TotemError, TribeId,
};

/// Result of an approval call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalOutcome {
    /// Vote recorded, threshold not reached yet
    Pending {
        /// Tally after this vote
        approvals: usize,
        /// Votes required
        required: u32,
    },
    /// Request finalized approved
    Finalized {
        /// `false` if the applicant was already a member by another path
        newly_admitted: bool,
    },
}

impl ApprovalOutcome {
    /// Whether the call finalized the request.
    pub fn is_finalized(&self) -> bool {
        matches!(self, ApprovalOutcome::Finalized { .. })
    }
}

/// Status of a join request as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestProgress {
    /// Awaiting a decision
    Pending {
        /// Distinct approvals so far
        approvals: usize,
        /// Tribe's quorum threshold; `0` for leader/admin approval
        required: u32,
    },
    /// Finalized, applicant admitted
    Approved,
    /// Finalized, applicant not admitted
    Rejected,
}

/// Serializable view of the whole governance state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    /// Current global admin
    pub admin: Address,
    /// All tribes in id order
    pub tribes: Vec<Tribe>,
    /// All join requests in id order
    pub requests: Vec<JoinRequest>,
    /// Id the next created tribe will receive
    pub next_tribe_id: TribeId,
    /// Id the next submitted request will receive
    pub next_request_id: JoinRequestId,
    /// Position the next fact will receive
    pub next_position: LedgerPosition,
}

/// Tribe governance service.
pub struct TribeService<I: InitiationArtifactEffects> {
    config: GovernanceConfig,
    admin: Address,
    registry: TribeRegistry,
    ledger: JoinRequestLedger,
    facts: FactLog,
    issuer: I,
}

impl<I: InitiationArtifactEffects> TribeService<I> {
    /// Create a service with the configured admin and an empty registry.
    pub fn new(config: GovernanceConfig, issuer: I) -> Result<Self, TotemError> {
        config.validate()?;
        Ok(Self {
            admin: config.admin,
            config,
            registry: TribeRegistry::new(),
            ledger: JoinRequestLedger::new(),
            facts: FactLog::new(),
            issuer,
        })
    }

    /// Get the service configuration
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// Current global admin.
    pub fn admin(&self) -> &Address {
        &self.admin
    }

    /// Artifact issuer in use.
    pub fn issuer(&self) -> &I {
        &self.issuer
    }

    fn gate(&self) -> AuthorizationGate<'_> {
        AuthorizationGate::new(&self.admin, &self.registry)
    }

    // =========================================================================
    // Tribe registry operations
    // =========================================================================

    /// Create a tribe. Global admin only.
    ///
    /// The leader is not added as a member.
    pub fn create_tribe(
        &mut self,
        ctx: &CallContext,
        name: &str,
        leader: Address,
        requires_approval: bool,
        quorum_threshold: u32,
    ) -> Result<TribeId, TribeError> {
        let result =
            self.create_tribe_inner(ctx, name, leader, requires_approval, quorum_threshold);
        log_failure("create_tribe", &ctx.caller, result)
    }

    fn create_tribe_inner(
        &mut self,
        ctx: &CallContext,
        name: &str,
        leader: Address,
        requires_approval: bool,
        quorum_threshold: u32,
    ) -> Result<TribeId, TribeError> {
        self.gate().require_admin(&ctx.caller, "create tribes")?;
        self.config.check_tribe_name(name)?;

        let tribe_id = self
            .registry
            .create(name, leader, requires_approval, quorum_threshold);
        self.facts.append(TribeFact::TribeCreated {
            tribe_id,
            name: name.to_string(),
            leader,
            requires_approval,
            quorum_threshold,
        });

        tracing::info!(
            tribe_id = %tribe_id,
            leader = %leader,
            requires_approval,
            quorum_threshold,
            "Tribe created"
        );
        Ok(tribe_id)
    }

    /// Admit `applicant` without a join request. Global admin only.
    ///
    /// A pending request from the same applicant stays open; approving it
    /// later finalizes it without changing membership again.
    pub fn add_member_directly(
        &mut self,
        ctx: &CallContext,
        tribe_id: TribeId,
        applicant: Address,
    ) -> Result<(), TribeError> {
        let result = self.add_member_directly_inner(ctx, tribe_id, applicant);
        log_failure("add_member_directly", &ctx.caller, result)
    }

    fn add_member_directly_inner(
        &mut self,
        ctx: &CallContext,
        tribe_id: TribeId,
        applicant: Address,
    ) -> Result<(), TribeError> {
        self.gate().require_admin(&ctx.caller, "add members directly")?;
        self.registry.admit(tribe_id, applicant)?;
        self.facts.append(TribeFact::MemberAdmitted {
            tribe_id,
            member: applicant,
            path: AdmissionPath::Direct,
        });

        tracing::info!(tribe_id = %tribe_id, member = %applicant, "Member admitted directly");
        Ok(())
    }

    /// Hand the global admin role to `new_admin`. Global admin only.
    pub fn transfer_admin(
        &mut self,
        ctx: &CallContext,
        new_admin: Address,
    ) -> Result<(), TribeError> {
        let result = self.transfer_admin_inner(ctx, new_admin);
        log_failure("transfer_admin", &ctx.caller, result)
    }

    fn transfer_admin_inner(
        &mut self,
        ctx: &CallContext,
        new_admin: Address,
    ) -> Result<(), TribeError> {
        self.gate().require_admin(&ctx.caller, "transfer the admin role")?;

        let previous = std::mem::replace(&mut self.admin, new_admin);
        self.facts.append(TribeFact::AdminTransferred {
            previous,
            next: new_admin,
        });

        tracing::info!(previous = %previous, next = %new_admin, "Admin role transferred");
        Ok(())
    }

    // =========================================================================
    // Join request operations
    // =========================================================================

    /// Submit a join request for the caller and issue its initiation artifact.
    ///
    /// In open tribes the request is finalized approved in the same call.
    pub async fn request_to_join_tribe(
        &mut self,
        ctx: &CallContext,
        tribe_id: TribeId,
        initiation_artifact_uri: &str,
    ) -> Result<JoinRequestId, TribeError> {
        let result = self
            .request_to_join_tribe_inner(ctx, tribe_id, initiation_artifact_uri)
            .await;
        log_failure("request_to_join_tribe", &ctx.caller, result)
    }

    async fn request_to_join_tribe_inner(
        &mut self,
        ctx: &CallContext,
        tribe_id: TribeId,
        initiation_artifact_uri: &str,
    ) -> Result<JoinRequestId, TribeError> {
        let applicant = ctx.caller;
        self.config.check_artifact_uri(initiation_artifact_uri)?;

        let tribe = self.registry.get(tribe_id)?;
        tribe.validate_join(&applicant)?;
        let admits_on_submission = GovernanceEngine::admits_on_submission(tribe);
        self.ledger.ensure_no_pending(tribe_id, &applicant)?;

        // Nothing has been written yet; a failure here discards the request
        let artifact_id = self
            .issuer
            .issue_initiation_artifact(applicant, initiation_artifact_uri)
            .await?;

        let request_id =
            self.ledger
                .submit(tribe_id, applicant, initiation_artifact_uri, artifact_id)?;
        self.facts.append(TribeFact::JoinRequested {
            request_id,
            tribe_id,
            applicant,
            artifact_id,
            artifact_uri: initiation_artifact_uri.to_string(),
        });
        tracing::info!(
            request_id = %request_id,
            tribe_id = %tribe_id,
            applicant = %applicant,
            artifact_id = %artifact_id,
            "Join request submitted"
        );

        if admits_on_submission {
            self.finalize_approved(request_id, applicant, AdmissionPath::Open(request_id))?;
        }
        Ok(request_id)
    }

    /// Cast an approval on a pending request.
    ///
    /// Leader-only tribes finalize on the first approval by the leader or the
    /// global admin. Quorum tribes record one vote per member and finalize on
    /// the vote that reaches the threshold.
    pub fn approve_join_request(
        &mut self,
        ctx: &CallContext,
        request_id: JoinRequestId,
    ) -> Result<ApprovalOutcome, TribeError> {
        let result = self.approve_join_request_inner(ctx, request_id);
        log_failure("approve_join_request", &ctx.caller, result)
    }

    fn approve_join_request_inner(
        &mut self,
        ctx: &CallContext,
        request_id: JoinRequestId,
    ) -> Result<ApprovalOutcome, TribeError> {
        let caller = ctx.caller;
        let request = self.ledger.get(request_id)?;
        request.ensure_pending()?;
        let tribe = self.registry.get(request.tribe_id)?;

        let roles = self.gate().roles(&caller, tribe.tribe_id);
        let decision = GovernanceEngine::evaluate_approval(tribe, request, &caller, roles)?;

        let tally = match decision {
            ApprovalDecision::FinalizeByAuthority { role } => {
                tracing::debug!(request_id = %request_id, ?role, "Approval by authority");
                None
            }
            ApprovalDecision::RecordVote { required, .. } => {
                let approvals = self.ledger.record_approval(request_id, caller)?;
                self.facts.append(TribeFact::ApprovalRecorded {
                    request_id,
                    approver: caller,
                    approvals,
                    required,
                });
                tracing::info!(
                    request_id = %request_id,
                    approver = %caller,
                    approvals,
                    required,
                    "Approval recorded"
                );
                Some((approvals, required))
            }
        };

        match tally {
            Some((approvals, required)) if !decision.finalizes() => Ok(ApprovalOutcome::Pending {
                approvals,
                required,
            }),
            _ => {
                let newly_admitted =
                    self.finalize_approved(request_id, caller, path_for(request_id))?;
                Ok(ApprovalOutcome::Finalized { newly_admitted })
            }
        }
    }

    /// Reject a pending request. Tribe leader or global admin only.
    pub fn reject_join_request(
        &mut self,
        ctx: &CallContext,
        request_id: JoinRequestId,
    ) -> Result<(), TribeError> {
        let result = self.reject_join_request_inner(ctx, request_id);
        log_failure("reject_join_request", &ctx.caller, result)
    }

    fn reject_join_request_inner(
        &mut self,
        ctx: &CallContext,
        request_id: JoinRequestId,
    ) -> Result<(), TribeError> {
        let caller = ctx.caller;
        let request = self.ledger.get(request_id)?;
        request.ensure_pending()?;
        let tribe_id = self.registry.get(request.tribe_id)?.tribe_id;

        let roles = self.gate().roles(&caller, tribe_id);
        GovernanceEngine::evaluate_rejection(request, &caller, roles)?;

        let request = self.ledger.finalize(request_id, false)?;
        let applicant = request.applicant;
        self.facts.append(TribeFact::JoinRequestFinalized {
            request_id,
            tribe_id,
            applicant,
            outcome: FinalOutcome::Rejected,
            decided_by: caller,
        });

        tracing::info!(
            request_id = %request_id,
            tribe_id = %tribe_id,
            applicant = %applicant,
            decided_by = %caller,
            "Join request rejected"
        );
        Ok(())
    }

    /// Mark a request approved and add the applicant to the tribe.
    ///
    /// Membership is idempotent here: an applicant admitted by another path
    /// finalizes without error. Returns whether the applicant was newly added.
    fn finalize_approved(
        &mut self,
        request_id: JoinRequestId,
        decided_by: Address,
        path: AdmissionPath,
    ) -> Result<bool, TribeError> {
        let request = self.ledger.finalize(request_id, true)?;
        let (tribe_id, applicant) = (request.tribe_id, request.applicant);
        let newly_admitted = self.registry.add_member(tribe_id, applicant)?;

        self.facts.append(TribeFact::JoinRequestFinalized {
            request_id,
            tribe_id,
            applicant,
            outcome: FinalOutcome::Approved,
            decided_by,
        });
        if newly_admitted {
            self.facts.append(TribeFact::MemberAdmitted {
                tribe_id,
                member: applicant,
                path,
            });
        }

        tracing::info!(
            request_id = %request_id,
            tribe_id = %tribe_id,
            applicant = %applicant,
            decided_by = %decided_by,
            newly_admitted,
            "Join request approved"
        );
        Ok(newly_admitted)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Look up a tribe.
    pub fn get_tribe(&self, tribe_id: TribeId) -> Result<&Tribe, TribeError> {
        self.registry.get(tribe_id)
    }

    /// Look up a join request.
    pub fn get_join_request(&self, request_id: JoinRequestId) -> Result<&JoinRequest, TribeError> {
        self.ledger.get(request_id)
    }

    /// Membership check; `false` for unknown tribes.
    pub fn is_tribe_member(&self, tribe_id: TribeId, address: &Address) -> bool {
        self.registry.is_member(tribe_id, address)
    }

    /// All tribes in id order.
    pub fn list_tribes(&self) -> Vec<&Tribe> {
        self.registry.iter().collect()
    }

    /// Members of a tribe, sorted.
    pub fn tribe_members(&self, tribe_id: TribeId) -> Result<Vec<Address>, TribeError> {
        Ok(self.registry.get(tribe_id)?.members.iter().copied().collect())
    }

    /// Pending requests for a tribe, in submission order.
    pub fn pending_requests(&self, tribe_id: TribeId) -> Result<Vec<&JoinRequest>, TribeError> {
        self.registry.get(tribe_id)?;
        Ok(self.ledger.pending_for_tribe(tribe_id))
    }

    /// The applicant's unprocessed request for a tribe, if any.
    pub fn pending_request_for(
        &self,
        tribe_id: TribeId,
        applicant: &Address,
    ) -> Option<JoinRequestId> {
        self.ledger.pending_for(tribe_id, applicant)
    }

    /// Progress of a join request.
    pub fn request_status(&self, request_id: JoinRequestId) -> Result<RequestProgress, TribeError> {
        let request = self.ledger.get(request_id)?;
        Ok(match request.status() {
            RequestStatus::Pending => RequestProgress::Pending {
                approvals: request.approval_count(),
                required: self.registry.get(request.tribe_id)?.quorum_threshold,
            },
            RequestStatus::Approved => RequestProgress::Approved,
            RequestStatus::Rejected => RequestProgress::Rejected,
        })
    }

    /// Every fact appended so far.
    pub fn facts(&self) -> &[RecordedFact] {
        self.facts.entries()
    }

    /// Facts at or after `position`.
    pub fn facts_since(&self, position: LedgerPosition) -> &[RecordedFact] {
        self.facts.since(position)
    }

    /// Summary counts over the whole fact log.
    pub fn fact_summary(&self) -> TribeFactDelta {
        TribeFactReducer.reduce(self.facts.entries().iter().map(|entry| &entry.fact))
    }

    /// Serializable copy of the current state.
    pub fn snapshot(&self) -> GovernanceSnapshot {
        GovernanceSnapshot {
            admin: self.admin,
            tribes: self.registry.iter().cloned().collect(),
            requests: self.ledger.iter().cloned().collect(),
            next_tribe_id: self.registry.next_id(),
            next_request_id: self.ledger.next_id(),
            next_position: self.facts.next_position(),
        }
    }
}

fn path_for(request_id: JoinRequestId) -> AdmissionPath {
    AdmissionPath::Request(request_id)
}

/// Log a failed operation at the level its kind warrants.
fn log_failure<T>(
    operation: &'static str,
    caller: &Address,
    result: Result<T, TribeError>,
) -> Result<T, TribeError> {
    if let Err(err) = &result {
        match err {
            TribeError::Unauthorized { .. } => {
                tracing::warn!(operation, caller = %caller, error = %err, "Authorization denied")
            }
            TribeError::ExternalIssuanceFailed(_) => {
                tracing::warn!(
                    operation,
                    caller = %caller,
                    error = %err,
                    "Artifact issuance failed"
                )
            }
            _ => tracing::debug!(operation, caller = %caller, error = %err, "Operation rejected"),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use totem_core::{ArtifactError, ArtifactId};

    struct CountingIssuer {
        next: AtomicU64,
        fail: bool,
    }

    impl CountingIssuer {
        fn new() -> Self {
            Self {
                next: AtomicU64::new(1),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl InitiationArtifactEffects for CountingIssuer {
        async fn issue_initiation_artifact(
            &self,
            _applicant: Address,
            _uri: &str,
        ) -> Result<ArtifactId, ArtifactError> {
            if self.fail {
                return Err(ArtifactError::Unavailable {
                    reason: "offline".to_string(),
                });
            }
            Ok(ArtifactId::new(self.next.fetch_add(1, Ordering::SeqCst)))
        }
    }

    fn test_address(seed: u8) -> Address {
        Address::new_from_entropy([seed; 32])
    }

    fn service() -> TribeService<CountingIssuer> {
        let config = GovernanceConfig::with_admin(test_address(1));
        TribeService::new(config, CountingIssuer::new()).unwrap()
    }

    fn as_caller(seed: u8) -> CallContext {
        CallContext::new(test_address(seed))
    }

    #[tokio::test]
    async fn test_leader_only_flow_emits_facts() {
        let mut service = service();
        let tribe_id = service
            .create_tribe(&as_caller(1), "Warriors", test_address(2), true, 0)
            .unwrap();
        let request_id = service
            .request_to_join_tribe(&as_caller(3), tribe_id, "ipfs://a")
            .await
            .unwrap();

        let outcome = service.approve_join_request(&as_caller(2), request_id).unwrap();
        assert_eq!(outcome, ApprovalOutcome::Finalized { newly_admitted: true });
        assert!(service.is_tribe_member(tribe_id, &test_address(3)));

        let kinds: Vec<_> = service.facts().iter().map(|e| e.fact.fact_type()).collect();
        assert_eq!(
            kinds,
            vec!["tribe-created", "join-requested", "join-request-finalized", "member-admitted"]
        );
        let summary = service.fact_summary();
        assert_eq!(summary.members_admitted, 1);
        assert_eq!(summary.approvals_recorded, 0);
    }

    #[tokio::test]
    async fn test_issuer_failure_leaves_no_state() {
        let mut service = TribeService::new(
            GovernanceConfig::with_admin(test_address(1)),
            CountingIssuer {
                next: AtomicU64::new(1),
                fail: true,
            },
        )
        .unwrap();
        let tribe_id = service
            .create_tribe(&as_caller(1), "Warriors", test_address(2), true, 0)
            .unwrap();
        let before = service.facts().len();

        let result = service
            .request_to_join_tribe(&as_caller(3), tribe_id, "ipfs://a")
            .await;
        assert!(matches!(result, Err(TribeError::ExternalIssuanceFailed(_))));
        assert_eq!(service.facts().len(), before);
        assert!(service.get_join_request(JoinRequestId::FIRST).is_err());
        assert!(service.pending_request_for(tribe_id, &test_address(3)).is_none());
    }

    #[tokio::test]
    async fn test_default_config_accepts_empty_uri_and_long_name() {
        let mut service = service();
        let long_name = "N".repeat(65);
        let tribe_id = service
            .create_tribe(&as_caller(1), &long_name, test_address(2), true, 0)
            .unwrap();
        assert_eq!(service.get_tribe(tribe_id).unwrap().name, long_name);

        let request_id = service
            .request_to_join_tribe(&as_caller(3), tribe_id, "")
            .await
            .unwrap();
        assert_eq!(service.get_join_request(request_id).unwrap().initiation_artifact_uri, "");
    }

    #[tokio::test]
    async fn test_configured_limits_checked_before_issuance() {
        let mut config = GovernanceConfig::with_admin(test_address(1));
        config.max_tribe_name_len = Some(64);
        config.allow_empty_artifact_uri = false;
        let mut service = TribeService::new(config, CountingIssuer::new()).unwrap();
        let tribe_id = service
            .create_tribe(&as_caller(1), "Warriors", test_address(2), true, 0)
            .unwrap();

        let result = service.request_to_join_tribe(&as_caller(3), tribe_id, "").await;
        assert!(matches!(result, Err(TribeError::InvalidInput { .. })));
        assert_eq!(service.issuer().next.load(Ordering::SeqCst), 1);

        let long_name = "x".repeat(65);
        assert!(matches!(
            service.create_tribe(&as_caller(1), &long_name, test_address(2), true, 0),
            Err(TribeError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_request_status_progress() {
        let mut service = service();
        let tribe_id = service
            .create_tribe(&as_caller(1), "Council", test_address(2), true, 2)
            .unwrap();
        service
            .add_member_directly(&as_caller(1), tribe_id, test_address(10))
            .unwrap();
        let request_id = service
            .request_to_join_tribe(&as_caller(3), tribe_id, "ipfs://a")
            .await
            .unwrap();

        assert_eq!(
            service.request_status(request_id),
            Ok(RequestProgress::Pending {
                approvals: 0,
                required: 2
            })
        );
        service.approve_join_request(&as_caller(10), request_id).unwrap();
        assert_eq!(
            service.request_status(request_id),
            Ok(RequestProgress::Pending {
                approvals: 1,
                required: 2
            })
        );
        service.reject_join_request(&as_caller(2), request_id).unwrap();
        assert_eq!(service.request_status(request_id), Ok(RequestProgress::Rejected));
    }

    #[test]
    fn test_transfer_admin() {
        let mut service = service();
        service.transfer_admin(&as_caller(1), test_address(5)).unwrap();
        assert_eq!(service.admin(), &test_address(5));

        assert!(matches!(
            service.create_tribe(&as_caller(1), "Warriors", test_address(2), true, 0),
            Err(TribeError::Unauthorized { .. })
        ));
        assert!(service
            .create_tribe(&as_caller(5), "Warriors", test_address(2), true, 0)
            .is_ok());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut service = service();
        service
            .create_tribe(&as_caller(1), "Warriors", test_address(2), true, 0)
            .unwrap();
        let snapshot = service.snapshot();
        assert_eq!(snapshot.tribes.len(), 1);
        assert_eq!(snapshot.next_tribe_id, TribeId::new(2));
        assert_eq!(snapshot.next_request_id, JoinRequestId::FIRST);
        assert_eq!(snapshot.next_position, LedgerPosition::new(2));

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: GovernanceSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);
    }
}

//! Governance engine
//!
//! Pure decision logic over a tribe, a join request and the caller's roles.
//! The engine holds no state and mutates nothing; it tells the service which
//! owner mutations to apply. Because every check happens here first, the
//! service never has to undo a partial change.
//!
//! Approval rules:
//! - `quorum_threshold == 0`: the leader or the global admin finalizes alone,
//!   without a vote being recorded.
//! - `quorum_threshold > 0`: only members vote (the admin gets no implicit
//!   vote, the leader counts as an ordinary member if they are one), one vote
//!   each, and the vote that brings the tally to the threshold finalizes.

use crate::error::TribeError;
use crate::gate::{CallerRoles, Role};
use crate::ledger::JoinRequest;
use crate::registry::{ApprovalPolicy, Tribe};
use serde::{Deserialize, Serialize};
use totem_core::Address;

/// Roles that may approve alone in leader-only tribes, in precedence order.
const AUTHORITY_ROLES: &[Role] = &[Role::TribeLeader, Role::GlobalAdmin];

/// What an approval call should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalDecision {
    /// Finalize now on the caller's authority; no vote is recorded
    FinalizeByAuthority {
        /// Role that granted the authority
        role: Role,
    },
    /// Record the caller's vote
    RecordVote {
        /// Tally after this vote
        approvals_after: usize,
        /// Votes required
        required: u32,
        /// Whether this vote reaches the threshold
        finalizes: bool,
    },
}

impl ApprovalDecision {
    /// Whether applying this decision finalizes the request.
    pub fn finalizes(&self) -> bool {
        match self {
            ApprovalDecision::FinalizeByAuthority { .. } => true,
            ApprovalDecision::RecordVote { finalizes, .. } => *finalizes,
        }
    }
}

/// Stateless decision functions.
pub struct GovernanceEngine;

impl GovernanceEngine {
    /// Whether `approvals` distinct votes satisfy `threshold`.
    pub fn quorum_reached(approvals: usize, threshold: u32) -> bool {
        approvals >= threshold as usize
    }

    /// Whether a freshly submitted request is admitted immediately.
    pub fn admits_on_submission(tribe: &Tribe) -> bool {
        tribe.approval_policy() == ApprovalPolicy::Open
    }

    /// Decide what an approval by `caller` does to `request`.
    ///
    /// `request` must belong to `tribe`, and `roles` must have been captured
    /// for `caller` against that tribe.
    pub fn evaluate_approval(
        tribe: &Tribe,
        request: &JoinRequest,
        caller: &Address,
        roles: CallerRoles,
    ) -> Result<ApprovalDecision, TribeError> {
        request.ensure_pending()?;

        match tribe.approval_policy() {
            // Open tribes never hold pending requests
            ApprovalPolicy::Open | ApprovalPolicy::LeaderOnly => {
                let role = roles
                    .first_of(AUTHORITY_ROLES)
                    .ok_or_else(|| TribeError::unauthorized(*caller, "approve join requests"))?;
                Ok(ApprovalDecision::FinalizeByAuthority { role })
            }
            ApprovalPolicy::Quorum { threshold } => {
                if !roles.holds(Role::TribeMember) {
                    return Err(TribeError::unauthorized(*caller, "vote on join requests"));
                }
                if request.has_approved(caller) {
                    return Err(TribeError::DuplicateVote {
                        request_id: request.request_id,
                        voter: *caller,
                    });
                }
                let approvals_after = request.approval_count() + 1;
                Ok(ApprovalDecision::RecordVote {
                    approvals_after,
                    required: threshold,
                    finalizes: Self::quorum_reached(approvals_after, threshold),
                })
            }
        }
    }

    /// Decide whether `caller` may reject `request`.
    ///
    /// The leader or the global admin may reject in every policy mode.
    pub fn evaluate_rejection(
        request: &JoinRequest,
        caller: &Address,
        roles: CallerRoles,
    ) -> Result<Role, TribeError> {
        request.ensure_pending()?;
        roles
            .first_of(AUTHORITY_ROLES)
            .ok_or_else(|| TribeError::unauthorized(*caller, "reject join requests"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use totem_core::{ArtifactId, JoinRequestId, TribeId};

    fn test_address(seed: u8) -> Address {
        Address::new_from_entropy([seed; 32])
    }

    fn tribe(quorum: u32) -> Tribe {
        Tribe::new(TribeId::new(1), "Council", test_address(1), true, quorum)
    }

    fn request(approvers: &[u8]) -> JoinRequest {
        JoinRequest {
            request_id: JoinRequestId::new(7),
            tribe_id: TribeId::new(1),
            applicant: test_address(50),
            initiation_artifact_uri: "ipfs://x".to_string(),
            artifact_id: ArtifactId::new(1),
            processed: false,
            approved: false,
            approvers: approvers.iter().map(|s| test_address(*s)).collect::<BTreeSet<_>>(),
        }
    }

    fn roles(global_admin: bool, tribe_leader: bool, tribe_member: bool) -> CallerRoles {
        CallerRoles {
            global_admin,
            tribe_leader,
            tribe_member,
        }
    }

    fn approve(
        tribe: &Tribe,
        request: &JoinRequest,
        caller: u8,
        roles: CallerRoles,
    ) -> Result<ApprovalDecision, TribeError> {
        GovernanceEngine::evaluate_approval(tribe, request, &test_address(caller), roles)
    }

    fn reject(request: &JoinRequest, caller: u8, roles: CallerRoles) -> Result<Role, TribeError> {
        GovernanceEngine::evaluate_rejection(request, &test_address(caller), roles)
    }

    #[test]
    fn test_leader_only_authority() {
        let tribe = tribe(0);
        let request = request(&[]);

        assert_eq!(
            approve(&tribe, &request, 1, roles(false, true, false)),
            Ok(ApprovalDecision::FinalizeByAuthority {
                role: Role::TribeLeader
            })
        );
        assert_eq!(
            approve(&tribe, &request, 2, roles(true, false, false)),
            Ok(ApprovalDecision::FinalizeByAuthority {
                role: Role::GlobalAdmin
            })
        );
        assert!(ApprovalDecision::FinalizeByAuthority {
            role: Role::TribeLeader
        }
        .finalizes());
        // Plain members have no say in leader-only tribes
        assert!(matches!(
            approve(&tribe, &request, 3, roles(false, false, true)),
            Err(TribeError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_quorum_excludes_admin_without_membership() {
        let tribe = tribe(2);
        let request = request(&[]);
        assert!(matches!(
            approve(&tribe, &request, 2, roles(true, false, false)),
            Err(TribeError::Unauthorized { .. })
        ));
        assert!(matches!(
            approve(&tribe, &request, 1, roles(false, true, false)),
            Err(TribeError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_quorum_leader_member_votes_normally() {
        let tribe = tribe(2);
        let request = request(&[]);
        assert_eq!(
            approve(&tribe, &request, 1, roles(false, true, true)),
            Ok(ApprovalDecision::RecordVote {
                approvals_after: 1,
                required: 2,
                finalizes: false,
            })
        );
        assert!(!approve(&tribe, &request, 1, roles(false, true, true))
            .unwrap()
            .finalizes());
    }

    #[test]
    fn test_quorum_finalizes_on_crossing_vote() {
        let tribe = tribe(3);
        let request = request(&[10, 11]);
        let decision = approve(&tribe, &request, 12, roles(false, false, true)).unwrap();
        assert!(decision.finalizes());
        assert_eq!(
            decision,
            ApprovalDecision::RecordVote {
                approvals_after: 3,
                required: 3,
                finalizes: true,
            }
        );
    }

    #[test]
    fn test_duplicate_vote_detected_before_mutation() {
        let tribe = tribe(3);
        let request = request(&[10]);
        assert_eq!(
            approve(&tribe, &request, 10, roles(false, false, true)),
            Err(TribeError::DuplicateVote {
                request_id: JoinRequestId::new(7),
                voter: test_address(10),
            })
        );
    }

    #[test]
    fn test_processed_request_rejected_first() {
        let tribe = tribe(0);
        let mut request = request(&[]);
        request.processed = true;
        request.approved = true;

        assert_eq!(
            approve(&tribe, &request, 1, roles(false, true, false)),
            Err(TribeError::AlreadyProcessed(JoinRequestId::new(7)))
        );
        assert_eq!(
            reject(&request, 1, roles(false, true, false)),
            Err(TribeError::AlreadyProcessed(JoinRequestId::new(7)))
        );
    }

    #[test]
    fn test_rejection_requires_authority() {
        let request = request(&[]);
        assert_eq!(
            reject(&request, 1, roles(false, true, true)),
            Ok(Role::TribeLeader)
        );
        assert!(matches!(
            reject(&request, 3, roles(false, false, true)),
            Err(TribeError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_open_tribe_admits_on_submission() {
        let mut open = tribe(4);
        open.requires_approval = false;
        assert!(GovernanceEngine::admits_on_submission(&open));
        assert!(!GovernanceEngine::admits_on_submission(&tribe(0)));
    }
}

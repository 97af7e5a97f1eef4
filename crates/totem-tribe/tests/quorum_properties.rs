//! Property tests for approval counting
//!
//! - Quorum requests finalize on exactly the vote that reaches the threshold
//! - Repeat votes fail and leave the tally unchanged
//! - Leader-only requests finalize by a single authority action, never by votes
//! - At most one pending request exists per applicant and tribe

use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};
use totem_core::{JoinRequestId, TribeId};
use totem_testkit::{
    as_admin, as_caller, seed_tribe, test_address, MockTribeService, TribeServiceBuilder,
};
use totem_tribe::{ApprovalOutcome, TribeError};

const APPLICANT: u8 = 200;
const LEADER: u8 = 2;
const FIRST_MEMBER: u8 = 10;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().build().unwrap()
}

fn submit(
    service: &mut MockTribeService,
    tribe_id: TribeId,
    seed: u8,
) -> Result<JoinRequestId, TribeError> {
    let ctx = as_caller(seed);
    runtime().block_on(service.request_to_join_tribe(&ctx, tribe_id, "ipfs://initiation"))
}

proptest! {
    #[test]
    fn test_quorum_finalizes_exactly_at_threshold(
        threshold in 1u32..=5,
        extra_members in 0u8..=3,
        votes in prop::collection::vec(0u8..8, 1..24),
    ) {
        let member_count = threshold as u8 + extra_members;
        let members: Vec<u8> = (0..member_count).map(|i| FIRST_MEMBER + i).collect();

        let mut service = TribeServiceBuilder::new().build();
        let tribe_id = seed_tribe(&mut service, "Council", LEADER, threshold, &members);
        let request_id = submit(&mut service, tribe_id, APPLICANT).unwrap();

        let mut voted = BTreeSet::new();
        let mut finalized = false;

        for index in votes {
            let voter = FIRST_MEMBER + index % member_count;
            let result = service.approve_join_request(&as_caller(voter), request_id);

            if finalized {
                prop_assert_eq!(result, Err(TribeError::AlreadyProcessed(request_id)));
                continue;
            }
            if !voted.insert(voter) {
                prop_assert!(
                    matches!(result, Err(TribeError::DuplicateVote { .. })),
                    "expected duplicate vote, got {:?}",
                    result
                );
                prop_assert_eq!(
                    service.get_join_request(request_id).unwrap().approval_count(),
                    voted.len()
                );
                continue;
            }

            if voted.len() == threshold as usize {
                prop_assert_eq!(result, Ok(ApprovalOutcome::Finalized { newly_admitted: true }));
                finalized = true;
            } else {
                prop_assert_eq!(
                    result,
                    Ok(ApprovalOutcome::Pending { approvals: voted.len(), required: threshold })
                );
                prop_assert!(!service.is_tribe_member(tribe_id, &test_address(APPLICANT)));
            }
        }

        let request = service.get_join_request(request_id).unwrap();
        prop_assert_eq!(request.processed, finalized);
        prop_assert_eq!(request.approval_count(), voted.len());
        prop_assert_eq!(service.is_tribe_member(tribe_id, &test_address(APPLICANT)), finalized);
    }

    #[test]
    fn test_leader_only_never_counts_votes(
        attempts in prop::collection::vec(0u8..6, 0..10),
        by_admin in any::<bool>(),
    ) {
        // Seeds 10..13 are members, 13..16 outsiders
        let members: Vec<u8> = (0..3).map(|i| FIRST_MEMBER + i).collect();
        let mut service = TribeServiceBuilder::new().build();
        let tribe_id = seed_tribe(&mut service, "Warriors", LEADER, 0, &members);
        let request_id = submit(&mut service, tribe_id, APPLICANT).unwrap();

        for index in attempts {
            let result = service.approve_join_request(&as_caller(FIRST_MEMBER + index), request_id);
            prop_assert!(
                matches!(result, Err(TribeError::Unauthorized { .. })),
                "expected unauthorized, got {:?}",
                result
            );
        }
        prop_assert!(service.get_join_request(request_id).unwrap().is_pending());

        let authority = if by_admin { as_admin() } else { as_caller(LEADER) };
        let outcome = service.approve_join_request(&authority, request_id).unwrap();
        prop_assert!(outcome.is_finalized());
        prop_assert_eq!(service.get_join_request(request_id).unwrap().approval_count(), 0);
    }

    #[test]
    fn test_one_pending_request_per_applicant(
        ops in prop::collection::vec((0u8..4, any::<bool>()), 1..20),
    ) {
        let mut service = TribeServiceBuilder::new().build();
        let tribe_id = seed_tribe(&mut service, "Council", LEADER, 2, &[FIRST_MEMBER]);

        for (applicant, reject_after) in ops {
            let seed = APPLICANT + applicant;
            let existing = service.pending_request_for(tribe_id, &test_address(seed));
            let result = submit(&mut service, tribe_id, seed);

            match existing {
                Some(pending) => prop_assert_eq!(
                    result,
                    Err(TribeError::DuplicateRequest {
                        tribe_id,
                        applicant: test_address(seed),
                        pending,
                    })
                ),
                None => prop_assert!(result.is_ok()),
            }

            if reject_after {
                if let Some(pending) = service.pending_request_for(tribe_id, &test_address(seed)) {
                    service.reject_join_request(&as_caller(LEADER), pending).unwrap();
                }
            }

            let pending = service.pending_requests(tribe_id).unwrap();
            let applicants: HashSet<_> = pending.iter().map(|request| request.applicant).collect();
            prop_assert_eq!(applicants.len(), pending.len());
        }
    }
}

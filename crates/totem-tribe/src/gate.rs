//! Identity and authorization gate
//!
//! Answers the three role predicates for a caller and a tribe. Every mutation
//! consults this module before touching state, so the full authorization
//! surface lives here as one enumerated check.
//!
//! For an unknown tribe every tribe-scoped predicate is `false`; callers must
//! check tribe existence first to tell "tribe missing" from "unauthorized".

use crate::error::TribeError;
use crate::registry::TribeRegistry;
use serde::{Deserialize, Serialize};
use totem_core::{Address, TribeId};

/// Roles a caller can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Owner of the whole registry
    GlobalAdmin,
    /// Leader of the tribe in question
    TribeLeader,
    /// Member of the tribe in question
    TribeMember,
}

/// Guard-relevant facts about one caller, captured before a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallerRoles {
    /// Caller is the global admin
    pub global_admin: bool,
    /// Caller leads the tribe
    pub tribe_leader: bool,
    /// Caller belongs to the tribe
    pub tribe_member: bool,
}

impl CallerRoles {
    /// Whether the snapshot includes `role`.
    pub fn holds(&self, role: Role) -> bool {
        match role {
            Role::GlobalAdmin => self.global_admin,
            Role::TribeLeader => self.tribe_leader,
            Role::TribeMember => self.tribe_member,
        }
    }

    /// First of `accepted` the caller holds, in the order given.
    pub fn first_of(&self, accepted: &[Role]) -> Option<Role> {
        accepted.iter().copied().find(|role| self.holds(*role))
    }
}

/// Read-only view over the admin and registry used for role checks.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationGate<'a> {
    admin: &'a Address,
    registry: &'a TribeRegistry,
}

impl<'a> AuthorizationGate<'a> {
    /// Create a gate over the current admin and registry.
    pub fn new(admin: &'a Address, registry: &'a TribeRegistry) -> Self {
        Self { admin, registry }
    }

    /// Whether `caller` is the global admin.
    pub fn is_global_admin(&self, caller: &Address) -> bool {
        self.admin == caller
    }

    /// Whether `caller` leads `tribe_id`.
    pub fn is_tribe_leader(&self, caller: &Address, tribe_id: TribeId) -> bool {
        self.registry
            .get(tribe_id)
            .is_ok_and(|tribe| tribe.is_leader(caller))
    }

    /// Whether `caller` belongs to `tribe_id`.
    pub fn is_tribe_member(&self, caller: &Address, tribe_id: TribeId) -> bool {
        self.registry.is_member(tribe_id, caller)
    }

    /// Capture all role predicates for `caller` against `tribe_id`.
    pub fn roles(&self, caller: &Address, tribe_id: TribeId) -> CallerRoles {
        CallerRoles {
            global_admin: self.is_global_admin(caller),
            tribe_leader: self.is_tribe_leader(caller, tribe_id),
            tribe_member: self.is_tribe_member(caller, tribe_id),
        }
    }

    /// Require the global admin role for an operation not scoped to a tribe.
    pub fn require_admin(&self, caller: &Address, action: &'static str) -> Result<(), TribeError> {
        if self.is_global_admin(caller) {
            Ok(())
        } else {
            Err(TribeError::unauthorized(*caller, action))
        }
    }
}

//! Tribe registry
//!
//! Owns the set of tribes and each tribe's live membership. Tribes are
//! permanent once created and their ids are never reused. The registry is the
//! only writer of `Tribe::members`; authorization happens before it is called.

use crate::error::TribeError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use totem_core::{Address, TribeId};

/// How a tribe decides on join requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalPolicy {
    /// No approval needed; every request is admitted on submission
    Open,
    /// The leader or the global admin decides alone
    LeaderOnly,
    /// `threshold` distinct member approvals are required
    Quorum {
        /// Number of distinct member votes required
        threshold: u32,
    },
}

/// A named group with a membership set and an approval policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tribe {
    /// Unique identifier for this tribe
    pub tribe_id: TribeId,
    /// Display name (not required to be unique)
    pub name: String,
    /// Address with approval authority independent of the global admin
    pub leader: Address,
    /// Whether joining goes through the approval pipeline at all
    pub requires_approval: bool,
    /// `0` for leader/admin approval, otherwise the member votes required
    pub quorum_threshold: u32,
    /// Current members
    pub members: BTreeSet<Address>,
}

impl Tribe {
    /// Create a tribe with an empty member set.
    ///
    /// The leader is not added as a member.
    pub fn new(
        tribe_id: TribeId,
        name: impl Into<String>,
        leader: Address,
        requires_approval: bool,
        quorum_threshold: u32,
    ) -> Self {
        Self {
            tribe_id,
            name: name.into(),
            leader,
            requires_approval,
            quorum_threshold,
            members: BTreeSet::new(),
        }
    }

    /// The policy this tribe's configuration amounts to.
    pub fn approval_policy(&self) -> ApprovalPolicy {
        match (self.requires_approval, self.quorum_threshold) {
            (false, _) => ApprovalPolicy::Open,
            (true, 0) => ApprovalPolicy::LeaderOnly,
            (true, threshold) => ApprovalPolicy::Quorum { threshold },
        }
    }

    /// Check if an address is a member of this tribe.
    pub fn is_member(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    /// Check if an address leads this tribe.
    pub fn is_leader(&self, address: &Address) -> bool {
        self.leader == *address
    }

    /// Get the number of current members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Validate that an address can be admitted as a new member.
    pub fn validate_join(&self, address: &Address) -> Result<(), TribeError> {
        if self.is_member(address) {
            return Err(TribeError::already_member(self.tribe_id, *address));
        }
        Ok(())
    }
}

/// Arena of tribes keyed by monotonically assigned ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TribeRegistry {
    tribes: BTreeMap<TribeId, Tribe>,
    next_id: TribeId,
}

impl Default for TribeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TribeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tribes: BTreeMap::new(),
            next_id: TribeId::FIRST,
        }
    }

    /// Allocate a new tribe and return its id.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        leader: Address,
        requires_approval: bool,
        quorum_threshold: u32,
    ) -> TribeId {
        let tribe_id = self.next_id;
        self.next_id = tribe_id.next();
        self.tribes.insert(
            tribe_id,
            Tribe::new(tribe_id, name, leader, requires_approval, quorum_threshold),
        );
        tribe_id
    }

    /// Look up a tribe.
    pub fn get(&self, tribe_id: TribeId) -> Result<&Tribe, TribeError> {
        self.tribes
            .get(&tribe_id)
            .ok_or(TribeError::TribeNotFound(tribe_id))
    }

    /// Whether the tribe exists.
    pub fn contains(&self, tribe_id: TribeId) -> bool {
        self.tribes.contains_key(&tribe_id)
    }

    /// Membership check; `false` for unknown tribes.
    pub fn is_member(&self, tribe_id: TribeId, address: &Address) -> bool {
        self.tribes
            .get(&tribe_id)
            .is_some_and(|tribe| tribe.is_member(address))
    }

    /// Add a member, treating an existing member as a no-op.
    ///
    /// Returns whether the address was newly added.
    pub fn add_member(&mut self, tribe_id: TribeId, address: Address) -> Result<bool, TribeError> {
        let tribe = self
            .tribes
            .get_mut(&tribe_id)
            .ok_or(TribeError::TribeNotFound(tribe_id))?;
        Ok(tribe.members.insert(address))
    }

    /// Add a member that must not already belong to the tribe.
    pub fn admit(&mut self, tribe_id: TribeId, address: Address) -> Result<(), TribeError> {
        self.get(tribe_id)?.validate_join(&address)?;
        self.add_member(tribe_id, address)?;
        Ok(())
    }

    /// Iterate over all tribes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Tribe> {
        self.tribes.values()
    }

    /// Number of tribes ever created.
    pub fn len(&self) -> usize {
        self.tribes.len()
    }

    /// Whether no tribe has been created yet.
    pub fn is_empty(&self) -> bool {
        self.tribes.is_empty()
    }

    /// Id the next created tribe will receive.
    pub fn next_id(&self) -> TribeId {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_address(seed: u8) -> Address {
        Address::new_from_entropy([seed; 32])
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut registry = TribeRegistry::new();
        let first = registry.create("Warriors", test_address(1), true, 0);
        let second = registry.create("Warriors", test_address(2), true, 3);

        assert_eq!(first, TribeId::new(1));
        assert_eq!(second, TribeId::new(2));
        assert_eq!(registry.next_id(), TribeId::new(3));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_leader_is_not_a_member() {
        let mut registry = TribeRegistry::new();
        let leader = test_address(1);
        let tribe_id = registry.create("Warriors", leader, true, 0);

        let tribe = registry.get(tribe_id).unwrap();
        assert!(tribe.is_leader(&leader));
        assert!(!tribe.is_member(&leader));
        assert_eq!(tribe.member_count(), 0);
    }

    #[test]
    fn test_approval_policy() {
        let leader = test_address(1);
        let id = TribeId::new(1);
        assert_eq!(
            Tribe::new(id, "a", leader, true, 0).approval_policy(),
            ApprovalPolicy::LeaderOnly
        );
        assert_eq!(
            Tribe::new(id, "a", leader, true, 3).approval_policy(),
            ApprovalPolicy::Quorum { threshold: 3 }
        );
        assert_eq!(
            Tribe::new(id, "a", leader, false, 3).approval_policy(),
            ApprovalPolicy::Open
        );
    }

    #[test]
    fn test_add_member_is_idempotent() {
        let mut registry = TribeRegistry::new();
        let tribe_id = registry.create("Council", test_address(1), true, 2);

        assert!(registry.add_member(tribe_id, test_address(5)).unwrap());
        assert!(!registry.add_member(tribe_id, test_address(5)).unwrap());
        assert_eq!(registry.get(tribe_id).unwrap().member_count(), 1);
    }

    #[test]
    fn test_admit_rejects_existing_member() {
        let mut registry = TribeRegistry::new();
        let tribe_id = registry.create("Council", test_address(1), true, 2);

        registry.admit(tribe_id, test_address(5)).unwrap();
        let result = registry.admit(tribe_id, test_address(5));
        assert!(matches!(result, Err(TribeError::AlreadyMember { .. })));
        assert_eq!(registry.get(tribe_id).unwrap().member_count(), 1);
    }

    #[test]
    fn test_unknown_tribe() {
        let mut registry = TribeRegistry::new();
        let missing = TribeId::new(42);

        assert!(!registry.contains(missing));
        assert!(!registry.is_member(missing, &test_address(1)));
        assert_eq!(
            registry.add_member(missing, test_address(1)),
            Err(TribeError::TribeNotFound(missing))
        );
    }
}

//! Tribe governance facts
//!
//! Every successful mutation appends one or more `TribeFact` values to an
//! append-only `FactLog`. Each entry is stamped with a monotonically increasing
//! `LedgerPosition`, so observers can resume with `FactLog::since`. A failed
//! operation appends nothing.
//!
//! Facts serialize in a versioned envelope (bincode, with JSON accepted on
//! read). A persisted log is a bincode list of `EncodedFact` bindings, each
//! carrying its type tag and position, and `TribeFactReducer` folds a fact
//! sequence or a persisted log into summary counts.

use serde::{Deserialize, Serialize};
use totem_core::{Address, ArtifactId, JoinRequestId, LedgerPosition, TotemError, TribeId};

/// Type identifier for tribe facts
pub const TRIBE_FACT_TYPE_ID: &str = "tribe";
/// Schema version for tribe fact serialization
pub const TRIBE_FACT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VersionedTribeFact {
    schema_version: u32,
    fact: TribeFact,
}

/// How a member came to be admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionPath {
    /// Through an approved join request
    Request(JoinRequestId),
    /// Added directly by the global admin
    Direct,
    /// Through a request to an open tribe, approved on submission
    Open(JoinRequestId),
}

/// Terminal outcome of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalOutcome {
    /// Applicant admitted
    Approved,
    /// Applicant turned away
    Rejected,
}

/// Tribe domain fact types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TribeFact {
    /// Tribe created
    TribeCreated {
        /// Id assigned to the new tribe
        tribe_id: TribeId,
        /// Display name
        name: String,
        /// Leader address
        leader: Address,
        /// Whether joining needs approval
        requires_approval: bool,
        /// Votes required, `0` for leader/admin approval
        quorum_threshold: u32,
    },
    /// Join request submitted and its artifact issued
    JoinRequested {
        /// New request id
        request_id: JoinRequestId,
        /// Tribe applied to
        tribe_id: TribeId,
        /// Applicant address
        applicant: Address,
        /// Artifact minted for the applicant
        artifact_id: ArtifactId,
        /// URI the artifact was issued with
        artifact_uri: String,
    },
    /// Quorum vote recorded
    ApprovalRecorded {
        /// Request voted on
        request_id: JoinRequestId,
        /// Voting member
        approver: Address,
        /// Tally after this vote
        approvals: usize,
        /// Votes required
        required: u32,
    },
    /// Join request reached a terminal state
    JoinRequestFinalized {
        /// Finalized request
        request_id: JoinRequestId,
        /// Tribe applied to
        tribe_id: TribeId,
        /// Applicant address
        applicant: Address,
        /// Terminal outcome
        outcome: FinalOutcome,
        /// Caller whose action finalized the request; the applicant for open tribes
        decided_by: Address,
    },
    /// Address added to a tribe's member set
    MemberAdmitted {
        /// Tribe joined
        tribe_id: TribeId,
        /// New member
        member: Address,
        /// How the member was admitted
        path: AdmissionPath,
    },
    /// Global admin role handed over
    AdminTransferred {
        /// Outgoing admin
        previous: Address,
        /// Incoming admin
        next: Address,
    },
}

impl TribeFact {
    /// Sub-type discriminator used in logs and summaries.
    pub fn fact_type(&self) -> &'static str {
        match self {
            TribeFact::TribeCreated { .. } => "tribe-created",
            TribeFact::JoinRequested { .. } => "join-requested",
            TribeFact::ApprovalRecorded { .. } => "approval-recorded",
            TribeFact::JoinRequestFinalized { .. } => "join-request-finalized",
            TribeFact::MemberAdmitted { .. } => "member-admitted",
            TribeFact::AdminTransferred { .. } => "admin-transferred",
        }
    }

    /// Tribe the fact concerns, if it is tribe-scoped.
    ///
    /// `ApprovalRecorded` carries only the request id.
    pub fn tribe_id(&self) -> Option<TribeId> {
        match self {
            TribeFact::TribeCreated { tribe_id, .. }
            | TribeFact::JoinRequested { tribe_id, .. }
            | TribeFact::JoinRequestFinalized { tribe_id, .. }
            | TribeFact::MemberAdmitted { tribe_id, .. } => Some(*tribe_id),
            TribeFact::ApprovalRecorded { .. } | TribeFact::AdminTransferred { .. } => None,
        }
    }

    /// Serialize in the versioned envelope.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TotemError> {
        bincode::serialize(&VersionedTribeFact {
            schema_version: TRIBE_FACT_SCHEMA_VERSION,
            fact: self.clone(),
        })
        .map_err(|e| TotemError::serialization(format!("TribeFact encoding failed: {e}")))
    }

    /// Decode from bincode or JSON, versioned or bare.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if let Ok(versioned) = bincode::deserialize::<VersionedTribeFact>(bytes) {
            if versioned.schema_version == TRIBE_FACT_SCHEMA_VERSION {
                return Some(versioned.fact);
            }
        }
        if let Ok(versioned) = serde_json::from_slice::<VersionedTribeFact>(bytes) {
            if versioned.schema_version == TRIBE_FACT_SCHEMA_VERSION {
                return Some(versioned.fact);
            }
        }
        serde_json::from_slice(bytes).ok()
    }
}

/// A fact together with its log position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedFact {
    /// Position in the log
    pub position: LedgerPosition,
    /// The fact itself
    pub fact: TribeFact,
}

impl RecordedFact {
    /// Encode into a persisted binding.
    pub fn encode(&self) -> Result<EncodedFact, TotemError> {
        Ok(EncodedFact {
            binding_type: TRIBE_FACT_TYPE_ID.to_string(),
            position: self.position,
            data: self.fact.to_bytes()?,
        })
    }

    /// Decode a persisted binding; `None` for other fact types or bad data.
    pub fn decode(encoded: &EncodedFact) -> Option<Self> {
        if encoded.binding_type != TRIBE_FACT_TYPE_ID {
            return None;
        }
        TribeFact::from_bytes(&encoded.data).map(|fact| RecordedFact {
            position: encoded.position,
            fact,
        })
    }
}

/// A fact as persisted: type tag, log position and envelope bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedFact {
    /// Fact type tag, `TRIBE_FACT_TYPE_ID` for tribe facts
    pub binding_type: String,
    /// Position in the originating log
    pub position: LedgerPosition,
    /// Versioned envelope bytes
    pub data: Vec<u8>,
}

/// Encode a fact sequence as one persisted log.
pub fn encode_fact_log(entries: &[RecordedFact]) -> Result<Vec<u8>, TotemError> {
    let encoded = entries
        .iter()
        .map(RecordedFact::encode)
        .collect::<Result<Vec<_>, _>>()?;
    bincode::serialize(&encoded)
        .map_err(|e| TotemError::serialization(format!("fact log encoding failed: {e}")))
}

/// Split a persisted log back into its bindings.
pub fn decode_fact_log(bytes: &[u8]) -> Result<Vec<EncodedFact>, TotemError> {
    bincode::deserialize(bytes)
        .map_err(|e| TotemError::serialization(format!("fact log decoding failed: {e}")))
}

/// Append-only fact log.
#[derive(Debug, Clone)]
pub struct FactLog {
    entries: Vec<RecordedFact>,
    next_position: LedgerPosition,
}

impl Default for FactLog {
    fn default() -> Self {
        Self::new()
    }
}

impl FactLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_position: LedgerPosition::FIRST,
        }
    }

    /// Append a fact and return its position.
    pub fn append(&mut self, fact: TribeFact) -> LedgerPosition {
        let position = self.next_position;
        self.next_position = position.next();
        self.entries.push(RecordedFact { position, fact });
        position
    }

    /// All entries in append order.
    pub fn entries(&self) -> &[RecordedFact] {
        &self.entries
    }

    /// Entries at or after `position`.
    pub fn since(&self, position: LedgerPosition) -> &[RecordedFact] {
        let start = self.entries.partition_point(|entry| entry.position < position);
        &self.entries[start..]
    }

    /// Position the next appended fact will receive.
    pub fn next_position(&self) -> LedgerPosition {
        self.next_position
    }

    /// Number of facts appended.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Summary counts accumulated over a fact sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TribeFactDelta {
    /// Tribes created
    pub tribes_created: u64,
    /// Join requests submitted
    pub join_requests: u64,
    /// Quorum votes recorded
    pub approvals_recorded: u64,
    /// Requests finalized approved
    pub requests_approved: u64,
    /// Requests finalized rejected
    pub requests_rejected: u64,
    /// Members admitted by any path
    pub members_admitted: u64,
    /// Admin handovers
    pub admin_transfers: u64,
}

impl TribeFactDelta {
    /// Combine two deltas.
    pub fn merge(self, other: Self) -> Self {
        Self {
            tribes_created: self.tribes_created + other.tribes_created,
            join_requests: self.join_requests + other.join_requests,
            approvals_recorded: self.approvals_recorded + other.approvals_recorded,
            requests_approved: self.requests_approved + other.requests_approved,
            requests_rejected: self.requests_rejected + other.requests_rejected,
            members_admitted: self.members_admitted + other.members_admitted,
            admin_transfers: self.admin_transfers + other.admin_transfers,
        }
    }
}

/// Reducer for tribe facts
///
/// Converts each fact into a count delta; reducing a sequence is the merge of
/// the per-fact deltas.
pub struct TribeFactReducer;

impl TribeFactReducer {
    /// Type identifier this reducer handles.
    pub fn handles_type(&self) -> &'static str {
        TRIBE_FACT_TYPE_ID
    }

    /// Delta contributed by a single fact.
    pub fn apply(&self, fact: &TribeFact) -> TribeFactDelta {
        let mut delta = TribeFactDelta::default();
        match fact {
            TribeFact::TribeCreated { .. } => delta.tribes_created = 1,
            TribeFact::JoinRequested { .. } => delta.join_requests = 1,
            TribeFact::ApprovalRecorded { .. } => delta.approvals_recorded = 1,
            TribeFact::JoinRequestFinalized { outcome, .. } => match outcome {
                FinalOutcome::Approved => delta.requests_approved = 1,
                FinalOutcome::Rejected => delta.requests_rejected = 1,
            },
            TribeFact::MemberAdmitted { .. } => delta.members_admitted = 1,
            TribeFact::AdminTransferred { .. } => delta.admin_transfers = 1,
        }
        delta
    }

    /// Reduce encoded fact bytes, ignoring anything that does not decode.
    pub fn reduce_bytes(&self, binding_type: &str, binding_data: &[u8]) -> Option<TribeFactDelta> {
        if binding_type != self.handles_type() {
            return None;
        }
        TribeFact::from_bytes(binding_data).map(|fact| self.apply(&fact))
    }

    /// Fold persisted bindings into one delta.
    ///
    /// Returns the delta and the number of bindings that were skipped because
    /// they are not tribe facts or do not decode.
    pub fn reduce_encoded(&self, facts: &[EncodedFact]) -> (TribeFactDelta, usize) {
        facts
            .iter()
            .fold((TribeFactDelta::default(), 0), |(acc, skipped), encoded| {
                match self.reduce_bytes(&encoded.binding_type, &encoded.data) {
                    Some(delta) => (acc.merge(delta), skipped),
                    None => (acc, skipped + 1),
                }
            })
    }

    /// Fold a fact sequence into one delta.
    pub fn reduce<'a>(&self, facts: impl IntoIterator<Item = &'a TribeFact>) -> TribeFactDelta {
        facts
            .into_iter()
            .fold(TribeFactDelta::default(), |acc, fact| acc.merge(self.apply(fact)))
    }
}

//! Core identifier types
//!
//! Principals are opaque `Address` values. Tribes, join requests and issued
//! artifacts live in arena-style stores keyed by monotonic integer ids, so all
//! cross references are id lookups rather than embedded pointers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Address of a calling principal.
///
/// Opaque to the governance core: it is only compared, hashed and ordered.
/// The surrounding runtime is responsible for authenticating it.
/// Serialized in its `addr-<uuid>` display form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub Uuid);

impl Address {
    /// Create an address from caller-provided entropy.
    pub fn new_from_entropy(entropy: [u8; 32]) -> Self {
        let mut uuid_bytes = [0u8; 16];
        uuid_bytes.copy_from_slice(&entropy[..16]);
        Self(Uuid::from_bytes(uuid_bytes))
    }

    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Convert to bytes
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.into_bytes()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "addr-{}", self.0)
    }
}

impl FromStr for Address {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Handle both raw UUIDs and prefixed format
        let uuid_str = s.strip_prefix("addr-").unwrap_or(s);
        Ok(Address(Uuid::parse_str(uuid_str)?))
    }
}

impl From<Uuid> for Address {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl TryFrom<String> for Address {
    type Error = uuid::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

macro_rules! sequence_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// First id handed out by an empty arena.
            pub const FIRST: Self = Self(1);

            /// Create from a raw value
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Get the raw value
            pub fn value(&self) -> u64 {
                self.0
            }

            /// The id allocated after this one
            pub fn next(self) -> Self {
                Self(self.0.saturating_add(1))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

sequence_id!(
    /// Identifier of a tribe. Monotonically assigned, never reused.
    TribeId,
    "tribe"
);

sequence_id!(
    /// Identifier of a join request. Monotonically assigned, never reused.
    JoinRequestId,
    "request"
);

sequence_id!(
    /// Identifier returned by the initiation artifact issuer.
    ArtifactId,
    "artifact"
);

sequence_id!(
    /// Position of a fact in the append-only fact log.
    LedgerPosition,
    "pos"
);

/// Per-operation identity supplied by the surrounding runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Authenticated principal invoking the operation
    pub caller: Address,
}

impl CallContext {
    /// Create a call context for the given caller
    pub fn new(caller: Address) -> Self {
        Self { caller }
    }
}

impl From<Address> for CallContext {
    fn from(caller: Address) -> Self {
        Self { caller }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_roundtrip() {
        let addr = Address::new_from_entropy([7u8; 32]);
        let shown = addr.to_string();
        assert!(shown.starts_with("addr-"));
        assert_eq!(shown.parse::<Address>().unwrap(), addr);
        assert_eq!(addr.uuid().to_string().parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_address_entropy_is_deterministic() {
        assert_eq!(
            Address::new_from_entropy([3u8; 32]),
            Address::new_from_entropy([3u8; 32])
        );
        assert_ne!(
            Address::new_from_entropy([3u8; 32]),
            Address::new_from_entropy([4u8; 32])
        );
    }

    #[test]
    fn test_sequence_ids() {
        assert_eq!(TribeId::FIRST.value(), 1);
        assert_eq!(TribeId::FIRST.next(), TribeId::new(2));
        assert_eq!(JoinRequestId::new(9).to_string(), "request-9");
        assert_eq!(LedgerPosition::new(u64::MAX).next().value(), u64::MAX);
    }

    #[test]
    fn test_address_serializes_as_display_form() {
        let addr = Address::new_from_entropy([9u8; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), addr);
        assert!(serde_json::from_str::<Address>("\"addr-nope\"").is_err());
    }

    #[test]
    fn test_ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&TribeId::new(42)).unwrap();
        assert_eq!(json, "42");
    }
}

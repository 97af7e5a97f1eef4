//! Mock artifact issuer for deterministic testing
//!
//! `MockArtifactIssuer` hands out sequential `ArtifactId`s, records every
//! successful issuance and can be told to fail for a particular URI or for
//! every call. Clones share state, so a test can keep a handle after moving
//! the issuer into a service.
//!
//! # Blocking Lock Usage
//!
//! Uses `std::sync::Mutex`; the lock is never held across an await point.

#![allow(clippy::disallowed_types)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use totem_core::{Address, ArtifactError, ArtifactId, InitiationArtifactEffects};

/// One successful issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedArtifact {
    /// Id returned to the caller
    pub artifact_id: ArtifactId,
    /// Applicant the artifact was minted for
    pub applicant: Address,
    /// URI it was minted from
    pub uri: String,
}

#[derive(Debug)]
struct MockIssuerState {
    next_id: ArtifactId,
    issued: Vec<IssuedArtifact>,
    calls: usize,
    failing_uris: HashSet<String>,
    fail_all: Option<String>,
}

/// In-memory issuer with injectable failures.
#[derive(Debug, Clone)]
pub struct MockArtifactIssuer {
    state: Arc<Mutex<MockIssuerState>>,
}

impl Default for MockArtifactIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockArtifactIssuer {
    /// Create an issuer that succeeds for every URI.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockIssuerState {
                next_id: ArtifactId::FIRST,
                issued: Vec::new(),
                calls: 0,
                failing_uris: HashSet::new(),
                fail_all: None,
            })),
        }
    }

    /// Reject every issuance for `uri`.
    pub fn fail_for_uri(&self, uri: impl Into<String>) -> &Self {
        self.state.lock().unwrap().failing_uris.insert(uri.into());
        self
    }

    /// Report the issuer unavailable for every call.
    pub fn fail_all(&self, reason: impl Into<String>) -> &Self {
        self.state.lock().unwrap().fail_all = Some(reason.into());
        self
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.failing_uris.clear();
        state.fail_all = None;
    }

    /// Artifacts issued so far, in order.
    pub fn issued(&self) -> Vec<IssuedArtifact> {
        self.state.lock().unwrap().issued.clone()
    }

    /// Number of successful issuances.
    pub fn issued_count(&self) -> usize {
        self.state.lock().unwrap().issued.len()
    }

    /// Number of calls, including failed ones.
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

#[async_trait]
impl InitiationArtifactEffects for MockArtifactIssuer {
    async fn issue_initiation_artifact(
        &self,
        applicant: Address,
        uri: &str,
    ) -> Result<ArtifactId, ArtifactError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        if let Some(reason) = &state.fail_all {
            return Err(ArtifactError::Unavailable {
                reason: reason.clone(),
            });
        }
        if state.failing_uris.contains(uri) {
            return Err(ArtifactError::Rejected {
                applicant,
                reason: format!("uri {uri} is blocked"),
            });
        }

        let artifact_id = state.next_id;
        state.next_id = artifact_id.next();
        state.issued.push(IssuedArtifact {
            artifact_id,
            applicant,
            uri: uri.to_string(),
        });
        Ok(artifact_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test_address;

    #[tokio::test]
    async fn test_sequential_ids_and_record() {
        let issuer = MockArtifactIssuer::new();
        let first = issuer
            .issue_initiation_artifact(test_address(2), "ipfs://a")
            .await
            .unwrap();
        let second = issuer
            .issue_initiation_artifact(test_address(3), "ipfs://b")
            .await
            .unwrap();

        assert_eq!(first, ArtifactId::new(1));
        assert_eq!(second, ArtifactId::new(2));
        assert_eq!(issuer.issued()[1].uri, "ipfs://b");
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let issuer = MockArtifactIssuer::new();
        issuer.fail_for_uri("ipfs://bad");

        let result = issuer
            .issue_initiation_artifact(test_address(2), "ipfs://bad")
            .await;
        assert!(matches!(result, Err(ArtifactError::Rejected { .. })));

        let handle = issuer.clone();
        handle.fail_all("maintenance");
        let result = issuer
            .issue_initiation_artifact(test_address(2), "ipfs://good")
            .await;
        assert!(matches!(result, Err(ArtifactError::Unavailable { .. })));

        issuer.clear_failures();
        assert!(issuer
            .issue_initiation_artifact(test_address(2), "ipfs://bad")
            .await
            .is_ok());
        assert_eq!(issuer.call_count(), 3);
        assert_eq!(issuer.issued_count(), 1);
    }
}

//! In-process artifact issuer
//!
//! Hands out sequential artifact ids without minting anything. URIs passed
//! with `--fail-issuance-for` are rejected, to exercise the rollback path.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use totem_core::{Address, ArtifactError, ArtifactId, InitiationArtifactEffects};

/// Sequential issuer with a fixed set of failing URIs.
#[derive(Debug)]
pub struct LocalArtifactIssuer {
    next: AtomicU64,
    failing_uris: HashSet<String>,
}

impl LocalArtifactIssuer {
    /// Create an issuer that rejects the given URIs.
    pub fn new(failing_uris: impl IntoIterator<Item = String>) -> Self {
        Self {
            next: AtomicU64::new(ArtifactId::FIRST.value()),
            failing_uris: failing_uris.into_iter().collect(),
        }
    }
}

#[async_trait]
impl InitiationArtifactEffects for LocalArtifactIssuer {
    async fn issue_initiation_artifact(
        &self,
        applicant: Address,
        uri: &str,
    ) -> Result<ArtifactId, ArtifactError> {
        if self.failing_uris.contains(uri) {
            return Err(ArtifactError::Rejected {
                applicant,
                reason: format!("issuance disabled for {uri}"),
            });
        }
        let artifact_id = ArtifactId::new(self.next.fetch_add(1, Ordering::SeqCst));
        tracing::debug!(
            applicant = %applicant,
            artifact_id = %artifact_id,
            "Issued local artifact"
        );
        Ok(artifact_id)
    }
}

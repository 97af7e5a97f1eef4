//! Initiation artifact issuance.
//!
//! # Effect Classification
//!
//! - **Category**: External collaborator
//! - **Implementation**: supplied by the embedding runtime (NFT minting)
//! - **Usage**: invoked once per successful join request submission

use crate::identifiers::{Address, ArtifactId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type for artifact issuance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ArtifactError {
    /// Issuer refused to mint for this applicant
    #[error("Issuer rejected artifact for {applicant}: {reason}")]
    Rejected {
        /// Applicant the artifact was for
        applicant: Address,
        /// Issuer's explanation
        reason: String,
    },
    /// Issuer could not be reached or failed internally
    #[error("Issuer unavailable: {reason}")]
    Unavailable {
        /// Failure description
        reason: String,
    },
}

/// Capability to mint the artifact handed to an applicant when they apply.
///
/// A failure must abort the surrounding request submission, so implementations
/// should not leave partially-issued artifacts behind when returning `Err`.
#[async_trait]
pub trait InitiationArtifactEffects: Send + Sync {
    /// Mint an initiation artifact for `applicant` from `uri`.
    async fn issue_initiation_artifact(
        &self,
        applicant: Address,
        uri: &str,
    ) -> Result<ArtifactId, ArtifactError>;
}

#[async_trait]
impl<T: InitiationArtifactEffects + ?Sized> InitiationArtifactEffects for std::sync::Arc<T> {
    async fn issue_initiation_artifact(
        &self,
        applicant: Address,
        uri: &str,
    ) -> Result<ArtifactId, ArtifactError> {
        (**self).issue_initiation_artifact(applicant, uri).await
    }
}

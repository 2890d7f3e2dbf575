//! Narrow interfaces to the systems the workflows depend on.
//!
//! Every method reports failure as an [`ExternalError`] so that the
//! collaborator's own message reaches the caller unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wot_types::{
    Confidence, ExternalError, SigId, User, UserVersion, WotProof, WotReaction, WotVouch,
};

/// Maps a username or assertion to the account it names.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<User, ExternalError>;
}

/// Proofs that no longer match what was previously tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackBreaks {
    pub proofs: Vec<WotProof>,
}

/// Result of identifying a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyOutcome {
    /// Present when identification found broken tracking.
    #[serde(default)]
    pub track_breaks: Option<TrackBreaks>,
    /// Proofs that failed to verify without breaking tracking.
    #[serde(default)]
    pub failing_proofs: Vec<WotProof>,
}

/// Checks a user's identity proofs before a vouch is issued.
#[async_trait]
pub trait Identifier: Send + Sync {
    async fn identify(&self, user: &User, reason: &str) -> Result<IdentifyOutcome, ExternalError>;
}

/// What the voucher says about the vouchee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VouchRequest {
    pub vouch_texts: Vec<String>,
    #[serde(default)]
    pub confidence: Confidence,
}

/// Issues attestations and reactions on behalf of the acting user.
#[async_trait]
pub trait AttestationIssuer: Send + Sync {
    /// Vouches for `vouchee`, superseding any earlier vouch from `me`.
    async fn issue_vouch(
        &self,
        me: &User,
        vouchee: &User,
        request: &VouchRequest,
        failing_proofs: &[WotProof],
    ) -> Result<WotVouch, ExternalError>;

    /// Reacts to the vouch `voucher` issued for `me`, identified by `proof`.
    async fn issue_reaction(
        &self,
        me: &User,
        voucher: &UserVersion,
        proof: &SigId,
        reaction: WotReaction,
    ) -> Result<WotVouch, ExternalError>;

    /// Revokes the vouch `me` issued for `vouchee`.
    async fn revoke(&self, me: &User, vouchee: &UserVersion) -> Result<WotVouch, ExternalError>;
}

/// Reads attestation records.
#[async_trait]
pub trait AttestationReader: Send + Sync {
    /// Vouches received by `me`, in repository order.
    async fn list_mine(&self, me: &User) -> Result<Vec<WotVouch>, ExternalError>;

    /// Vouches received by `user`, in repository order.
    async fn list_for(&self, user: &User) -> Result<Vec<WotVouch>, ExternalError>;
}

//! Vouch records and the metadata attached to them.

use serde::{Deserialize, Serialize};

use crate::identity::{NormalizedUsername, SigId, UserVersion};
use crate::WotStatus;

/// How the voucher confirmed the vouchee's username out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsernameVerificationType {
    Audio,
    Video,
    Email,
    OtherChat,
    InPerson,
}

/// Confidence metadata supplied by the voucher at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Confidence {
    /// Channel through which the username was confirmed, if any.
    pub username_verified_via: Option<UsernameVerificationType>,
    /// Proofs of the vouchee the voucher personally checked.
    pub proofs: Vec<SigId>,
    /// Free-form note about how the voucher knows the vouchee.
    pub other: Option<String>,
}

/// A single identity proof, as reported by identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WotProof {
    /// Kind of proof (e.g. `"dns"`, `"github"`).
    pub proof_type: String,
    /// Service-specific name (hostname, domain, service name).
    pub name: String,
    /// Account name on the proved service.
    pub username: String,
}

/// One attestation from a voucher to a vouchee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WotVouch {
    /// Statement backing this attestation; reactions reference it.
    pub vouch_proof: SigId,
    /// The identity issuing the vouch.
    pub voucher: UserVersion,
    /// Voucher's username when the vouch was issued.
    pub voucher_username: NormalizedUsername,
    /// The identity vouched for.
    pub vouchee: UserVersion,
    /// Vouchee's username when the vouch was issued.
    pub vouchee_username: NormalizedUsername,
    /// Statements attached by the voucher, in order.
    pub vouch_texts: Vec<String>,
    pub confidence: Confidence,
    /// Proofs that failed identification when the vouch was issued.
    #[serde(default)]
    pub failing_proofs: Vec<WotProof>,
    pub status: WotStatus,
    /// When the vouch was issued (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub vouched_at: String,
}

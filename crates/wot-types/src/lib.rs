//! Shared types, error definitions, and constants for the web-of-trust service.
//!
//! This crate provides the foundational types used across all `wot-*` crates:
//! account identities (`UserVersion`, `NormalizedUsername`), statement ids
//! (`SigId`), the attestation status and reaction enums, the vouch record
//! itself, and the pass-through [`ExternalError`] used at collaborator seams.
//!
//! No crate in the workspace depends on anything *except* `wot-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

mod error;
mod identity;
mod vouch;

pub use error::ExternalError;
pub use identity::{NormalizedUsername, ParseIdError, SigId, Uid, User, UserVersion};
pub use vouch::{Confidence, UsernameVerificationType, WotProof, WotVouch};

/// Status of a web-of-trust attestation.
///
/// Stored as an integer code. Codes outside the known range decode to
/// [`WotStatus::Unknown`] rather than failing, so a newer schema never turns
/// into a silently ignored string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WotStatus {
    /// Record exists but carries no status; the record is corrupt.
    None,
    /// Issued by the voucher, awaiting the vouchee's reaction.
    Proposed,
    /// Accepted by the vouchee.
    Accepted,
    /// Rejected by the vouchee.
    Rejected,
    /// Withdrawn by the voucher.
    Revoked,
    /// A status code this build does not recognise.
    Unknown(i64),
}

impl WotStatus {
    /// Returns the numeric code for this status.
    pub fn code(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Proposed => 1,
            Self::Accepted => 2,
            Self::Rejected => 3,
            Self::Revoked => 4,
            Self::Unknown(code) => code,
        }
    }

    /// Converts a numeric code to a `WotStatus`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::None,
            1 => Self::Proposed,
            2 => Self::Accepted,
            3 => Self::Rejected,
            4 => Self::Revoked,
            other => Self::Unknown(other),
        }
    }

    /// Returns the string label for this status, or `None` if unrecognised.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::None => Some("NONE"),
            Self::Proposed => Some("PROPOSED"),
            Self::Accepted => Some("ACCEPTED"),
            Self::Rejected => Some("REJECTED"),
            Self::Revoked => Some("REVOKED"),
            Self::Unknown(_) => None,
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "NONE" => Some(Self::None),
            "PROPOSED" => Some(Self::Proposed),
            "ACCEPTED" => Some(Self::Accepted),
            "REJECTED" => Some(Self::Rejected),
            "REVOKED" => Some(Self::Revoked),
            _ => None,
        }
    }
}

impl std::fmt::Display for WotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.label() {
            Some(label) => f.write_str(label),
            None => write!(f, "UNKNOWN({})", self.code()),
        }
    }
}

impl Serialize for WotStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.label() {
            Some(label) => serializer.serialize_str(label),
            None => serializer.serialize_i64(self.code()),
        }
    }
}

impl<'de> Deserialize<'de> for WotStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Label(String),
            Code(i64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Label(label) => Self::from_label(&label).ok_or_else(|| {
                serde::de::Error::custom(format!("unknown attestation status label: {label}"))
            }),
            Repr::Code(code) => Ok(Self::from_code(code)),
        }
    }
}

/// A vouchee's response to an attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WotReaction {
    /// Accept the vouch.
    Accept,
    /// Reject the vouch.
    Reject,
}

impl WotReaction {
    /// Returns the string label for this reaction.
    pub fn label(self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
        }
    }
}

impl std::fmt::Display for WotReaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

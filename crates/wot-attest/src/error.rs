//! Error types for attestation transitions and persistence.

use thiserror::Error;
use wot_db::DbTaskError;
use wot_types::{SigId, UserVersion, WotStatus};

/// A reaction or revocation refused by the transition rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactionError {
    /// The record has no status at all. It cannot be repaired in place;
    /// the voucher has to issue it again.
    #[error("attestation is corrupt, must be recreated")]
    InvalidState,

    /// Policy forbids leaving the record's current status.
    #[error("cannot react to a previously {} attestation", status_word(.0))]
    IllegalTransition(WotStatus),

    /// The requested status already holds.
    #[error("already {}", status_word(.0))]
    NoOp(WotStatus),

    /// The stored status code is not one this build knows.
    #[error("unknown status on web-of-trust attestation: {0}")]
    UnknownState(i64),
}

fn status_word(status: &WotStatus) -> &'static str {
    match status {
        WotStatus::None => "unset",
        WotStatus::Proposed => "proposed",
        WotStatus::Accepted => "accepted",
        WotStatus::Rejected => "rejected",
        WotStatus::Revoked => "revoked",
        WotStatus::Unknown(_) => "unknown",
    }
}

/// Errors from the SQLite attestation store.
#[derive(Debug, Error)]
pub enum AttestStoreError {
    /// A database operation failed.
    #[error("attestation database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON columns could not be encoded or decoded.
    #[error("attestation serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transition rules refused the change.
    #[error(transparent)]
    Reaction(#[from] ReactionError),

    /// No vouch exists for the pair.
    #[error("no attestation from {voucher} to {vouchee}")]
    NotFound {
        voucher: UserVersion,
        vouchee: UserVersion,
    },

    /// The referenced proof is not the current statement for the pair.
    #[error("attestation proof {0} is not current; it was superseded or never issued")]
    StaleProof(SigId),

    /// A stored row failed to parse back into a record.
    #[error("corrupt attestation row {id}: {reason}")]
    CorruptRow { id: i64, reason: String },

    /// The query could not be scheduled on the blocking pool.
    #[error(transparent)]
    Task(#[from] DbTaskError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_error_messages() {
        assert_eq!(
            ReactionError::InvalidState.to_string(),
            "attestation is corrupt, must be recreated"
        );
        assert_eq!(
            ReactionError::IllegalTransition(WotStatus::Rejected).to_string(),
            "cannot react to a previously rejected attestation"
        );
        assert_eq!(
            ReactionError::IllegalTransition(WotStatus::Revoked).to_string(),
            "cannot react to a previously revoked attestation"
        );
        assert_eq!(
            ReactionError::NoOp(WotStatus::Accepted).to_string(),
            "already accepted"
        );
        assert_eq!(
            ReactionError::UnknownState(12).to_string(),
            "unknown status on web-of-trust attestation: 12"
        );
    }
}

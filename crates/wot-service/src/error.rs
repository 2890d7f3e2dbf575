//! Workflow errors.

use thiserror::Error;
use wot_attest::ReactionError;
use wot_notify::NotifyError;
use wot_types::ExternalError;

#[derive(Debug, Error)]
pub enum WotError {
    /// The transition rules refused the reaction.
    #[error(transparent)]
    Reaction(#[from] ReactionError),

    /// The named voucher has no attestation for the acting user.
    #[error("no attestation of you found from {0}")]
    NotFound(String),

    /// Identification found broken tracking; nothing was issued.
    #[error("tracking broke")]
    TrackingBroke,

    /// A pending notification body did not decode.
    #[error("failed to decode notification: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request was rejected before reaching any collaborator.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A collaborator failed.
    #[error(transparent)]
    External(#[from] ExternalError),
}

impl From<NotifyError> for WotError {
    fn from(err: NotifyError) -> Self {
        match err {
            NotifyError::Decode { id, source } => {
                tracing::warn!(id, error = %source, "undecodable notification stopped dismissal");
                Self::Decode(source)
            }
            NotifyError::Store(inner) => Self::External(inner),
            other => Self::External(ExternalError::new(other)),
        }
    }
}

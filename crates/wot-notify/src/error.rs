//! Error types for notification storage and dismissal.

use thiserror::Error;
use wot_db::DbTaskError;
use wot_types::ExternalError;

/// Errors raised while queueing or dismissing notification items.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// A database operation failed.
    #[error("notification database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A notification body could not be encoded.
    #[error("notification serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A pending item's body did not decode. Dismissal stops at the first
    /// such item; anything dismissed before it stays dismissed.
    #[error("notification {id} has an undecodable body: {source}")]
    Decode {
        id: i64,
        #[source]
        source: serde_json::Error,
    },

    /// The notification store failed to list or dismiss items.
    #[error(transparent)]
    Store(ExternalError),

    /// The query could not be scheduled on the blocking pool.
    #[error(transparent)]
    Task(#[from] DbTaskError),
}

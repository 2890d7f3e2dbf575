//! Web-of-trust workflows.
//!
//! [`WotService`] sequences identity resolution, identification, issuance
//! and validation for the vouch/react workflow. It owns no storage: every
//! collaborator sits behind one of the traits in [`collaborators`], and
//! collaborator failures come back unchanged as [`WotError::External`].
//!
//! ```rust,ignore
//! let service = WotService::new(Collaborators {
//!     resolver: Arc::new(directory.clone()),
//!     identifier: Arc::new(identify_client),
//!     issuer: Arc::new(backend.clone()),
//!     reader: Arc::new(backend),
//!     notifications: Arc::new(SqliteNotificationStore::new(pool)),
//! });
//! let vouch = service.vouch_from_assertion(&me, "bob", request).await?;
//! ```

pub mod collaborators;
pub mod error;
mod service;

pub use collaborators::{
    AttestationIssuer, AttestationReader, IdentifyOutcome, Identifier, IdentityResolver,
    TrackBreaks, VouchRequest,
};
pub use error::WotError;
pub use service::{Collaborators, WotService, VOUCH_REASON_PREFIX};
pub use wot_notify::NotificationStore;

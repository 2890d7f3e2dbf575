//! Web-of-trust attestations.
//!
//! Two halves:
//! 1. **Transitions**: the pure rules deciding whether a reaction (or a
//!    revocation) is legal for a vouch in a given status, and which status
//!    results. Nothing here touches storage.
//! 2. **Store**: SQLite persistence for vouch records, keeping exactly one
//!    row per (voucher, vouchee) pair and routing every status change
//!    through the transition rules.

pub mod error;
pub mod store;
pub mod transition;

pub use error::{AttestStoreError, ReactionError};
pub use store::{
    apply_reaction, get_vouch, insert_vouch, list_vouches_for, revoke_vouch, NewVouch,
};
pub use transition::{check_reaction, check_revoke, find_vouch_from};

#[cfg(test)]
mod tests;

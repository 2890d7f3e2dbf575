//! Attestation status transitions.
//!
//! ```text
//! NONE ──(corrupt)
//! PROPOSED ──accept──▶ ACCEPTED ──reject──▶ REJECTED
//!     └──────reject─────────────────────────▲
//! any of PROPOSED / ACCEPTED / REJECTED ──revoke──▶ REVOKED
//! ```
//!
//! REJECTED and REVOKED are terminal for reactions. Re-rejecting an
//! accepted vouch is allowed and expresses withdrawal of trust.

use wot_types::{UserVersion, WotReaction, WotStatus, WotVouch};

use crate::error::ReactionError;

fn reacted(reaction: WotReaction) -> WotStatus {
    match reaction {
        WotReaction::Accept => WotStatus::Accepted,
        WotReaction::Reject => WotStatus::Rejected,
    }
}

/// Checks a reaction against a record's current status.
///
/// Returns the status the record takes once the reaction is applied.
///
/// # Errors
///
/// - [`ReactionError::InvalidState`] for `NONE`
/// - [`ReactionError::IllegalTransition`] for `REJECTED` and `REVOKED`
/// - [`ReactionError::NoOp`] for accepting an `ACCEPTED` record
/// - [`ReactionError::UnknownState`] for unrecognised codes
pub fn check_reaction(current: WotStatus, reaction: WotReaction) -> Result<WotStatus, ReactionError> {
    match current {
        WotStatus::None => Err(ReactionError::InvalidState),
        WotStatus::Rejected | WotStatus::Revoked => Err(ReactionError::IllegalTransition(current)),
        WotStatus::Accepted => match reaction {
            WotReaction::Accept => Err(ReactionError::NoOp(WotStatus::Accepted)),
            WotReaction::Reject => Ok(WotStatus::Rejected),
        },
        WotStatus::Proposed => Ok(reacted(reaction)),
        WotStatus::Unknown(code) => Err(ReactionError::UnknownState(code)),
    }
}

/// Checks a voucher-side revocation against a record's current status.
pub fn check_revoke(current: WotStatus) -> Result<WotStatus, ReactionError> {
    match current {
        WotStatus::None => Err(ReactionError::InvalidState),
        WotStatus::Revoked => Err(ReactionError::NoOp(WotStatus::Revoked)),
        WotStatus::Proposed | WotStatus::Accepted | WotStatus::Rejected => Ok(WotStatus::Revoked),
        WotStatus::Unknown(code) => Err(ReactionError::UnknownState(code)),
    }
}

/// Finds the vouch issued by `voucher` among `records`.
///
/// The first match in slice order wins, so callers get a deterministic
/// answer even if a repository ever returns duplicates.
pub fn find_vouch_from<'a>(records: &'a [WotVouch], voucher: &UserVersion) -> Option<&'a WotVouch> {
    records.iter().find(|record| &record.voucher == voucher)
}

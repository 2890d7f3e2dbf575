//! Dismissal rules for a single notification.

use wot_types::NormalizedUsername;

use crate::category::WotCategory;
use crate::message::WotMsg;

fn names_match(field: Option<&str>, target: &NormalizedUsername) -> bool {
    field.is_some_and(|name| &NormalizedUsername::new(name) == target)
}

/// Decides whether a notification concerns the (`voucher`, `vouchee`) pair
/// and can be retired for `me`.
///
/// A `new_vouch` item is addressed to the vouchee, so when its body omits the
/// vouchee the recipient matches implicitly if `me` is the target vouchee.
/// `accepted` / `rejected` items are addressed to the voucher and mirror that
/// rule on the voucher side.
pub fn is_dismissable(
    category: WotCategory,
    msg: &WotMsg,
    voucher: &NormalizedUsername,
    vouchee: &NormalizedUsername,
    me: &NormalizedUsername,
) -> bool {
    let voucher_matches = names_match(msg.voucher.as_deref(), voucher);
    let vouchee_matches = names_match(msg.vouchee.as_deref(), vouchee);

    match category {
        WotCategory::NewVouch => voucher_matches && (vouchee_matches || vouchee == me),
        WotCategory::Accepted | WotCategory::Rejected => {
            vouchee_matches && (voucher_matches || voucher == me)
        }
    }
}

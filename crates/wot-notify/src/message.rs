//! Notification item and body types.

use serde::{Deserialize, Serialize};

/// Body of a web-of-trust notification.
///
/// Producers include whichever names are relevant to the recipient, so
/// either field may be missing. Keys also match in their capitalised form
/// (`Voucher`, `Vouchee`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WotMsg {
    #[serde(default, alias = "Voucher", skip_serializing_if = "Option::is_none")]
    pub voucher: Option<String>,
    #[serde(default, alias = "Vouchee", skip_serializing_if = "Option::is_none")]
    pub vouchee: Option<String>,
}

/// A pending notification item, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    /// Monotonically assigned item id, used to dismiss it.
    pub id: i64,
    /// Full category string (e.g. `wot.new_vouch`).
    pub category: String,
    /// Undecoded JSON body.
    pub body: String,
    /// When the item was queued (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub created_at: String,
}

//! Web-of-trust notification categories.

use serde::{Deserialize, Serialize};

/// Prefix shared by every web-of-trust category.
pub const CATEGORY_NAMESPACE: &str = "wot";

/// Categories this crate knows how to match. Anything else under the
/// namespace is left alone.
pub const WOT_CATEGORIES: [WotCategory; 3] = [
    WotCategory::NewVouch,
    WotCategory::Accepted,
    WotCategory::Rejected,
];

/// A recognised web-of-trust notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WotCategory {
    /// Someone vouched for the recipient.
    #[serde(rename = "wot.new_vouch")]
    NewVouch,
    /// The recipient's vouch was accepted.
    #[serde(rename = "wot.accepted")]
    Accepted,
    /// The recipient's vouch was rejected.
    #[serde(rename = "wot.rejected")]
    Rejected,
}

impl WotCategory {
    /// Returns the full category string, namespace included.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewVouch => "wot.new_vouch",
            Self::Accepted => "wot.accepted",
            Self::Rejected => "wot.rejected",
        }
    }

    /// Looks `category` up in [`WOT_CATEGORIES`].
    pub fn from_category(category: &str) -> Option<Self> {
        WOT_CATEGORIES
            .into_iter()
            .find(|known| known.as_str() == category)
    }
}

impl std::fmt::Display for WotCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Retiring web-of-trust notifications once the event they announce is
//! handled.

use async_trait::async_trait;
use wot_types::{ExternalError, NormalizedUsername, User, UserVersion};

use crate::category::{WotCategory, CATEGORY_NAMESPACE};
use crate::error::NotifyError;
use crate::matcher::is_dismissable;
use crate::message::{NotificationItem, WotMsg};

/// Backing store for per-user notification items.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Returns `owner`'s pending items whose category starts with `prefix`,
    /// in the order they were queued.
    async fn items_with_category_prefix(
        &self,
        owner: &UserVersion,
        prefix: &str,
    ) -> Result<Vec<NotificationItem>, ExternalError>;

    /// Dismisses one item. Dismissing an already dismissed item succeeds.
    async fn dismiss(&self, owner: &UserVersion, id: i64) -> Result<(), ExternalError>;
}

/// Dismisses every pending web-of-trust notification of `me` that concerns
/// the (`voucher`, `vouchee`) pair, returning how many were dismissed.
///
/// Items in categories outside [`crate::WOT_CATEGORIES`] are skipped without
/// looking at their body. The first body that fails to decode aborts the
/// batch with [`NotifyError::Decode`]; items dismissed before it stay
/// dismissed.
pub async fn dismiss_wot_notifications<S>(
    store: &S,
    me: &User,
    voucher: &NormalizedUsername,
    vouchee: &NormalizedUsername,
) -> Result<usize, NotifyError>
where
    S: NotificationStore + ?Sized,
{
    let items = store
        .items_with_category_prefix(&me.uv, CATEGORY_NAMESPACE)
        .await
        .map_err(NotifyError::Store)?;

    let mut dismissed = 0;
    for item in items {
        let Some(category) = WotCategory::from_category(&item.category) else {
            continue;
        };

        let msg = serde_json::from_str::<Option<WotMsg>>(&item.body)
            .map_err(|source| NotifyError::Decode { id: item.id, source })?
            .unwrap_or_default();

        if !is_dismissable(category, &msg, voucher, vouchee, &me.username) {
            continue;
        }

        store
            .dismiss(&me.uv, item.id)
            .await
            .map_err(NotifyError::Store)?;
        dismissed += 1;

        tracing::debug!(
            owner = %me.username,
            id = item.id,
            %category,
            %voucher,
            %vouchee,
            "notification dismissed"
        );
    }

    Ok(dismissed)
}

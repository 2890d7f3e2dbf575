//! Notification items for web-of-trust events.
//!
//! When a vouch is proposed, accepted or rejected, a pending item is queued
//! for the party who should hear about it. This crate decides when such an
//! item has served its purpose and retires it.
//!
//! # Categories
//!
//! | Category | Queued for | Body |
//! |----------|------------|------|
//! | `wot.new_vouch` | the vouchee | `{"voucher": ..., "vouchee": ...}` |
//! | `wot.accepted` | the voucher | `{"voucher": ..., "vouchee": ...}` |
//! | `wot.rejected` | the voucher | `{"voucher": ..., "vouchee": ...}` |
//!
//! Either body field may be absent.
//!
//! # Usage
//!
//! ```rust,ignore
//! use wot_notify::{dismiss_wot_notifications, SqliteNotificationStore};
//!
//! let store = SqliteNotificationStore::new(pool);
//! let dismissed = dismiss_wot_notifications(&store, &me, &voucher, &vouchee).await?;
//! ```

mod category;
mod dismiss;
mod error;
mod matcher;
mod message;
mod store;

pub use category::{WotCategory, CATEGORY_NAMESPACE, WOT_CATEGORIES};
pub use dismiss::{dismiss_wot_notifications, NotificationStore};
pub use error::NotifyError;
pub use matcher::is_dismissable;
pub use message::{NotificationItem, WotMsg};
pub use store::{dismiss_item, emit_wot_notification, pending_items, SqliteNotificationStore};

#[cfg(test)]
mod tests;

//! SQLite-backed notification items.
//!
//! Items are keyed by the owner's uid only, so pending notifications
//! survive an account reset.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use wot_db::{run_blocking, DbPool};
use wot_types::{ExternalError, UserVersion};

use crate::category::WotCategory;
use crate::dismiss::NotificationStore;
use crate::error::NotifyError;
use crate::message::{NotificationItem, WotMsg};

/// Queues a notification for `owner` and returns the new item's id.
///
/// Takes a plain `&Connection` so the insert can share a transaction with
/// the vouch write that triggered it.
///
/// # Errors
///
/// Returns `NotifyError::Serialization` if the body cannot be encoded or
/// `NotifyError::Database` on SQL failure.
pub fn emit_wot_notification(
    conn: &Connection,
    owner: &UserVersion,
    category: WotCategory,
    msg: &WotMsg,
) -> Result<i64, NotifyError> {
    let body = serde_json::to_string(msg)?;
    conn.execute(
        "INSERT INTO notification_items (owner_uid, category, body) VALUES (?1, ?2, ?3)",
        params![owner.uid.as_str(), category.as_str(), body],
    )?;
    let id = conn.last_insert_rowid();

    tracing::debug!(%owner, id, %category, "notification queued");
    Ok(id)
}

/// Lists `owner`'s undismissed items whose category starts with `prefix`,
/// oldest first.
pub fn pending_items(
    conn: &Connection,
    owner: &UserVersion,
    prefix: &str,
) -> Result<Vec<NotificationItem>, NotifyError> {
    let mut stmt = conn.prepare(
        "SELECT id, category, body, created_at FROM notification_items
         WHERE owner_uid = ?1
           AND dismissed_at IS NULL
           AND substr(category, 1, length(?2)) = ?2
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![owner.uid.as_str(), prefix], |row| {
        Ok(NotificationItem {
            id: row.get(0)?,
            category: row.get(1)?,
            body: row.get(2)?,
            created_at: row.get(3)?,
        })
    })?;

    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Marks one of `owner`'s items dismissed. Unknown or already dismissed
/// ids are left untouched.
pub fn dismiss_item(conn: &Connection, owner: &UserVersion, id: i64) -> Result<(), NotifyError> {
    conn.execute(
        "UPDATE notification_items SET dismissed_at = datetime('now')
         WHERE id = ?1 AND owner_uid = ?2 AND dismissed_at IS NULL",
        params![id, owner.uid.as_str()],
    )?;
    Ok(())
}

/// [`NotificationStore`] over the shared SQLite pool.
#[derive(Clone)]
pub struct SqliteNotificationStore {
    pool: DbPool,
}

impl SqliteNotificationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for SqliteNotificationStore {
    async fn items_with_category_prefix(
        &self,
        owner: &UserVersion,
        prefix: &str,
    ) -> Result<Vec<NotificationItem>, ExternalError> {
        let owner = owner.clone();
        let prefix = prefix.to_string();
        run_blocking(&self.pool, move |conn| pending_items(conn, &owner, &prefix))
            .await
            .map_err(ExternalError::new)
    }

    async fn dismiss(&self, owner: &UserVersion, id: i64) -> Result<(), ExternalError> {
        let owner = owner.clone();
        run_blocking(&self.pool, move |conn| dismiss_item(conn, &owner, id))
            .await
            .map_err(ExternalError::new)
    }
}

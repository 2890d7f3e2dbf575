//! Dismissal tests against an in-memory fake and the SQLite store.

use std::sync::Mutex;

use async_trait::async_trait;
use wot_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use wot_types::{ExternalError, NormalizedUsername, Uid, User, UserVersion};

use crate::category::WotCategory;
use crate::dismiss::{dismiss_wot_notifications, NotificationStore};
use crate::error::NotifyError;
use crate::message::{NotificationItem, WotMsg};
use crate::store::{emit_wot_notification, pending_items, SqliteNotificationStore};

fn user(name: &str) -> User {
    let username = NormalizedUsername::new(name);
    User::new(UserVersion::new(Uid::derive(&username), 1), username)
}

fn name(s: &str) -> NormalizedUsername {
    NormalizedUsername::new(s)
}

#[derive(Default)]
struct FakeStore {
    items: Mutex<Vec<NotificationItem>>,
    dismissed: Mutex<Vec<i64>>,
}

impl FakeStore {
    fn push(&self, category: &str, body: &str) -> i64 {
        let mut items = self.items.lock().unwrap();
        let id = items.len() as i64 + 1;
        items.push(NotificationItem {
            id,
            category: category.to_string(),
            body: body.to_string(),
            created_at: "2024-01-01 00:00:00".to_string(),
        });
        id
    }

    fn dismissed(&self) -> Vec<i64> {
        self.dismissed.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationStore for FakeStore {
    async fn items_with_category_prefix(
        &self,
        _owner: &UserVersion,
        prefix: &str,
    ) -> Result<Vec<NotificationItem>, ExternalError> {
        let dismissed = self.dismissed();
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| item.category.starts_with(prefix) && !dismissed.contains(&item.id))
            .cloned()
            .collect())
    }

    async fn dismiss(&self, _owner: &UserVersion, id: i64) -> Result<(), ExternalError> {
        self.dismissed.lock().unwrap().push(id);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("notification backend offline")]
struct Offline;

struct BrokenStore;

#[async_trait]
impl NotificationStore for BrokenStore {
    async fn items_with_category_prefix(
        &self,
        _owner: &UserVersion,
        _prefix: &str,
    ) -> Result<Vec<NotificationItem>, ExternalError> {
        Err(ExternalError::new(Offline))
    }

    async fn dismiss(&self, _owner: &UserVersion, _id: i64) -> Result<(), ExternalError> {
        Err(ExternalError::new(Offline))
    }
}

// ── matching ─────────────────────────────────────────────────────────

#[tokio::test]
async fn vouchee_dismisses_new_vouch_without_vouchee_field() {
    let store = FakeStore::default();
    let id = store.push("wot.new_vouch", r#"{"voucher":"alice"}"#);

    let count = dismiss_wot_notifications(&store, &user("bob"), &name("alice"), &name("bob"))
        .await
        .expect("dismissal should succeed");

    assert_eq!(count, 1);
    assert_eq!(store.dismissed(), vec![id]);
}

#[tokio::test]
async fn third_party_does_not_dismiss_new_vouch_without_vouchee_field() {
    let store = FakeStore::default();
    store.push("wot.new_vouch", r#"{"voucher":"alice"}"#);

    let count = dismiss_wot_notifications(&store, &user("carol"), &name("alice"), &name("bob"))
        .await
        .expect("dismissal should succeed");

    assert_eq!(count, 0);
    assert!(store.dismissed().is_empty());
}

#[tokio::test]
async fn voucher_dismisses_reactions_without_voucher_field() {
    let store = FakeStore::default();
    let accepted = store.push("wot.accepted", r#"{"vouchee":"bob"}"#);
    let rejected = store.push("wot.rejected", r#"{"vouchee":"bob"}"#);
    store.push("wot.accepted", r#"{"vouchee":"dave"}"#);

    let count = dismiss_wot_notifications(&store, &user("alice"), &name("alice"), &name("bob"))
        .await
        .expect("dismissal should succeed");

    assert_eq!(count, 2);
    assert_eq!(store.dismissed(), vec![accepted, rejected]);
}

#[tokio::test]
async fn unknown_categories_are_skipped_without_decoding() {
    let store = FakeStore::default();
    store.push("wot.revoked", "not json at all");
    store.push("chat.message", "also not json");
    let id = store.push("wot.new_vouch", r#"{"voucher":"alice","vouchee":"bob"}"#);

    let count = dismiss_wot_notifications(&store, &user("bob"), &name("alice"), &name("bob"))
        .await
        .expect("undecodable bodies outside the allow-list are ignored");

    assert_eq!(count, 1);
    assert_eq!(store.dismissed(), vec![id]);
}

#[tokio::test]
async fn decode_failure_aborts_but_keeps_earlier_dismissals() {
    let store = FakeStore::default();
    let first = store.push("wot.new_vouch", r#"{"voucher":"alice","vouchee":"bob"}"#);
    let broken = store.push("wot.accepted", "{not json");
    store.push("wot.new_vouch", r#"{"voucher":"alice","vouchee":"bob"}"#);

    let err = dismiss_wot_notifications(&store, &user("bob"), &name("alice"), &name("bob"))
        .await
        .expect_err("a corrupt body should abort the batch");

    match err {
        NotifyError::Decode { id, .. } => assert_eq!(id, broken),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.dismissed(), vec![first]);
}

#[tokio::test]
async fn bodies_do_not_leak_between_items() {
    // The second body carries no vouchee; it must not inherit the first's.
    let store = FakeStore::default();
    let full = store.push("wot.new_vouch", r#"{"voucher":"alice","vouchee":"bob"}"#);
    store.push("wot.new_vouch", r#"{"voucher":"alice"}"#);

    let count = dismiss_wot_notifications(&store, &user("carol"), &name("alice"), &name("bob"))
        .await
        .expect("dismissal should succeed");

    assert_eq!(count, 1);
    assert_eq!(store.dismissed(), vec![full]);
}

#[tokio::test]
async fn null_body_decodes_as_an_empty_message() {
    let store = FakeStore::default();
    store.push("wot.new_vouch", "null");
    let matching = store.push("wot.new_vouch", r#"{"voucher":"alice","vouchee":"bob"}"#);

    let count = dismiss_wot_notifications(&store, &user("bob"), &name("alice"), &name("bob"))
        .await
        .expect("a null body is not a decode failure");

    assert_eq!(count, 1);
    assert_eq!(store.dismissed(), vec![matching]);
}

#[tokio::test]
async fn capitalised_body_keys_are_accepted() {
    let store = FakeStore::default();
    let id = store.push("wot.accepted", r#"{"Voucher":"alice","Vouchee":"bob"}"#);

    let count = dismiss_wot_notifications(&store, &user("carol"), &name("alice"), &name("bob"))
        .await
        .expect("dismissal should succeed");

    assert_eq!(count, 1);
    assert_eq!(store.dismissed(), vec![id]);
}

#[tokio::test]
async fn store_failures_pass_through() {
    let err = dismiss_wot_notifications(&BrokenStore, &user("bob"), &name("alice"), &name("bob"))
        .await
        .expect_err("listing should fail");

    match err {
        NotifyError::Store(inner) => {
            assert_eq!(inner.to_string(), "notification backend offline");
            assert!(inner.downcast_ref::<Offline>().is_some());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ── SQLite store ─────────────────────────────────────────────────────

fn test_pool() -> DbPool {
    let pool = create_pool(":memory:", DbRuntimeSettings::single_connection())
        .expect("pool creation should succeed");
    let conn = pool.get().expect("should get a connection");
    run_migrations(&conn).expect("migrations should succeed");
    pool
}

fn msg(voucher: Option<&str>, vouchee: Option<&str>) -> WotMsg {
    WotMsg {
        voucher: voucher.map(str::to_string),
        vouchee: vouchee.map(str::to_string),
    }
}

#[tokio::test]
async fn sqlite_store_dismisses_only_matching_items_of_the_owner() {
    let pool = test_pool();
    let alice = user("alice");
    let bob = user("bob");
    {
        let conn = pool.get().expect("should get a connection");
        emit_wot_notification(&conn, &bob.uv, WotCategory::NewVouch, &msg(Some("alice"), None))
            .expect("emit should succeed");
        emit_wot_notification(&conn, &bob.uv, WotCategory::NewVouch, &msg(Some("dave"), None))
            .expect("emit should succeed");
        emit_wot_notification(&conn, &alice.uv, WotCategory::Accepted, &msg(None, Some("bob")))
            .expect("emit should succeed");
    }

    let store = SqliteNotificationStore::new(pool.clone());
    let count = dismiss_wot_notifications(&store, &bob, &name("alice"), &name("bob"))
        .await
        .expect("dismissal should succeed");
    assert_eq!(count, 1);

    let conn = pool.get().expect("should get a connection");
    let bob_pending = pending_items(&conn, &bob.uv, "wot").expect("list should succeed");
    assert_eq!(bob_pending.len(), 1);
    assert!(bob_pending[0].body.contains("dave"));

    let alice_pending = pending_items(&conn, &alice.uv, "wot").expect("list should succeed");
    assert_eq!(alice_pending.len(), 1, "other owners' items are untouched");
}

#[tokio::test]
async fn sqlite_store_filters_by_category_prefix() {
    let pool = test_pool();
    let bob = user("bob");
    let conn = pool.get().expect("should get a connection");
    emit_wot_notification(&conn, &bob.uv, WotCategory::NewVouch, &msg(Some("alice"), None))
        .expect("emit should succeed");
    conn.execute(
        "INSERT INTO notification_items (owner_uid, category, body) VALUES (?1, 'chat.message', '{}')",
        [bob.uv.uid.as_str()],
    )
    .expect("raw insert should succeed");

    let items = pending_items(&conn, &bob.uv, "wot").expect("list should succeed");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].category, "wot.new_vouch");
    assert_eq!(items[0].body, r#"{"voucher":"alice"}"#);
}

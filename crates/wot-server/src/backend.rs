//! SQLite attestation backend.
//!
//! Implements the issuer and reader seams over `wot-attest`'s store. Every
//! write that produces a notification (a new vouch for the vouchee, a
//! reaction for the voucher) commits the record and the notification in
//! one transaction.

use async_trait::async_trait;
use rusqlite::{Connection, TransactionBehavior};
use thiserror::Error;
use wot_attest::{
    apply_reaction, insert_vouch, list_vouches_for, revoke_vouch, AttestStoreError, NewVouch,
};
use wot_db::{run_blocking, DbPool, DbTaskError};
use wot_notify::{emit_wot_notification, NotifyError, WotCategory, WotMsg};
use wot_service::{AttestationIssuer, AttestationReader, VouchRequest};
use wot_types::{
    ExternalError, SigId, User, UserVersion, WotProof, WotReaction, WotVouch,
};

/// Errors from the attestation backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Attest(#[from] AttestStoreError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("attestation transaction failed: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Task(#[from] DbTaskError),
}

fn reaction_category(reaction: WotReaction) -> WotCategory {
    match reaction {
        WotReaction::Accept => WotCategory::Accepted,
        WotReaction::Reject => WotCategory::Rejected,
    }
}

fn notification_body(vouch: &WotVouch) -> WotMsg {
    WotMsg {
        voucher: Some(vouch.voucher_username.to_string()),
        vouchee: Some(vouch.vouchee_username.to_string()),
    }
}

/// Stores `vouch` and queues `wot.new_vouch` for the vouchee.
pub fn issue_vouch_tx(conn: &mut Connection, vouch: &NewVouch) -> Result<WotVouch, BackendError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let stored = insert_vouch(&tx, vouch)?;
    emit_wot_notification(
        &tx,
        &stored.vouchee,
        WotCategory::NewVouch,
        &notification_body(&stored),
    )?;
    tx.commit()?;
    Ok(stored)
}

/// Applies a reaction and queues `wot.accepted` / `wot.rejected` for the
/// voucher.
pub fn issue_reaction_tx(
    conn: &mut Connection,
    vouchee: &UserVersion,
    voucher: &UserVersion,
    proof: &SigId,
    reaction: WotReaction,
) -> Result<WotVouch, BackendError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let updated = apply_reaction(&tx, vouchee, voucher, proof, reaction)?;
    emit_wot_notification(
        &tx,
        &updated.voucher,
        reaction_category(reaction),
        &notification_body(&updated),
    )?;
    tx.commit()?;
    Ok(updated)
}

/// [`AttestationIssuer`] and [`AttestationReader`] over the shared pool.
#[derive(Clone)]
pub struct SqliteAttestations {
    pool: DbPool,
}

impl SqliteAttestations {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn list(&self, vouchee: &UserVersion) -> Result<Vec<WotVouch>, ExternalError> {
        let vouchee = vouchee.clone();
        run_blocking(&self.pool, move |conn| {
            list_vouches_for(conn, &vouchee).map_err(BackendError::from)
        })
        .await
        .map_err(ExternalError::new)
    }
}

#[async_trait]
impl AttestationIssuer for SqliteAttestations {
    async fn issue_vouch(
        &self,
        me: &User,
        vouchee: &User,
        request: &VouchRequest,
        failing_proofs: &[WotProof],
    ) -> Result<WotVouch, ExternalError> {
        let vouch = NewVouch {
            voucher: me.uv.clone(),
            voucher_username: me.username.clone(),
            vouchee: vouchee.uv.clone(),
            vouchee_username: vouchee.username.clone(),
            vouch_texts: request.vouch_texts.clone(),
            confidence: request.confidence.clone(),
            failing_proofs: failing_proofs.to_vec(),
        };
        let stored = run_blocking(&self.pool, move |conn| issue_vouch_tx(conn, &vouch))
            .await
            .map_err(ExternalError::new)?;

        tracing::info!(
            voucher = %stored.voucher_username,
            vouchee = %stored.vouchee_username,
            "vouch issued"
        );
        Ok(stored)
    }

    async fn issue_reaction(
        &self,
        me: &User,
        voucher: &UserVersion,
        proof: &SigId,
        reaction: WotReaction,
    ) -> Result<WotVouch, ExternalError> {
        let vouchee = me.uv.clone();
        let voucher = voucher.clone();
        let proof = proof.clone();
        let updated = run_blocking(&self.pool, move |conn| {
            issue_reaction_tx(conn, &vouchee, &voucher, &proof, reaction)
        })
        .await
        .map_err(ExternalError::new)?;

        tracing::info!(
            voucher = %updated.voucher_username,
            vouchee = %updated.vouchee_username,
            status = %updated.status,
            "reaction issued"
        );
        Ok(updated)
    }

    async fn revoke(&self, me: &User, vouchee: &UserVersion) -> Result<WotVouch, ExternalError> {
        let voucher = me.uv.clone();
        let vouchee = vouchee.clone();
        let revoked = run_blocking(&self.pool, move |conn| {
            revoke_vouch(conn, &voucher, &vouchee).map_err(BackendError::from)
        })
        .await
        .map_err(ExternalError::new)?;

        tracing::info!(
            voucher = %revoked.voucher_username,
            vouchee = %revoked.vouchee_username,
            "vouch revoked"
        );
        Ok(revoked)
    }
}

#[async_trait]
impl AttestationReader for SqliteAttestations {
    async fn list_mine(&self, me: &User) -> Result<Vec<WotVouch>, ExternalError> {
        self.list(&me.uv).await
    }

    async fn list_for(&self, user: &User) -> Result<Vec<WotVouch>, ExternalError> {
        self.list(&user.uv).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wot_notify::pending_items;
    use wot_types::{Confidence, NormalizedUsername, Uid, WotStatus};

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().expect("should open in-memory db");
        wot_db::run_migrations(&conn).expect("migrations should succeed");
        conn
    }

    fn uv(name: &str) -> UserVersion {
        UserVersion::new(Uid::derive(&NormalizedUsername::new(name)), 1)
    }

    fn new_vouch() -> NewVouch {
        NewVouch {
            voucher: uv("alice"),
            voucher_username: NormalizedUsername::new("alice"),
            vouchee: uv("bob"),
            vouchee_username: NormalizedUsername::new("bob"),
            vouch_texts: vec!["bob is bob".to_string()],
            confidence: Confidence::default(),
            failing_proofs: Vec::new(),
        }
    }

    #[test]
    fn vouch_notifies_the_vouchee() {
        let mut conn = test_db();
        issue_vouch_tx(&mut conn, &new_vouch()).expect("vouch should succeed");

        let bob_items = pending_items(&conn, &uv("bob"), "wot").unwrap();
        assert_eq!(bob_items.len(), 1);
        assert_eq!(bob_items[0].category, "wot.new_vouch");
        assert_eq!(bob_items[0].body, r#"{"voucher":"alice","vouchee":"bob"}"#);
        assert!(pending_items(&conn, &uv("alice"), "wot").unwrap().is_empty());
    }

    #[test]
    fn reaction_notifies_the_voucher() {
        let mut conn = test_db();
        let stored = issue_vouch_tx(&mut conn, &new_vouch()).unwrap();

        let updated = issue_reaction_tx(
            &mut conn,
            &uv("bob"),
            &uv("alice"),
            &stored.vouch_proof,
            WotReaction::Reject,
        )
        .expect("reaction should succeed");
        assert_eq!(updated.status, WotStatus::Rejected);

        let alice_items = pending_items(&conn, &uv("alice"), "wot").unwrap();
        assert_eq!(alice_items.len(), 1);
        assert_eq!(alice_items[0].category, "wot.rejected");
    }

    #[test]
    fn refused_reaction_queues_nothing() {
        let mut conn = test_db();
        let stored = issue_vouch_tx(&mut conn, &new_vouch()).unwrap();
        issue_reaction_tx(&mut conn, &uv("bob"), &uv("alice"), &stored.vouch_proof, WotReaction::Accept)
            .unwrap();

        let err = issue_reaction_tx(
            &mut conn,
            &uv("bob"),
            &uv("alice"),
            &stored.vouch_proof,
            WotReaction::Accept,
        )
        .expect_err("second accept is a no-op");
        assert_eq!(err.to_string(), "already accepted");

        let alice_items = pending_items(&conn, &uv("alice"), "wot").unwrap();
        assert_eq!(alice_items.len(), 1, "only the first accept queued a notification");
    }

    #[test]
    fn reaction_takes_the_write_lock_before_reading() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("wot.db");

        let mut writer = Connection::open(&path).unwrap();
        wot_db::run_migrations(&writer).unwrap();
        let stored = issue_vouch_tx(&mut writer, &new_vouch()).unwrap();

        let mut reactor = Connection::open(&path).unwrap();
        reactor.busy_timeout(Duration::ZERO).unwrap();

        writer.execute_batch("BEGIN IMMEDIATE").unwrap();
        let err = issue_reaction_tx(
            &mut reactor,
            &uv("bob"),
            &uv("alice"),
            &stored.vouch_proof,
            WotReaction::Accept,
        )
        .expect_err("another writer holds the lock");
        match err {
            BackendError::Database(rusqlite::Error::SqliteFailure(e, _)) => {
                assert_eq!(e.code, rusqlite::ErrorCode::DatabaseBusy);
            }
            other => panic!("expected busy at transaction start, got {other:?}"),
        }
        writer.execute_batch("COMMIT").unwrap();

        let updated = issue_reaction_tx(
            &mut reactor,
            &uv("bob"),
            &uv("alice"),
            &stored.vouch_proof,
            WotReaction::Accept,
        )
        .expect("lock released");
        assert_eq!(updated.status, WotStatus::Accepted);
        assert_eq!(pending_items(&reactor, &uv("alice"), "wot").unwrap().len(), 1);
    }
}

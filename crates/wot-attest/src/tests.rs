//! Store tests against an in-memory database.

use rusqlite::{params, Connection};
use wot_types::{
    Confidence, NormalizedUsername, SigId, Uid, UserVersion, UsernameVerificationType, WotProof,
    WotReaction, WotStatus,
};

use crate::error::{AttestStoreError, ReactionError};
use crate::store::{
    apply_reaction, get_vouch, insert_vouch, list_vouches_for, revoke_vouch,
    NewVouch,
};

/// Creates an in-memory SQLite database with migrations applied.
fn test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("should open in-memory db");
    wot_db::run_migrations(&conn).expect("migrations should succeed");
    conn
}

fn user(name: &str) -> (UserVersion, NormalizedUsername) {
    let name = NormalizedUsername::new(name);
    (UserVersion::new(Uid::derive(&name), 1), name)
}

fn new_vouch(voucher: &str, vouchee: &str, text: &str) -> NewVouch {
    let (voucher, voucher_username) = user(voucher);
    let (vouchee, vouchee_username) = user(vouchee);
    NewVouch {
        voucher,
        voucher_username,
        vouchee,
        vouchee_username,
        vouch_texts: vec![text.to_string()],
        confidence: Confidence {
            username_verified_via: Some(UsernameVerificationType::Video),
            proofs: Vec::new(),
            other: None,
        },
        failing_proofs: Vec::new(),
    }
}

// ── insert / list ────────────────────────────────────────────────────

#[test]
fn insert_vouch_starts_proposed_and_round_trips() {
    let conn = test_db();
    let mut vouch = new_vouch("alice", "bob", "bob is bob");
    vouch.failing_proofs = vec![WotProof {
        proof_type: "dns".to_string(),
        name: "bob.example".to_string(),
        username: "bob".to_string(),
    }];

    let stored = insert_vouch(&conn, &vouch).expect("insert should succeed");
    assert_eq!(stored.status, WotStatus::Proposed);

    let fetched = get_vouch(&conn, &vouch.voucher, &vouch.vouchee)
        .expect("get should succeed")
        .expect("vouch should exist");
    assert_eq!(fetched, stored);
    assert_eq!(fetched.failing_proofs.len(), 1);
    assert_eq!(
        fetched.confidence.username_verified_via,
        Some(UsernameVerificationType::Video)
    );
}

#[test]
fn revouch_supersedes_instead_of_duplicating() {
    let conn = test_db();
    let first = insert_vouch(&conn, &new_vouch("alice", "bob", "first")).unwrap();
    apply_reaction(
        &conn,
        &first.vouchee,
        &first.voucher,
        &first.vouch_proof,
        WotReaction::Reject,
    )
    .unwrap();

    let second = insert_vouch(&conn, &new_vouch("alice", "bob", "second")).unwrap();
    assert_ne!(first.vouch_proof, second.vouch_proof);

    let received = list_vouches_for(&conn, &second.vouchee).unwrap();
    assert_eq!(received.len(), 1, "one record per pair");
    assert_eq!(received[0].vouch_texts, vec!["second".to_string()]);
    assert_eq!(received[0].status, WotStatus::Proposed, "supersede resets status");
    assert_eq!(received[0].vouch_proof, second.vouch_proof);
}

#[test]
fn lists_are_scoped_and_ordered() {
    let conn = test_db();
    insert_vouch(&conn, &new_vouch("alice", "bob", "a")).unwrap();
    insert_vouch(&conn, &new_vouch("carol", "bob", "c")).unwrap();
    insert_vouch(&conn, &new_vouch("alice", "dave", "d")).unwrap();

    let (bob, _) = user("bob");
    let for_bob = list_vouches_for(&conn, &bob).unwrap();
    let vouchers: Vec<&str> = for_bob.iter().map(|v| v.voucher_username.as_str()).collect();
    assert_eq!(vouchers, vec!["alice", "carol"]);

    let (nobody, _) = user("nobody");
    assert!(list_vouches_for(&conn, &nobody).unwrap().is_empty());
}

#[test]
fn reset_account_is_a_different_vouchee() {
    let conn = test_db();
    let stored = insert_vouch(&conn, &new_vouch("alice", "bob", "pre-reset")).unwrap();
    let reset_bob = UserVersion::new(stored.vouchee.uid.clone(), 2);

    assert!(list_vouches_for(&conn, &reset_bob).unwrap().is_empty());
}

// ── reactions ────────────────────────────────────────────────────────

#[test]
fn reject_then_accept_is_refused() {
    let conn = test_db();
    let vouch = insert_vouch(&conn, &new_vouch("alice", "bob", "ok")).unwrap();

    let rejected = apply_reaction(
        &conn,
        &vouch.vouchee,
        &vouch.voucher,
        &vouch.vouch_proof,
        WotReaction::Reject,
    )
    .unwrap();
    assert_eq!(rejected.status, WotStatus::Rejected);

    let err = apply_reaction(
        &conn,
        &vouch.vouchee,
        &vouch.voucher,
        &vouch.vouch_proof,
        WotReaction::Accept,
    )
    .expect_err("accepting a rejected vouch should fail");
    assert!(matches!(
        err,
        AttestStoreError::Reaction(ReactionError::IllegalTransition(WotStatus::Rejected))
    ));

    let stored = get_vouch(&conn, &vouch.voucher, &vouch.vouchee).unwrap().unwrap();
    assert_eq!(stored.status, WotStatus::Rejected, "refused reaction must not write");
}

#[test]
fn reaction_with_superseded_proof_is_stale() {
    let conn = test_db();
    let old = insert_vouch(&conn, &new_vouch("alice", "bob", "old")).unwrap();
    insert_vouch(&conn, &new_vouch("alice", "bob", "new")).unwrap();

    let err = apply_reaction(
        &conn,
        &old.vouchee,
        &old.voucher,
        &old.vouch_proof,
        WotReaction::Accept,
    )
    .expect_err("old proof should be stale");
    assert!(matches!(err, AttestStoreError::StaleProof(ref id) if id == &old.vouch_proof));
}

#[test]
fn reaction_without_vouch_is_not_found() {
    let conn = test_db();
    let (alice, _) = user("alice");
    let (bob, _) = user("bob");

    let err = apply_reaction(
        &conn,
        &bob,
        &alice,
        &SigId::for_statement(b"nothing"),
        WotReaction::Accept,
    )
    .expect_err("there is nothing to react to");
    assert!(matches!(err, AttestStoreError::NotFound { .. }));
}

#[test]
fn stored_none_status_is_reported_as_corrupt() {
    let conn = test_db();
    let vouch = insert_vouch(&conn, &new_vouch("alice", "bob", "ok")).unwrap();
    conn.execute(
        "UPDATE vouches SET status = 0 WHERE sig_id = ?1",
        params![vouch.vouch_proof.as_str()],
    )
    .unwrap();

    let err = apply_reaction(
        &conn,
        &vouch.vouchee,
        &vouch.voucher,
        &vouch.vouch_proof,
        WotReaction::Accept,
    )
    .expect_err("NONE status is corrupt");
    assert!(matches!(err, AttestStoreError::Reaction(ReactionError::InvalidState)));
}

#[test]
fn unrecognised_status_code_survives_a_read() {
    let conn = test_db();
    let vouch = insert_vouch(&conn, &new_vouch("alice", "bob", "ok")).unwrap();
    conn.execute(
        "UPDATE vouches SET status = 12 WHERE sig_id = ?1",
        params![vouch.vouch_proof.as_str()],
    )
    .unwrap();

    let stored = get_vouch(&conn, &vouch.voucher, &vouch.vouchee).unwrap().unwrap();
    assert_eq!(stored.status, WotStatus::Unknown(12));
}

#[test]
fn malformed_uid_column_is_a_corrupt_row() {
    let conn = test_db();
    let vouch = insert_vouch(&conn, &new_vouch("alice", "bob", "ok")).unwrap();
    conn.execute(
        "UPDATE vouches SET voucher_uid = 'not-a-uid' WHERE sig_id = ?1",
        params![vouch.vouch_proof.as_str()],
    )
    .unwrap();

    let err = list_vouches_for(&conn, &vouch.vouchee).expect_err("row should not parse");
    assert!(matches!(err, AttestStoreError::CorruptRow { .. }), "got {err:?}");
}

// ── revocation ───────────────────────────────────────────────────────

#[test]
fn revoke_then_react_is_refused() {
    let conn = test_db();
    let vouch = insert_vouch(&conn, &new_vouch("alice", "bob", "ok")).unwrap();

    let revoked = revoke_vouch(&conn, &vouch.voucher, &vouch.vouchee).unwrap();
    assert_eq!(revoked.status, WotStatus::Revoked);

    let err = revoke_vouch(&conn, &vouch.voucher, &vouch.vouchee)
        .expect_err("second revoke is a no-op");
    assert!(matches!(
        err,
        AttestStoreError::Reaction(ReactionError::NoOp(WotStatus::Revoked))
    ));

    let err = apply_reaction(
        &conn,
        &vouch.vouchee,
        &vouch.voucher,
        &vouch.vouch_proof,
        WotReaction::Reject,
    )
    .expect_err("reacting to a revoked vouch is illegal");
    assert!(matches!(
        err,
        AttestStoreError::Reaction(ReactionError::IllegalTransition(WotStatus::Revoked))
    ));
}

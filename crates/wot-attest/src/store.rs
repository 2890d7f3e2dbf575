//! Persistence operations for vouch records.
//!
//! Every function takes a plain `&Connection` and issues its statements
//! directly. Callers that need to combine a vouch write with other writes
//! (for example queueing a notification) pass a `Transaction`, which derefs
//! to `Connection`, and commit once at the end.

use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use wot_types::{
    Confidence, NormalizedUsername, SigId, Uid, UserVersion, WotProof, WotReaction, WotStatus,
    WotVouch,
};

use crate::error::AttestStoreError;
use crate::transition::{check_reaction, check_revoke};

const VOUCH_COLUMNS: &str = "id, sig_id, voucher_uid, voucher_eldest_seqno, voucher_username,
     vouchee_uid, vouchee_eldest_seqno, vouchee_username, texts_json, confidence_json,
     failing_proofs_json, status, vouched_at";

/// A vouch about to be issued.
#[derive(Debug, Clone)]
pub struct NewVouch {
    pub voucher: UserVersion,
    pub voucher_username: NormalizedUsername,
    pub vouchee: UserVersion,
    pub vouchee_username: NormalizedUsername,
    pub vouch_texts: Vec<String>,
    pub confidence: Confidence,
    pub failing_proofs: Vec<WotProof>,
}

/// The signed body of a vouch. Its hash is the vouch's [`SigId`].
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VouchStatement<'a> {
    voucher: &'a UserVersion,
    vouchee: &'a UserVersion,
    vouch_texts: &'a [String],
    confidence: &'a Confidence,
    failing_proofs: &'a [WotProof],
    ctime_nanos: u128,
}

/// Raw column values, before identifiers and JSON are parsed.
struct VouchRow {
    id: i64,
    sig_id: String,
    voucher_uid: String,
    voucher_eldest_seqno: i64,
    voucher_username: String,
    vouchee_uid: String,
    vouchee_eldest_seqno: i64,
    vouchee_username: String,
    texts_json: String,
    confidence_json: String,
    failing_proofs_json: String,
    status: i64,
    vouched_at: String,
}

impl VouchRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            sig_id: row.get(1)?,
            voucher_uid: row.get(2)?,
            voucher_eldest_seqno: row.get(3)?,
            voucher_username: row.get(4)?,
            vouchee_uid: row.get(5)?,
            vouchee_eldest_seqno: row.get(6)?,
            vouchee_username: row.get(7)?,
            texts_json: row.get(8)?,
            confidence_json: row.get(9)?,
            failing_proofs_json: row.get(10)?,
            status: row.get(11)?,
            vouched_at: row.get(12)?,
        })
    }

    fn into_vouch(self) -> Result<WotVouch, AttestStoreError> {
        let id = self.id;
        let corrupt = |reason: String| AttestStoreError::CorruptRow { id, reason };

        let vouch_proof =
            SigId::new(&self.sig_id).map_err(|e| corrupt(format!("sig_id: {e}")))?;
        let voucher_uid =
            Uid::new(&self.voucher_uid).map_err(|e| corrupt(format!("voucher_uid: {e}")))?;
        let vouchee_uid =
            Uid::new(&self.vouchee_uid).map_err(|e| corrupt(format!("vouchee_uid: {e}")))?;

        Ok(WotVouch {
            vouch_proof,
            voucher: UserVersion::new(voucher_uid, self.voucher_eldest_seqno),
            voucher_username: NormalizedUsername::new(&self.voucher_username),
            vouchee: UserVersion::new(vouchee_uid, self.vouchee_eldest_seqno),
            vouchee_username: NormalizedUsername::new(&self.vouchee_username),
            vouch_texts: serde_json::from_str(&self.texts_json)?,
            confidence: serde_json::from_str(&self.confidence_json)?,
            failing_proofs: serde_json::from_str(&self.failing_proofs_json)?,
            status: WotStatus::from_code(self.status),
            vouched_at: self.vouched_at,
        })
    }
}

fn ctime_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
}

/// Issues a vouch, superseding any earlier vouch for the same pair.
///
/// The new statement gets a fresh [`SigId`] and the record returns to
/// `PROPOSED`, whatever the previous record's status was.
///
/// # Errors
///
/// Returns `AttestStoreError::Database` on SQL failure or
/// `AttestStoreError::Serialization` if the JSON columns cannot be encoded.
pub fn insert_vouch(conn: &Connection, vouch: &NewVouch) -> Result<WotVouch, AttestStoreError> {
    let statement = VouchStatement {
        voucher: &vouch.voucher,
        vouchee: &vouch.vouchee,
        vouch_texts: &vouch.vouch_texts,
        confidence: &vouch.confidence,
        failing_proofs: &vouch.failing_proofs,
        ctime_nanos: ctime_nanos(),
    };
    let sig_id = SigId::for_statement(&serde_json::to_vec(&statement)?);
    let texts_json = serde_json::to_string(&vouch.vouch_texts)?;
    let confidence_json = serde_json::to_string(&vouch.confidence)?;
    let failing_proofs_json = serde_json::to_string(&vouch.failing_proofs)?;
    let status = WotStatus::Proposed;

    let vouched_at: String = conn.query_row(
        "INSERT INTO vouches
            (voucher_uid, voucher_eldest_seqno, voucher_username,
             vouchee_uid, vouchee_eldest_seqno, vouchee_username,
             sig_id, texts_json, confidence_json, failing_proofs_json, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT (voucher_uid, voucher_eldest_seqno, vouchee_uid, vouchee_eldest_seqno)
         DO UPDATE SET
            voucher_username = excluded.voucher_username,
            vouchee_username = excluded.vouchee_username,
            sig_id = excluded.sig_id,
            texts_json = excluded.texts_json,
            confidence_json = excluded.confidence_json,
            failing_proofs_json = excluded.failing_proofs_json,
            status = excluded.status,
            vouched_at = datetime('now'),
            updated_at = datetime('now')
         RETURNING vouched_at",
        params![
            vouch.voucher.uid.as_str(),
            vouch.voucher.eldest_seqno,
            vouch.voucher_username.as_str(),
            vouch.vouchee.uid.as_str(),
            vouch.vouchee.eldest_seqno,
            vouch.vouchee_username.as_str(),
            sig_id.as_str(),
            texts_json,
            confidence_json,
            failing_proofs_json,
            status.code(),
        ],
        |row| row.get(0),
    )?;

    tracing::debug!(
        voucher = %vouch.voucher,
        vouchee = %vouch.vouchee,
        sig_id = %sig_id,
        failing_proofs = vouch.failing_proofs.len(),
        "vouch stored"
    );

    Ok(WotVouch {
        vouch_proof: sig_id,
        voucher: vouch.voucher.clone(),
        voucher_username: vouch.voucher_username.clone(),
        vouchee: vouch.vouchee.clone(),
        vouchee_username: vouch.vouchee_username.clone(),
        vouch_texts: vouch.vouch_texts.clone(),
        confidence: vouch.confidence.clone(),
        failing_proofs: vouch.failing_proofs.clone(),
        status,
        vouched_at,
    })
}

fn query_vouches(
    conn: &Connection,
    sql: &str,
    user: &UserVersion,
) -> Result<Vec<WotVouch>, AttestStoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![user.uid.as_str(), user.eldest_seqno], VouchRow::from_row)?;

    let mut vouches = Vec::new();
    for row in rows {
        vouches.push(row?.into_vouch()?);
    }
    Ok(vouches)
}

/// Lists every vouch received by `vouchee`, oldest first.
///
/// # Errors
///
/// Returns `AttestStoreError::Database` on SQL failure or
/// `AttestStoreError::CorruptRow` / `Serialization` if a row cannot be parsed.
pub fn list_vouches_for(
    conn: &Connection,
    vouchee: &UserVersion,
) -> Result<Vec<WotVouch>, AttestStoreError> {
    let sql = format!(
        "SELECT {VOUCH_COLUMNS} FROM vouches
         WHERE vouchee_uid = ?1 AND vouchee_eldest_seqno = ?2
         ORDER BY id ASC"
    );
    query_vouches(conn, &sql, vouchee)
}

/// Fetches the vouch for a (voucher, vouchee) pair, if one exists.
pub fn get_vouch(
    conn: &Connection,
    voucher: &UserVersion,
    vouchee: &UserVersion,
) -> Result<Option<WotVouch>, AttestStoreError> {
    let sql = format!(
        "SELECT {VOUCH_COLUMNS} FROM vouches
         WHERE voucher_uid = ?1 AND voucher_eldest_seqno = ?2
           AND vouchee_uid = ?3 AND vouchee_eldest_seqno = ?4"
    );
    let row = conn
        .query_row(
            &sql,
            params![
                voucher.uid.as_str(),
                voucher.eldest_seqno,
                vouchee.uid.as_str(),
                vouchee.eldest_seqno,
            ],
            VouchRow::from_row,
        )
        .optional()?;

    row.map(VouchRow::into_vouch).transpose()
}

fn require_vouch(
    conn: &Connection,
    voucher: &UserVersion,
    vouchee: &UserVersion,
) -> Result<WotVouch, AttestStoreError> {
    get_vouch(conn, voucher, vouchee)?.ok_or_else(|| AttestStoreError::NotFound {
        voucher: voucher.clone(),
        vouchee: vouchee.clone(),
    })
}

fn set_status(conn: &Connection, sig_id: &SigId, status: WotStatus) -> Result<(), AttestStoreError> {
    conn.execute(
        "UPDATE vouches SET status = ?1, updated_at = datetime('now') WHERE sig_id = ?2",
        params![status.code(), sig_id.as_str()],
    )?;
    Ok(())
}

/// Applies the vouchee's reaction to the vouch identified by `proof`.
///
/// # Errors
///
/// - `AttestStoreError::NotFound` if `voucher` never vouched for `vouchee`
/// - `AttestStoreError::StaleProof` if `proof` is not the current statement
/// - `AttestStoreError::Reaction` if the transition rules refuse the reaction
pub fn apply_reaction(
    conn: &Connection,
    vouchee: &UserVersion,
    voucher: &UserVersion,
    proof: &SigId,
    reaction: WotReaction,
) -> Result<WotVouch, AttestStoreError> {
    let mut vouch = require_vouch(conn, voucher, vouchee)?;
    if &vouch.vouch_proof != proof {
        return Err(AttestStoreError::StaleProof(proof.clone()));
    }

    let next = check_reaction(vouch.status, reaction)?;
    set_status(conn, &vouch.vouch_proof, next)?;

    tracing::debug!(
        %voucher,
        %vouchee,
        from = %vouch.status,
        to = %next,
        "reaction applied"
    );

    vouch.status = next;
    Ok(vouch)
}

/// Revokes the vouch `voucher` issued for `vouchee`.
///
/// # Errors
///
/// - `AttestStoreError::NotFound` if there is no such vouch
/// - `AttestStoreError::Reaction` if the vouch is already revoked or corrupt
pub fn revoke_vouch(
    conn: &Connection,
    voucher: &UserVersion,
    vouchee: &UserVersion,
) -> Result<WotVouch, AttestStoreError> {
    let mut vouch = require_vouch(conn, voucher, vouchee)?;
    let next = check_revoke(vouch.status)?;
    set_status(conn, &vouch.vouch_proof, next)?;

    tracing::debug!(%voucher, %vouchee, from = %vouch.status, "vouch revoked");

    vouch.status = next;
    Ok(vouch)
}

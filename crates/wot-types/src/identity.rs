//! Account and statement identifiers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Number of hex characters in a [`Uid`].
const UID_HEX_LEN: usize = 32;

/// Number of hex characters in a [`SigId`].
const SIG_ID_HEX_LEN: usize = 64;

/// Errors produced when parsing identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseIdError {
    /// The identifier had the wrong number of characters.
    #[error("expected {expected} hex characters, got {actual}")]
    Length {
        /// Required length.
        expected: usize,
        /// Length of the rejected input.
        actual: usize,
    },
    /// The identifier contained a non-hex character.
    #[error("identifier contains non-hex characters")]
    NotHex,
}

fn parse_hex(value: &str, expected: usize) -> Result<String, ParseIdError> {
    if value.len() != expected {
        return Err(ParseIdError::Length {
            expected,
            actual: value.len(),
        });
    }
    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ParseIdError::NotHex);
    }
    Ok(value.to_ascii_lowercase())
}

fn sha256_hex(input: &[u8]) -> String {
    format!("{:x}", Sha256::digest(input))
}

/// A stable account identifier (16 bytes, lowercase hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uid(String);

impl Uid {
    /// Parses a uid from its hex form. Upper-case input is normalised.
    pub fn new(value: &str) -> Result<Self, ParseIdError> {
        parse_hex(value, UID_HEX_LEN).map(Self)
    }

    /// Derives the uid assigned to a newly registered username.
    ///
    /// Formula: `uid = sha256("wot:uid:" + username)[..16 bytes]`
    pub fn derive(username: &NormalizedUsername) -> Self {
        let digest = sha256_hex(format!("wot:uid:{}", username.as_str()).as_bytes());
        Self(digest[..UID_HEX_LEN].to_string())
    }

    /// Returns the hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Uid {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Uid> for String {
    fn from(value: Uid) -> Self {
        value.0
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A specific incarnation of an account.
///
/// The eldest sequence number changes when an account is reset, so two
/// `UserVersion`s with the same uid but different seqnos are different
/// identities for attestation purposes. Renames do not change it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVersion {
    /// The account uid.
    pub uid: Uid,
    /// Sequence number of the eldest link of the account's current sigchain.
    pub eldest_seqno: i64,
}

impl UserVersion {
    pub fn new(uid: Uid, eldest_seqno: i64) -> Self {
        Self { uid, eldest_seqno }
    }
}

impl std::fmt::Display for UserVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%{}", self.uid, self.eldest_seqno)
    }
}

/// An account as seen by the service: its current incarnation and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uv: UserVersion,
    pub username: NormalizedUsername,
}

impl User {
    pub fn new(uv: UserVersion, username: NormalizedUsername) -> Self {
        Self { uv, username }
    }
}

/// A username in canonical form: surrounding whitespace removed, ASCII lowercase.
///
/// All username comparisons in the workspace go through this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NormalizedUsername(String);

impl NormalizedUsername {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for NormalizedUsername {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NormalizedUsername {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<NormalizedUsername> for String {
    fn from(value: NormalizedUsername) -> Self {
        value.0
    }
}

impl std::fmt::Display for NormalizedUsername {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a signed statement (32 bytes, lowercase hex).
///
/// A vouch is backed by one such statement; reactions reference it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SigId(String);

impl SigId {
    /// Parses a statement id from its hex form.
    pub fn new(value: &str) -> Result<Self, ParseIdError> {
        parse_hex(value, SIG_ID_HEX_LEN).map(Self)
    }

    /// Computes the id of a serialised statement: `sha256(statement)`.
    pub fn for_statement(statement: &[u8]) -> Self {
        Self(sha256_hex(statement))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SigId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<SigId> for String {
    fn from(value: SigId) -> Self {
        value.0
    }
}

impl std::fmt::Display for SigId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

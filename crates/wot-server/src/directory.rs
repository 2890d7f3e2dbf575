//! Local user directory backing the identity resolver.
//!
//! Registration assigns a uid derived from the normalised username and an
//! eldest seqno of 1. The directory is the only source of [`User`] values
//! in the server: the auth middleware and every name lookup go through it.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use wot_db::{run_blocking, DbPool, DbTaskError};
use wot_service::IdentityResolver;
use wot_types::{ExternalError, NormalizedUsername, ParseIdError, Uid, User, UserVersion};

const MAX_USERNAME_LEN: usize = 32;

/// Errors from the user directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No user is registered under the name.
    #[error("user not found: {0}")]
    NotFound(String),

    /// The name is already registered.
    #[error("username already taken: {0}")]
    Taken(String),

    /// The name is empty, too long or contains characters outside `[a-z0-9_]`.
    #[error("invalid username: {0:?}")]
    InvalidUsername(String),

    /// A stored uid failed to parse.
    #[error("corrupt user row for {username}: {source}")]
    CorruptRow {
        username: String,
        #[source]
        source: ParseIdError,
    },

    /// A database operation failed.
    #[error("directory database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The query could not be scheduled on the blocking pool.
    #[error(transparent)]
    Task(#[from] DbTaskError),
}

fn validate_username(raw: &str) -> Result<NormalizedUsername, DirectoryError> {
    let name = NormalizedUsername::new(raw);
    let valid = !name.is_empty()
        && name.as_str().len() <= MAX_USERNAME_LEN
        && name
            .as_str()
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(DirectoryError::InvalidUsername(raw.to_string()))
    }
}

/// Registers `username` and returns the new user.
///
/// # Errors
///
/// - `DirectoryError::InvalidUsername` if the name fails validation
/// - `DirectoryError::Taken` if the name is already registered
pub fn register_user(conn: &Connection, username: &str) -> Result<User, DirectoryError> {
    let username = validate_username(username)?;
    let uid = Uid::derive(&username);

    let inserted = conn.execute(
        "INSERT INTO users (uid, username) VALUES (?1, ?2) ON CONFLICT DO NOTHING",
        params![uid.as_str(), username.as_str()],
    )?;
    if inserted == 0 {
        return Err(DirectoryError::Taken(username.to_string()));
    }

    let user = User::new(UserVersion::new(uid, 1), username);
    tracing::info!(username = %user.username, uv = %user.uv, "user registered");
    Ok(user)
}

/// Looks a user up by name. Names are normalised before the lookup.
pub fn find_user(conn: &Connection, username: &str) -> Result<Option<User>, DirectoryError> {
    let username = NormalizedUsername::new(username);
    let row: Option<(String, i64)> = conn
        .query_row(
            "SELECT uid, eldest_seqno FROM users WHERE username = ?1",
            params![username.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((uid, eldest_seqno)) = row else {
        return Ok(None);
    };
    let uid = Uid::new(&uid).map_err(|source| DirectoryError::CorruptRow {
        username: username.to_string(),
        source,
    })?;
    Ok(Some(User::new(UserVersion::new(uid, eldest_seqno), username)))
}

/// [`IdentityResolver`] over the `users` table.
#[derive(Clone)]
pub struct SqliteDirectory {
    pool: DbPool,
}

impl SqliteDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Registers a user through the pool.
    pub async fn register(&self, username: &str) -> Result<User, DirectoryError> {
        let username = username.to_string();
        run_blocking(&self.pool, move |conn| register_user(conn, &username)).await
    }

    /// Resolves `name` to a registered user.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::NotFound` for unknown names.
    pub async fn lookup(&self, name: &str) -> Result<User, DirectoryError> {
        let name = name.to_string();
        run_blocking(&self.pool, move |conn| {
            find_user(conn, &name)?.ok_or_else(|| DirectoryError::NotFound(name.trim().to_string()))
        })
        .await
    }
}

#[async_trait]
impl IdentityResolver for SqliteDirectory {
    async fn resolve(&self, name: &str) -> Result<User, ExternalError> {
        self.lookup(name).await.map_err(ExternalError::new)
    }
}

//! Embedded SQL migration runner.
//!
//! Migrations are SQL files embedded at compile time. They run sequentially
//! on startup, tracked by the `_wot_migrations` table. Each migration runs
//! exactly once; an already applied migration is skipped.

use rusqlite::Connection;
use thiserror::Error;

/// A single embedded migration.
struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. New migrations are appended here.
const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "001_users",
        sql: include_str!("migrations/001_users.sql"),
    },
    Migration {
        name: "002_vouches",
        sql: include_str!("migrations/002_vouches.sql"),
    },
    Migration {
        name: "003_notification_items",
        sql: include_str!("migrations/003_notification_items.sql"),
    },
];

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A SQL statement within a migration failed.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        /// The name of the migration that failed.
        name: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to query migration state.
    #[error("failed to check migration state: {0}")]
    StateQuery(rusqlite::Error),
}

impl MigrationError {
    fn execution(name: &str, source: rusqlite::Error) -> Self {
        Self::ExecutionFailed {
            name: name.to_string(),
            source,
        }
    }
}

/// Runs all pending migrations against the given connection.
///
/// Returns the number of migrations applied by this call.
///
/// # Errors
///
/// Returns `MigrationError` if any migration fails to execute or if the
/// migration tracking table cannot be queried.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    run_migrations_from_list(conn, MIGRATIONS)
}

fn run_migrations_from_list(
    conn: &Connection,
    migrations: &[Migration],
) -> Result<usize, MigrationError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _wot_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| MigrationError::execution("_wot_migrations_bootstrap", e))?;

    let mut applied = 0;

    for migration in migrations {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _wot_migrations WHERE name = ?1",
                [migration.name],
                |row| row.get(0),
            )
            .map_err(MigrationError::StateQuery)?;

        if already_applied {
            tracing::debug!(
                migration = migration.name,
                "migration already applied, skipping"
            );
            continue;
        }

        tracing::info!(migration = migration.name, "applying migration");

        // Schema changes and the tracking row commit together.
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| MigrationError::execution(migration.name, e))?;
        tx.execute_batch(migration.sql)
            .map_err(|e| MigrationError::execution(migration.name, e))?;
        tx.execute(
            "INSERT INTO _wot_migrations (name) VALUES (?1)",
            [migration.name],
        )
        .map_err(|e| MigrationError::execution(migration.name, e))?;
        tx.commit()
            .map_err(|e| MigrationError::execution(migration.name, e))?;

        applied += 1;
    }

    Ok(applied)
}

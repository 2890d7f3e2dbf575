//! Database layer for the web-of-trust service.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! embedded SQL migrations, and a helper for running pooled queries off the
//! async runtime. Every table the reference adapters use (`users`,
//! `vouches`, `notification_items`) is created through versioned migrations
//! managed by this crate.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, run_blocking, DbPool, DbRuntimeSettings, DbTaskError, PoolError};

//! `SQLite` backend for the queue and preference store.
//!
//! - **[`connection`]**: `r2d2` pool with WAL mode and performance pragmas
//!   applied to every connection.
//! - **[`migrations`]**: version-tracked schema, embedded at compile time.
//! - **[`row_types`]**: row structs for `rusqlite` mapping.
//! - **[`repositories`]**: stateless repositories; every method takes
//!   `&Connection`.

pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod row_types;

use crate::errors::Result;
use connection::{ConnectionConfig, ConnectionPool};

/// Open (or create) a database file and bring its schema up to date.
pub fn open_file(path: &str, config: &ConnectionConfig) -> Result<ConnectionPool> {
    let pool = connection::new_file(path, config)?;
    migrate(&pool)?;
    Ok(pool)
}

/// Open a private in-memory database with the schema applied.
pub fn open_in_memory(config: &ConnectionConfig) -> Result<ConnectionPool> {
    let pool = connection::new_in_memory(config)?;
    migrate(&pool)?;
    Ok(pool)
}

fn migrate(pool: &ConnectionPool) -> Result<()> {
    let conn = pool.get()?;
    let _ = migrations::run_migrations(&conn)?;
    Ok(())
}

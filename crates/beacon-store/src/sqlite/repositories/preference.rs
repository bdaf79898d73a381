//! Preference repository: string values in the `preferences` table.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;

/// Preference repository. Stateless; every method takes `&Connection`.
pub struct PreferenceRepo;

impl PreferenceRepo {
    /// Read a value.
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        Ok(conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Insert or replace a value.
    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO preferences (key, value, updated_at)
             VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a value. Returns whether it existed.
    pub fn delete(conn: &Connection, key: &str) -> Result<bool> {
        let changed = conn.execute("DELETE FROM preferences WHERE key = ?1", params![key])?;
        Ok(changed > 0)
    }
}

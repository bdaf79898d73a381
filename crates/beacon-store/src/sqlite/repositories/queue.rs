//! Queue repository: raw operations on the `event_queue` table.

use rusqlite::{Connection, params};

use crate::errors::Result;
use crate::sqlite::row_types::QueueEntry;

/// Queue repository. Stateless; every method takes `&Connection`.
pub struct QueueRepo;

impl QueueRepo {
    /// Insert a payload, returning its assigned id.
    pub fn insert(conn: &Connection, payload: &str) -> Result<i64> {
        let size = i64::try_from(payload.len()).unwrap_or(i64::MAX);
        let _ = conn.execute(
            "INSERT INTO event_queue (payload, size_bytes) VALUES (?1, ?2)",
            params![payload, size],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// `(total_count, total_size_bytes)` from the running totals.
    pub fn totals(conn: &Connection) -> Result<(i64, i64)> {
        Ok(conn.query_row(
            "SELECT total_count, total_size FROM queue_stats WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
    }

    /// `(id, size_bytes)` of the `limit` oldest entries.
    pub fn oldest(conn: &Connection, limit: usize) -> Result<Vec<(i64, i64)>> {
        let mut stmt =
            conn.prepare_cached("SELECT id, size_bytes FROM event_queue ORDER BY id ASC LIMIT ?1")?;
        let rows = stmt
            .query_map(params![limit_param(limit)], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Entries with `id > after_id`, ascending, at most `limit`.
    pub fn page_after(conn: &Connection, after_id: i64, limit: usize) -> Result<Vec<QueueEntry>> {
        let mut stmt = conn.prepare_cached(
            "SELECT id, payload, size_bytes FROM event_queue WHERE id > ?1 ORDER BY id ASC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![after_id, limit_param(limit)], QueueEntry::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Delete one entry. Returns rows deleted (0 or 1).
    pub fn delete(conn: &Connection, id: i64) -> Result<usize> {
        Ok(conn.execute("DELETE FROM event_queue WHERE id = ?1", params![id])?)
    }

    /// Delete every entry with `id <= last_id`.
    pub fn delete_up_to(conn: &Connection, last_id: i64) -> Result<usize> {
        Ok(conn.execute("DELETE FROM event_queue WHERE id <= ?1", params![last_id])?)
    }
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        let _ = run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let conn = setup();
        let a = QueueRepo::insert(&conn, "a").unwrap();
        let b = QueueRepo::insert(&conn, "bb").unwrap();
        assert!(b > a);
        assert_eq!(QueueRepo::totals(&conn).unwrap(), (2, 3));
    }

    #[test]
    fn ids_not_reused_after_delete() {
        let conn = setup();
        let a = QueueRepo::insert(&conn, "a").unwrap();
        let _ = QueueRepo::delete(&conn, a).unwrap();
        let b = QueueRepo::insert(&conn, "b").unwrap();
        assert!(b > a);
    }

    #[test]
    fn size_is_byte_length() {
        let conn = setup();
        let _ = QueueRepo::insert(&conn, "é").unwrap();
        assert_eq!(QueueRepo::totals(&conn).unwrap(), (1, 2));
    }

    #[test]
    fn oldest_returns_lowest_ids() {
        let conn = setup();
        let ids: Vec<i64> = (0..8)
            .map(|i| QueueRepo::insert(&conn, &format!("e{i}")).unwrap())
            .collect();
        let oldest: Vec<i64> = QueueRepo::oldest(&conn, 5)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(oldest, ids[..5]);
    }

    #[test]
    fn page_after_skips_seen_ids() {
        let conn = setup();
        let ids: Vec<i64> = (0..5)
            .map(|i| QueueRepo::insert(&conn, &format!("e{i}")).unwrap())
            .collect();
        let page = QueueRepo::page_after(&conn, ids[1], 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, ids[2]);
        assert_eq!(page[1].payload, "e3");
    }

    #[test]
    fn delete_up_to_is_inclusive() {
        let conn = setup();
        let ids: Vec<i64> = (0..4)
            .map(|i| QueueRepo::insert(&conn, &format!("e{i}")).unwrap())
            .collect();
        assert_eq!(QueueRepo::delete_up_to(&conn, ids[2]).unwrap(), 3);
        let left = QueueRepo::page_after(&conn, 0, 10).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, ids[3]);
        assert_eq!(QueueRepo::totals(&conn).unwrap(), (1, 2));
    }
}

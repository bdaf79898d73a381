//! Durable FIFO event queue with a total-size cap.
//!
//! Appends and deletes are serialized through one write lock, and each
//! append commits together with its eviction in a single transaction, so
//! readers never observe the queue over its cap.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::sqlite::connection::{ConnectionPool, PooledConnection};
use crate::sqlite::repositories::QueueRepo;
use crate::sqlite::row_types::QueueEntry;

/// Default cap on the summed payload size: 50 MiB.
pub const DEFAULT_MAX_TOTAL_BYTES: i64 = 50 * 1024 * 1024;
/// Default number of oldest rows fetched per eviction step.
pub const DEFAULT_EVICTION_CHUNK: usize = 5;

/// Queue limits.
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Maximum summed `size_bytes` across all entries.
    pub max_total_bytes: i64,
    /// Rows fetched per eviction step.
    pub eviction_chunk: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            eviction_chunk: DEFAULT_EVICTION_CHUNK,
        }
    }
}

/// Append-only store of serialized events.
pub struct EventQueue {
    pool: ConnectionPool,
    config: QueueConfig,
    write_lock: Mutex<()>,
}

impl EventQueue {
    /// Wrap a migrated pool.
    pub fn new(pool: ConnectionPool, config: QueueConfig) -> Self {
        Self {
            pool,
            config,
            write_lock: Mutex::new(()),
        }
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Queue limits in effect.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Durably append a serialized event and enforce the size cap.
    ///
    /// Returns the assigned id. If the entry alone exceeds the cap it is
    /// evicted along with everything older.
    pub fn append(&self, payload: &str) -> Result<i64> {
        let _guard = self.write_lock.lock();
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let id = QueueRepo::insert(&tx, payload)?;
        let evicted = self.evict_over_cap(&tx)?;
        tx.commit()?;

        debug!(id, size = payload.len(), "event appended");
        if evicted > 0 {
            info!(evicted, max_bytes = self.config.max_total_bytes, "queue over cap, evicted oldest entries");
        }
        Ok(id)
    }

    fn evict_over_cap(&self, conn: &rusqlite::Connection) -> Result<usize> {
        let (_, mut total) = QueueRepo::totals(conn)?;
        let mut evicted = 0;
        let chunk_size = self.config.eviction_chunk.max(1);

        while total > self.config.max_total_bytes {
            let chunk = QueueRepo::oldest(conn, chunk_size)?;
            if chunk.is_empty() {
                warn!(total, "size total positive with empty queue");
                break;
            }
            for (id, size) in chunk {
                if total <= self.config.max_total_bytes {
                    break;
                }
                evicted += QueueRepo::delete(conn, id)?;
                total -= size;
            }
        }
        Ok(evicted)
    }

    /// Forward-only iterator over entries in id order, fetching
    /// `page_size` rows at a time.
    pub fn cursor(&self, page_size: usize) -> QueueCursor<'_> {
        QueueCursor {
            queue: self,
            last_id: 0,
            page_size: page_size.max(1),
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Delete every entry with `id <= last_id`. Returns rows deleted.
    pub fn delete_up_to(&self, last_id: i64) -> Result<usize> {
        let _guard = self.write_lock.lock();
        let conn = self.conn()?;
        let deleted = QueueRepo::delete_up_to(&conn, last_id)?;
        debug!(last_id, deleted, "delivered range deleted");
        Ok(deleted)
    }

    /// Sum of `size_bytes` over all entries.
    pub fn total_size_bytes(&self) -> Result<i64> {
        Ok(QueueRepo::totals(&*self.conn()?)?.1)
    }

    /// Number of queued entries.
    pub fn total_count(&self) -> Result<i64> {
        Ok(QueueRepo::totals(&*self.conn()?)?.0)
    }
}

/// Keyset-paginated cursor over the queue.
///
/// Each page is read after the last id handed out, so deleting entries
/// already yielded never shifts entries still to come.
pub struct QueueCursor<'a> {
    queue: &'a EventQueue,
    last_id: i64,
    page_size: usize,
    buffer: VecDeque<QueueEntry>,
    exhausted: bool,
}

impl QueueCursor<'_> {
    fn refill(&mut self) -> Result<()> {
        let conn = self.queue.conn()?;
        let page = QueueRepo::page_after(&conn, self.last_id, self.page_size)?;
        if page.is_empty() {
            self.exhausted = true;
        }
        self.buffer.extend(page);
        Ok(())
    }
}

impl Iterator for QueueCursor<'_> {
    type Item = Result<QueueEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.refill() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        let entry = self.buffer.pop_front()?;
        self.last_id = entry.id;
        Some(Ok(entry))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Row structs for `rusqlite` mapping.

use rusqlite::Row;

/// One queued, serialized event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueEntry {
    /// Store-assigned id; defines FIFO order.
    pub id: i64,
    /// Serialized event JSON.
    pub payload: String,
    /// Byte length of `payload`.
    pub size_bytes: i64,
}

impl QueueEntry {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            payload: row.get("payload")?,
            size_bytes: row.get("size_bytes")?,
        })
    }
}

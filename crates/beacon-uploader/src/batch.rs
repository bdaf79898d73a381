//! Size- and count-bounded batching of queue entries.
//!
//! Entries are taken in queue order. An entry that would push the batch past
//! either cap closes the batch and opens the next one, so a batch always
//! holds at least one entry even when that entry alone exceeds the byte cap.

use beacon_store::{QueueEntry, StoreError};

/// A contiguous run of queue entries, ready to upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    /// JSON array of the entries' payloads.
    pub payload: String,
    /// Id of the first entry.
    pub first_id: i64,
    /// Id of the last entry; delete up to here on success.
    pub last_id: i64,
    /// Number of entries.
    pub count: usize,
    /// Summed `size_bytes` of the entries.
    pub size_bytes: i64,
}

/// Builds [`Batch`]es from an ordered stream of entries.
pub struct BatchBuilder<I> {
    entries: I,
    carry: Option<QueueEntry>,
    max_bytes: i64,
    max_events: usize,
}

impl<I> BatchBuilder<I>
where
    I: Iterator<Item = Result<QueueEntry, StoreError>>,
{
    /// Batch `entries` under `max_bytes` and `max_events`.
    pub fn new(entries: I, max_bytes: i64, max_events: usize) -> Self {
        Self {
            entries,
            carry: None,
            max_bytes,
            max_events: max_events.max(1),
        }
    }

    /// The next batch, or `None` once the entries are exhausted.
    pub fn next_batch(&mut self) -> Result<Option<Batch>, StoreError> {
        let mut parts: Vec<String> = Vec::new();
        let mut size_bytes = 0_i64;
        let mut first_id = 0;
        let mut last_id = 0;

        loop {
            let entry = match self.carry.take() {
                Some(entry) => entry,
                None => match self.entries.next() {
                    Some(entry) => entry?,
                    None => break,
                },
            };

            let over_bytes = size_bytes + entry.size_bytes > self.max_bytes;
            let over_count = parts.len() + 1 > self.max_events;
            if !parts.is_empty() && (over_bytes || over_count) {
                self.carry = Some(entry);
                break;
            }

            if parts.is_empty() {
                first_id = entry.id;
            }
            size_bytes += entry.size_bytes;
            last_id = entry.id;
            parts.push(entry.payload);
        }

        if parts.is_empty() {
            return Ok(None);
        }

        Ok(Some(Batch {
            payload: format!("[{}]", parts.join(",")),
            first_id,
            last_id,
            count: parts.len(),
            size_bytes,
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(sizes: &[usize]) -> Vec<Result<QueueEntry, StoreError>> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                Ok(QueueEntry {
                    id: i64::try_from(i).unwrap() + 1,
                    payload: format!("\"{}\"", "x".repeat(size.saturating_sub(2))),
                    size_bytes: i64::try_from(size).unwrap(),
                })
            })
            .collect()
    }

    fn all_batches(sizes: &[usize], max_bytes: i64, max_events: usize) -> Vec<Batch> {
        let mut builder = BatchBuilder::new(entries(sizes).into_iter(), max_bytes, max_events);
        let mut out = Vec::new();
        while let Some(batch) = builder.next_batch().unwrap() {
            out.push(batch);
        }
        out
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(all_batches(&[], 100, 10).is_empty());
    }

    #[test]
    fn small_entries_fit_one_batch() {
        let batches = all_batches(&[10; 20], 512 * 1024, 100);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].count, 20);
        assert_eq!(batches[0].first_id, 1);
        assert_eq!(batches[0].last_id, 20);
    }

    #[test]
    fn payload_is_json_array() {
        let batches = all_batches(&[5, 5, 5], 100, 10);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&batches[0].payload).unwrap();
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn count_cap_splits() {
        let batches = all_batches(&[1; 250], 1_000_000, 100);
        let counts: Vec<usize> = batches.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![100, 100, 50]);
        assert_eq!(batches[1].first_id, 101);
    }

    #[test]
    fn byte_cap_splits_and_carries_entry() {
        // 40 + 40 fits in 100; the third would make 120.
        let batches = all_batches(&[40, 40, 40, 40, 40], 100, 100);
        let counts: Vec<usize> = batches.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 2, 1]);
        assert_eq!(batches[1].first_id, 3);
        assert_eq!(batches[2].first_id, 5);
    }

    #[test]
    fn exact_fit_is_allowed() {
        let batches = all_batches(&[50, 50], 100, 100);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].size_bytes, 100);
    }

    #[test]
    fn oversized_entry_sent_alone() {
        let batches = all_batches(&[10, 500, 10], 100, 100);
        let counts: Vec<usize> = batches.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1]);
        assert_eq!(batches[1].size_bytes, 500);
    }

    #[test]
    fn storage_error_is_propagated() {
        let items: Vec<Result<QueueEntry, StoreError>> = vec![Err(StoreError::Migration {
            message: "gone".into(),
        })];
        let mut builder = BatchBuilder::new(items.into_iter(), 100, 10);
        assert!(builder.next_batch().is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn batches_respect_caps_and_cover_input(
                sizes in proptest::collection::vec(1usize..300, 0..200),
                max_bytes in 50i64..1_000,
                max_events in 1usize..20,
            ) {
                let batches = all_batches(&sizes, max_bytes, max_events);
                let mut next_id = 1;
                for batch in &batches {
                    prop_assert!(batch.count >= 1);
                    prop_assert!(batch.count <= max_events);
                    prop_assert!(batch.size_bytes <= max_bytes || batch.count == 1);
                    prop_assert_eq!(batch.first_id, next_id);
                    next_id = batch.last_id + 1;
                }
                prop_assert_eq!(next_id - 1, i64::try_from(sizes.len()).unwrap());
            }
        }
    }
}

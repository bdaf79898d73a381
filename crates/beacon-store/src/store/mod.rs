//! High-level stores composed from the repositories.

pub mod event_queue;
pub mod preferences;

//! # beacon-store
//!
//! Durable local storage for the Beacon telemetry SDK, on `SQLite`.
//!
//! - **Event queue**: append-only FIFO of serialized events with a total-size
//!   cap and oldest-first eviction ([`EventQueue`])
//! - **Cursor**: forward-only keyset iteration that tolerates deletes of
//!   already-visited ranges ([`QueueCursor`])
//! - **Preferences**: typed key/value state such as the bundle sequence id,
//!   the persisted session, and first-open/version flags ([`PreferenceStore`])
//! - **Migrations**: version-tracked schema evolution

#![deny(unsafe_code)]

pub mod errors;
pub mod sqlite;
pub mod store;

pub use errors::{Result, StoreError};
pub use sqlite::connection::{ConnectionConfig, ConnectionPool, PooledConnection};
pub use sqlite::migrations::{current_version, latest_version, run_migrations};
pub use sqlite::row_types::QueueEntry;
pub use sqlite::{open_file, open_in_memory};
pub use store::event_queue::{EventQueue, QueueConfig, QueueCursor};
pub use store::preferences::{PreferenceStore, UserIdentity};

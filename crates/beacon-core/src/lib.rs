//! # beacon-core
//!
//! Foundation types for the Beacon telemetry SDK.
//!
//! This crate provides the vocabulary shared by the store, uploader and
//! client crates:
//!
//! - **Attributes**: [`AttrValue`] tagged values and [`AttributeSet`] with bounded counts
//! - **Validation**: naming and size rules for event types, attributes and items, with numeric error codes
//! - **Items**: [`Item`] key/value records attached to events
//! - **Event records**: [`EventRecord`] with device/app/SDK context snapshots and its JSON wire format
//! - **Sessions**: [`SessionTracker`] state machine with timeout-based continuation
//! - **Clock**: [`Clock`] seam so time can be driven manually in tests
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` subscriber

#![deny(unsafe_code)]

pub mod attributes;
pub mod clock;
pub mod errors;
pub mod events;
pub mod ids;
pub mod items;
pub mod limits;
pub mod logging;
pub mod record;
pub mod session;
pub mod validation;

pub use attributes::{AttrValue, AttributeSet, UserAttribute, UserAttributes};
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{CoreError, Result};
pub use events::{PresetEvent, ReservedAttribute};
pub use ids::{EventId, UniqueId};
pub use items::Item;
pub use record::{AppInfo, DeviceInfo, EventContext, EventRecord, SdkInfo, SessionSnapshot};
pub use session::{Session, SessionState, SessionTracker};
pub use validation::{AttributeScope, ErrorKind, Violation};

//! # beacon
//!
//! Client facade for the Beacon telemetry SDK.
//!
//! [`AnalyticsClient`] wires the pieces together:
//!
//! - **Events**: validated creation, global and user attribute snapshots,
//!   durable enqueue into the local queue
//! - **Sessions**: start/pause with timeout-based continuation, persisted
//!   across restarts
//! - **Lifecycle**: first-open and app/OS version-change events
//! - **Users**: per-user identity when the signed-in user id changes
//! - **Uploads**: `flush` hands a pass to the serialized submitter, and a
//!   timer does the same every `send_events_interval_ms`

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod options;

pub use client::AnalyticsClient;
pub use errors::{ClientError, Result};
pub use options::ClientOptions;

pub use beacon_core::{AppInfo, AttrValue, DeviceInfo, EventRecord, Item, SdkInfo};
pub use beacon_settings::BeaconSettings;

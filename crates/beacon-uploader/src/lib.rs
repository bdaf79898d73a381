//! # beacon-uploader
//!
//! Moves queued events to the collector.
//!
//! - **Seams**: [`Transport`] (black-box `upload(payload, sequence) -> bool`)
//!   and [`Connectivity`]
//! - **Batching**: [`BatchBuilder`] groups consecutive queue entries under
//!   byte and count caps
//! - **Processing pass**: [`EventRecorder::process_events`] uploads up to a
//!   fixed number of batches and deletes what was delivered
//! - **Submit queue**: [`Submitter`] runs passes one at a time on a single
//!   worker with a bounded, drop-when-full backlog
//! - **HTTP**: [`HttpTransport`] posts batches with `reqwest`

#![deny(unsafe_code)]

pub mod batch;
pub mod errors;
pub mod http;
pub mod recorder;
pub mod submitter;
pub mod test_utils;
pub mod transport;

pub use batch::{Batch, BatchBuilder};
pub use errors::{Result, UploadError};
pub use http::{HttpTransport, HttpTransportConfig, hash_code};
pub use recorder::{EventRecorder, UploadLimits};
pub use submitter::Submitter;
pub use transport::{AlwaysOnline, Connectivity, Transport};

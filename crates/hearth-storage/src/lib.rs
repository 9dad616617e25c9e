//! Hearth Storage - Durable telemetry sink
//!
//! A single background worker thread drains a queue of readings and appends
//! them to a newline-delimited JSON log. Producers never block: `enqueue`
//! hands the record to the queue and returns, and the worker flushes
//! periodically rather than per write so disk I/O cost stays bounded.

pub mod error;
pub mod sink;

pub use error::{Result, StorageError};
pub use sink::{SinkConfig, SinkStats, TelemetrySink};

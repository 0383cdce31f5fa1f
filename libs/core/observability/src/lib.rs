//! Observability utilities: error alerting on top of `tracing`.
//!
//! This crate provides:
//! - [`AlertSink`], the capability every alert channel implements
//! - [`AlertRecord`], the captured form of a severe tracing event
//! - [`AlertLayer`], a `tracing_subscriber` layer that hands severe events to
//!   a sink synchronously, on the thread that emitted them
//! - [`MemorySink`], an in-memory sink for tests and local inspection
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{AlertLayer, MemorySink};
//! use tracing_subscriber::prelude::*;
//!
//! let sink = MemorySink::new();
//! tracing_subscriber::registry()
//!     .with(AlertLayer::new(sink.clone()))
//!     .init();
//!
//! tracing::error!("payment webhook rejected");
//! assert_eq!(sink.count(), 1);
//! ```

pub mod layer;
pub mod record;
pub mod sink;

pub use layer::AlertLayer;
pub use record::AlertRecord;
pub use sink::{AlertError, AlertSink, MemorySink};

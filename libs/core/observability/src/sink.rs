//! Alert sink capability.

use crate::record::AlertRecord;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors an alert sink may report back to the layer.
///
/// The layer never propagates these; they end up on stderr.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert delivery failed: {0}")]
    Delivery(String),

    #[error("alert delivery not possible here: {0}")]
    Unsupported(String),
}

/// A channel that turns severe log events into operator notifications.
///
/// `deliver` runs inline on the thread that emitted the event, so
/// implementations must not rely on an async context and must not spawn
/// work of their own.
#[cfg_attr(test, mockall::automock)]
pub trait AlertSink: Send + Sync {
    /// Deliver a single alert.
    fn deliver(&self, record: &AlertRecord) -> Result<(), AlertError>;

    /// Sink name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Sink that keeps every alert in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<AlertRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the alerts received so far.
    pub fn records(&self) -> Vec<AlertRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

impl AlertSink for MemorySink {
    fn deliver(&self, record: &AlertRecord) -> Result<(), AlertError> {
        self.records
            .lock()
            .map_err(|e| AlertError::Delivery(e.to_string()))?
            .push(record.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

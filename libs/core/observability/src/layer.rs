//! `tracing_subscriber` layer that forwards severe events to an [`AlertSink`].

use crate::record::AlertRecord;
use crate::sink::AlertSink;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer};

thread_local! {
    static DELIVERING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as delivering an alert for its lifetime.
struct DeliveryGuard;

impl DeliveryGuard {
    fn enter() -> Option<Self> {
        DELIVERING.with(|flag| {
            if flag.get() {
                None
            } else {
                flag.set(true);
                Some(DeliveryGuard)
            }
        })
    }
}

impl Drop for DeliveryGuard {
    fn drop(&mut self) {
        DELIVERING.with(|flag| flag.set(false));
    }
}

/// Layer that hands every event at or above `threshold` to a sink.
///
/// Delivery happens synchronously inside `on_event`. Sink errors and panics
/// are written to stderr and swallowed. Events emitted while a delivery is
/// in progress on the same thread (for example, the sink logging its own
/// failure) are not forwarded again.
#[derive(Clone)]
pub struct AlertLayer {
    sink: Arc<dyn AlertSink>,
    threshold: Level,
}

impl AlertLayer {
    /// Alert on `ERROR` events.
    pub fn new(sink: impl AlertSink + 'static) -> Self {
        Self::from_arc(Arc::new(sink))
    }

    pub fn from_arc(sink: Arc<dyn AlertSink>) -> Self {
        Self {
            sink,
            threshold: Level::ERROR,
        }
    }

    /// Lower the severity threshold (e.g. `Level::WARN`).
    pub fn with_threshold(mut self, threshold: Level) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.name()
    }

    fn handle(&self, record: &AlertRecord) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.sink.deliver(record)));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                eprintln!(
                    "--- alert sink '{}' failed: {} (alert: {})",
                    self.sink.name(),
                    err,
                    record.format_line()
                );
            }
            Err(_) => {
                eprintln!(
                    "--- alert sink '{}' panicked (alert: {})",
                    self.sink.name(),
                    record.format_line()
                );
            }
        }
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // More verbose levels compare greater.
        if *event.metadata().level() > self.threshold {
            return;
        }

        let Some(_guard) = DeliveryGuard::enter() else {
            return;
        };

        let record = AlertRecord::from_event(event);
        self.handle(&record);
    }

    fn max_level_hint(&self) -> Option<LevelFilter> {
        Some(LevelFilter::from_level(self.threshold))
    }
}

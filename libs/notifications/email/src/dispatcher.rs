//! Notification dispatcher
//!
//! Fire-and-forget email sending on a bounded worker pool. Callers hand a
//! message to a bounded queue and return; a supervisor task takes messages
//! off the queue and runs each send on a `JoinSet`, with at most
//! `pool_size` sends in flight. A message leaves the queue only when a
//! worker is free, so at most `pool_size + queue_capacity` messages are
//! accepted but unsent at any time. Outcomes are logged, never returned.
//!
//! ```rust,ignore
//! let provider = Arc::new(SendGridChannel::from_config(&mail_config));
//! let (dispatcher, handle) = NotificationDispatcher::start(provider, DispatcherConfig::from_env()?);
//!
//! dispatcher
//!     .send_email("Welcome", "noreply@paperlight.io", "user@example.com", "Hi", "<p>Hi</p>")
//!     .await;
//!
//! handle.shutdown().await;
//! ```

use crate::config::DispatcherConfig;
use crate::error::{DeliveryError, DeliveryResult};
use crate::models::{OutboundMessage, Recipients};
use crate::provider::EmailProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// Cheap, cloneable entry point for sending notifications.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::Sender<OutboundMessage>,
    enqueue_timeout: Duration,
}

/// Owner of the worker pool; stops it on [`DispatcherHandle::shutdown`].
pub struct DispatcherHandle {
    shutdown: watch::Sender<bool>,
    supervisor: JoinHandle<()>,
}

impl NotificationDispatcher {
    /// Start the supervisor on the current tokio runtime.
    ///
    /// Pool size and queue capacity below 1 are raised to 1.
    pub fn start(
        provider: Arc<dyn EmailProvider>,
        config: DispatcherConfig,
    ) -> (Self, DispatcherHandle) {
        let pool_size = config.pool_size.max(1);
        let queue_capacity = config.queue_capacity.max(1);

        let (sender, receiver) = mpsc::channel(queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            provider = provider.name(),
            pool_size,
            queue_capacity,
            enqueue_timeout_ms = config.enqueue_timeout.as_millis() as u64,
            "Starting notification dispatcher"
        );

        let supervisor = tokio::spawn(supervise(provider, receiver, shutdown_rx, pool_size));

        (
            Self {
                sender,
                enqueue_timeout: config.enqueue_timeout,
            },
            DispatcherHandle {
                shutdown: shutdown_tx,
                supervisor,
            },
        )
    }

    /// Queue an email and return without waiting for delivery.
    ///
    /// Never fails: invalid input, a full or closed queue and every delivery
    /// error are logged instead.
    pub async fn send_email(
        &self,
        subject: &str,
        sender: &str,
        recipients: impl Into<Recipients>,
        text_body: &str,
        html_body: &str,
    ) {
        let message = match OutboundMessage::new(subject, sender, recipients, text_body, html_body)
        {
            Ok(message) => message,
            Err(err) => {
                error!(error = %err, subject = %subject, "Email not queued");
                return;
            }
        };

        // Rejections are already logged by `dispatch`.
        let _ = self.dispatch(message).await;
    }

    /// Queue a built message, waiting at most the configured enqueue timeout
    /// for space.
    pub async fn dispatch(&self, message: OutboundMessage) -> DeliveryResult<()> {
        let message_id = message.id();

        match self.sender.send_timeout(message, self.enqueue_timeout).await {
            Ok(()) => {
                debug!(message_id = %message_id, "Email queued");
                Ok(())
            }
            Err(SendTimeoutError::Timeout(_)) => {
                warn!(
                    message_id = %message_id,
                    timeout_ms = self.enqueue_timeout.as_millis() as u64,
                    "Notification queue full; email rejected"
                );
                Err(DeliveryError::QueueFull)
            }
            Err(SendTimeoutError::Closed(_)) => {
                error!(message_id = %message_id, "Notification queue closed; email rejected");
                Err(DeliveryError::QueueClosed)
            }
        }
    }

    /// Queue a built message only if space is available right now.
    pub fn try_dispatch(&self, message: OutboundMessage) -> DeliveryResult<()> {
        let message_id = message.id();

        match self.sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!(message_id = %message_id, "Notification queue full; email rejected");
                Err(DeliveryError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => {
                error!(message_id = %message_id, "Notification queue closed; email rejected");
                Err(DeliveryError::QueueClosed)
            }
        }
    }
}

impl DispatcherHandle {
    /// Stop accepting messages and wait until every accepted message has been
    /// attempted.
    pub async fn shutdown(self) {
        // Fails only if the supervisor is already gone.
        let _ = self.shutdown.send(true);

        if let Err(err) = self.supervisor.await {
            error!(error = %err, "Notification supervisor terminated abnormally");
        }
    }
}

async fn supervise(
    provider: Arc<dyn EmailProvider>,
    mut receiver: mpsc::Receiver<OutboundMessage>,
    mut shutdown: watch::Receiver<bool>,
    pool_size: usize,
) {
    let permits = Arc::new(Semaphore::new(pool_size));
    let mut workers: JoinSet<()> = JoinSet::new();
    let mut watching = true;

    loop {
        // Take a permit first so a message only leaves the queue once a
        // worker is free to send it.
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };

        tokio::select! {
            next = receiver.recv() => {
                let Some(message) = next else {
                    break;
                };

                let provider = Arc::clone(&provider);
                workers.spawn(async move {
                    let _permit = permit;
                    deliver(provider.as_ref(), message).await;
                });
            }
            changed = shutdown.changed(), if watching => {
                match changed {
                    Ok(()) if *shutdown.borrow() => {
                        info!("Notification dispatcher shutting down, draining queue");
                        // Buffered messages are still handed out by `recv`.
                        receiver.close();
                        watching = false;
                    }
                    Ok(()) => {}
                    // Handle dropped without shutdown; run until senders are gone.
                    Err(_) => watching = false,
                }
            }
        }

        while let Some(joined) = workers.try_join_next() {
            log_join(joined);
        }
    }

    while let Some(joined) = workers.join_next().await {
        log_join(joined);
    }

    info!("Notification dispatcher stopped");
}

async fn deliver(provider: &dyn EmailProvider, message: OutboundMessage) {
    match provider.send(&message).await {
        Ok(outcome) => {
            info!(
                message_id = %message.id(),
                provider = provider.name(),
                status = outcome.status,
                provider_message_id = %outcome.message_id,
                recipients = message.recipients().len(),
                "Email sent"
            );
        }
        Err(err) if err.is_configuration() => {
            error!(
                message_id = %message.id(),
                provider = provider.name(),
                error = %err,
                "Email not sent: delivery provider not configured"
            );
        }
        Err(err) => {
            error!(
                message_id = %message.id(),
                provider = provider.name(),
                error = %err,
                "Email delivery failed"
            );
        }
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(err) = joined {
        error!(error = %err, "Email worker panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::StaticCredentialSource;
    use crate::provider::{MockEmailProvider, SendGridChannel};
    use crate::transport::{HttpReply, MockHttpTransport};
    use observability::{AlertLayer, MemorySink};
    use serde_json::json;
    use std::time::Instant;
    use tracing::Level;
    use tracing_subscriber::prelude::*;

    fn capture(threshold: Level) -> (MemorySink, tracing::subscriber::DefaultGuard) {
        let sink = MemorySink::new();
        let subscriber = tracing_subscriber::registry()
            .with(AlertLayer::new(sink.clone()).with_threshold(threshold));
        let guard = tracing::subscriber::set_default(subscriber);
        (sink, guard)
    }

    fn errors(sink: &MemorySink) -> Vec<String> {
        sink.records()
            .into_iter()
            .filter(|r| r.level == Level::ERROR)
            .map(|r| r.format_line())
            .collect()
    }

    #[tokio::test]
    async fn test_send_email_reaches_provider() {
        let provider = Arc::new(MockEmailProvider::new());
        let (dispatcher, handle) =
            NotificationDispatcher::start(provider.clone(), DispatcherConfig::default());

        dispatcher
            .send_email("Hello", "a@x.com", "b@y.com", "hi", "<p>hi</p>")
            .await;
        handle.shutdown().await;

        let sent = provider.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject(), "Hello");
        assert_eq!(sent[0].html_body(), "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_recipients_always_reach_provider_as_list() {
        let provider = Arc::new(MockEmailProvider::new());
        let (dispatcher, handle) =
            NotificationDispatcher::start(provider.clone(), DispatcherConfig::default());

        dispatcher.send_email("s", "a@x.com", "one@y.com", "", "<p/>").await;
        dispatcher
            .send_email("s", "a@x.com", vec!["two@y.com".to_string()], "", "<p/>")
            .await;
        dispatcher
            .send_email("s", "a@x.com", ["three@y.com", "four@y.com"], "", "<p/>")
            .await;
        handle.shutdown().await;

        let mut seen: Vec<Vec<String>> = provider
            .sent_messages()
            .await
            .into_iter()
            .map(|m| m.recipients().clone().into_vec())
            .collect();
        seen.sort();

        assert_eq!(
            seen,
            vec![
                vec!["one@y.com".to_string()],
                vec!["three@y.com".to_string(), "four@y.com".to_string()],
                vec!["two@y.com".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_sendgrid_scenario_logs_sent_status() {
        let (sink, _guard) = capture(Level::INFO);

        let mut transport = MockHttpTransport::new();
        transport
            .expect_post_json()
            .times(1)
            .withf(|_, bearer, body| {
                bearer == "SG.key"
                    && body["personalizations"][0]["to"]
                        == json!([{"email": "b@y.com"}, {"email": "c@y.com"}])
                    && body["content"]
                        == json!([
                            {"type": "text/plain", "value": "hi"},
                            {"type": "text/html", "value": "<p>hi</p>"}
                        ])
            })
            .returning(|_, _, _| {
                Ok(HttpReply {
                    status: 202,
                    message_id: Some("sg-1".to_string()),
                    body: String::new(),
                })
            });

        let channel = SendGridChannel::with_transport(
            Arc::new(StaticCredentialSource::new("SG.key")),
            transport,
        );
        let (dispatcher, handle) =
            NotificationDispatcher::start(Arc::new(channel), DispatcherConfig::default());

        dispatcher
            .send_email("Test", "a@x.com", ["b@y.com", "c@y.com"], "hi", "<p>hi</p>")
            .await;
        handle.shutdown().await;

        let sent: Vec<_> = sink
            .records()
            .into_iter()
            .filter(|r| r.message == "Email sent")
            .collect();
        assert_eq!(sent.len(), 1);
        assert!(sent[0]
            .fields
            .iter()
            .any(|(k, v)| k == "status" && v == "202"));
    }

    #[tokio::test]
    async fn test_missing_credential_logs_one_error_and_makes_no_request() {
        let (sink, _guard) = capture(Level::ERROR);

        let mut transport = MockHttpTransport::new();
        transport.expect_post_json().times(0);

        let channel =
            SendGridChannel::with_transport(Arc::new(StaticCredentialSource::missing()), transport);
        let (dispatcher, handle) =
            NotificationDispatcher::start(Arc::new(channel), DispatcherConfig::default());

        dispatcher
            .send_email("Test", "a@x.com", "b@y.com", "hi", "<p>hi</p>")
            .await;
        handle.shutdown().await;

        let errors = errors(&sink);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("not configured"));
    }

    #[tokio::test]
    async fn test_empty_recipients_never_reach_provider() {
        let (sink, _guard) = capture(Level::ERROR);
        let provider = Arc::new(MockEmailProvider::new());
        let (dispatcher, handle) =
            NotificationDispatcher::start(provider.clone(), DispatcherConfig::default());

        let none: Vec<String> = Vec::new();
        dispatcher.send_email("s", "a@x.com", none, "t", "<p/>").await;
        handle.shutdown().await;

        assert_eq!(provider.attempts(), 0);
        assert_eq!(errors(&sink).len(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_is_logged_not_raised() {
        let (sink, _guard) = capture(Level::ERROR);
        let provider = Arc::new(MockEmailProvider::failing("connection refused"));
        let (dispatcher, handle) =
            NotificationDispatcher::start(provider.clone(), DispatcherConfig::default());

        dispatcher.send_email("s", "a@x.com", "b@y.com", "t", "<p/>").await;
        handle.shutdown().await;

        assert_eq!(provider.attempts(), 1);
        let errors = errors(&sink);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("connection refused"));
    }

    #[tokio::test]
    async fn test_send_email_does_not_wait_for_delivery() {
        let delay = Duration::from_millis(500);
        let provider = Arc::new(MockEmailProvider::new().with_delay(delay));
        let (dispatcher, handle) =
            NotificationDispatcher::start(provider.clone(), DispatcherConfig::default());

        let started = Instant::now();
        dispatcher.send_email("s", "a@x.com", "b@y.com", "t", "<p/>").await;
        assert!(started.elapsed() < delay);

        handle.shutdown().await;
        assert_eq!(provider.sent_count().await, 1);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_after_timeout() {
        let provider = Arc::new(MockEmailProvider::new().with_delay(Duration::from_millis(300)));
        let config = DispatcherConfig::default()
            .with_pool_size(1)
            .with_queue_capacity(1)
            .with_enqueue_timeout(Duration::from_millis(20));
        let (dispatcher, handle) = NotificationDispatcher::start(provider.clone(), config);

        let mut accepted = 0;
        let mut rejected = 0;
        for _ in 0..5 {
            let message = OutboundMessage::new("s", "a@x.com", "b@y.com", "t", "<p/>").unwrap();
            match dispatcher.dispatch(message).await {
                Ok(()) => accepted += 1,
                Err(DeliveryError::QueueFull) => rejected += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        handle.shutdown().await;

        assert!(rejected >= 1);
        assert_eq!(accepted + rejected, 5);
        assert_eq!(provider.sent_count().await, accepted);
    }

    #[tokio::test]
    async fn test_accepts_pool_plus_capacity_while_busy() {
        let provider = Arc::new(MockEmailProvider::new().with_delay(Duration::from_millis(300)));
        let config = DispatcherConfig::default()
            .with_pool_size(1)
            .with_queue_capacity(1)
            .with_enqueue_timeout(Duration::from_millis(20));
        let (dispatcher, handle) = NotificationDispatcher::start(provider.clone(), config);

        let message = || OutboundMessage::new("s", "a@x.com", "b@y.com", "t", "<p/>").unwrap();

        // Let the supervisor hand the first message to the only worker.
        dispatcher.dispatch(message()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(provider.attempts(), 1);

        let results = [
            dispatcher.dispatch(message()).await,
            dispatcher.dispatch(message()).await,
            dispatcher.dispatch(message()).await,
        ];
        handle.shutdown().await;

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(DeliveryError::QueueFull)));
        assert!(matches!(results[2], Err(DeliveryError::QueueFull)));
        assert_eq!(provider.sent_count().await, 2);
    }

    #[tokio::test]
    async fn test_shutdown_drains_accepted_messages() {
        let provider = Arc::new(MockEmailProvider::new().with_delay(Duration::from_millis(20)));
        let config = DispatcherConfig::default().with_pool_size(2);
        let (dispatcher, handle) = NotificationDispatcher::start(provider.clone(), config);

        for i in 0..10 {
            dispatcher
                .send_email(&format!("n{i}"), "a@x.com", "b@y.com", "t", "<p/>")
                .await;
        }
        handle.shutdown().await;

        assert_eq!(provider.sent_count().await, 10);
    }

    #[tokio::test]
    async fn test_dispatch_after_shutdown_is_rejected() {
        let provider = Arc::new(MockEmailProvider::new());
        let (dispatcher, handle) =
            NotificationDispatcher::start(provider.clone(), DispatcherConfig::default());
        handle.shutdown().await;

        let message = OutboundMessage::new("s", "a@x.com", "b@y.com", "t", "<p/>").unwrap();
        assert!(matches!(
            dispatcher.dispatch(message).await,
            Err(DeliveryError::QueueClosed)
        ));

        let message = OutboundMessage::new("s", "a@x.com", "b@y.com", "t", "<p/>").unwrap();
        assert!(matches!(
            dispatcher.try_dispatch(message),
            Err(DeliveryError::QueueClosed)
        ));
        assert_eq!(provider.attempts(), 0);
    }
}

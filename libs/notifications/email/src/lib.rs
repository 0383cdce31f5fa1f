//! Outbound email notifications
//!
//! Fire-and-forget email delivery for request handlers, plus email alerts for
//! severe log events.
//!
//! ## Components
//!
//! - **Dispatcher**: [`NotificationDispatcher`] queues messages for a bounded
//!   worker pool and never reports delivery failures to the caller
//! - **Models**: [`OutboundMessage`] and [`Recipients`]
//! - **Providers**: [`SendGridChannel`] (HTTP API) and [`MockEmailProvider`]
//! - **Alerts**: [`SendGridAlertSink`], attached to tracing by [`bootstrap`]
//!
//! ## Usage
//!
//! ```ignore
//! use core_config::{Environment, FromEnv};
//! use email::{bootstrap, DispatcherConfig, MailConfig, NotificationDispatcher, SendGridChannel};
//! use std::sync::Arc;
//!
//! let environment = Environment::from_env();
//! let mail = MailConfig::from_env()?;
//! let _observability = bootstrap::init_observability(&environment, &mail);
//!
//! let provider = Arc::new(SendGridChannel::from_config(&mail));
//! let (dispatcher, handle) = NotificationDispatcher::start(provider, DispatcherConfig::from_env()?);
//!
//! dispatcher
//!     .send_email("Welcome", &mail.sender, ["a@example.com", "b@example.com"], "Hi", "<p>Hi</p>")
//!     .await;
//! handle.shutdown().await;
//! ```

pub mod alerts;
pub mod bootstrap;
pub mod config;
pub mod credential;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod provider;
pub mod transport;

pub use alerts::SendGridAlertSink;
pub use config::{DispatcherConfig, MailConfig};
pub use credential::{CredentialSource, DeliveryCredential, EnvCredentialSource, StaticCredentialSource};
pub use dispatcher::{DispatcherHandle, NotificationDispatcher};
pub use error::{DeliveryError, DeliveryResult};
pub use models::{OutboundMessage, Recipients};
pub use provider::{EmailProvider, MockEmailProvider, SendGridChannel, SendOutcome, SENDGRID_API_URL};

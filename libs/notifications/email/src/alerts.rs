//! Error alerts by email.
//!
//! [`SendGridAlertSink`] implements [`observability::AlertSink`] on top of the
//! blocking flavour of [`SendGridChannel`], so alerts and regular mail share
//! credential lookup and payload construction.

use crate::config::MailConfig;
use crate::credential::EnvCredentialSource;
use crate::error::DeliveryError;
use crate::models::{OutboundMessage, Recipients};
use crate::provider::SendGridChannel;
use crate::transport::{BlockingHttpTransport, LazyBlockingClient};
use observability::{AlertError, AlertRecord, AlertSink};
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};

/// Mails every alert to the administrator list.
pub struct SendGridAlertSink<T = LazyBlockingClient> {
    channel: SendGridChannel<T>,
    sender: String,
    admins: Recipients,
    subject: String,
}

impl SendGridAlertSink<LazyBlockingClient> {
    pub fn from_config(config: &MailConfig) -> Self {
        let channel =
            SendGridChannel::blocking(Arc::new(EnvCredentialSource::new(&config.api_key_var)))
                .with_endpoint(&config.api_url);
        Self::with_channel(channel, config)
    }
}

impl<T> SendGridAlertSink<T> {
    pub fn with_channel(channel: SendGridChannel<T>, config: &MailConfig) -> Self {
        Self {
            channel,
            sender: config.sender.clone(),
            admins: Recipients::from(config.admins.as_slice()),
            subject: config.alert_subject.clone(),
        }
    }

    pub fn admins(&self) -> &Recipients {
        &self.admins
    }

    fn compose(&self, record: &AlertRecord) -> Result<OutboundMessage, AlertError> {
        OutboundMessage::new(
            self.subject.as_str(),
            self.sender.as_str(),
            self.admins.clone(),
            record.format_line(),
            record.to_html(),
        )
        .map_err(into_alert_error)
    }
}

impl<T: BlockingHttpTransport> AlertSink for SendGridAlertSink<T> {
    fn deliver(&self, record: &AlertRecord) -> Result<(), AlertError> {
        let message = self.compose(record)?;

        run_blocking(|| {
            self.channel
                .deliver_blocking(&message)
                .map(|_| ())
                .map_err(into_alert_error)
        })
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}

/// Run blocking I/O from whatever context emitted the event.
///
/// On a multi-thread runtime worker the thread is handed over with
/// `block_in_place`; a current-thread runtime cannot do that without
/// stalling every task on it, so delivery is refused there.
fn run_blocking<F, R>(f: F) -> Result<R, AlertError>
where
    F: FnOnce() -> Result<R, AlertError>,
{
    match Handle::try_current() {
        Ok(handle) => match handle.runtime_flavor() {
            RuntimeFlavor::MultiThread => tokio::task::block_in_place(f),
            flavor => Err(AlertError::Unsupported(format!(
                "blocking delivery on a {:?} runtime",
                flavor
            ))),
        },
        Err(_) => f(),
    }
}

fn into_alert_error(err: DeliveryError) -> AlertError {
    AlertError::Delivery(err.to_string())
}

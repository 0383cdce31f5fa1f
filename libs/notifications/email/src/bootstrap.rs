//! Startup wiring for tracing and email alerts.

use crate::alerts::SendGridAlertSink;
use crate::config::MailConfig;
use crate::credential::{CredentialSource, EnvCredentialSource};
use core_config::tracing::TracingGuard;
use core_config::Environment;
use observability::AlertLayer;
use tracing::info;

/// Build the email alert layer if alerts should be armed.
///
/// Returns `None` unless the environment is production, a SendGrid key is
/// present right now and at least one administrator is configured.
pub fn alert_layer(environment: &Environment, config: &MailConfig) -> Option<AlertLayer> {
    if !environment.is_production() || config.admins.is_empty() {
        return None;
    }

    EnvCredentialSource::new(&config.api_key_var).resolve()?;

    Some(AlertLayer::new(SendGridAlertSink::from_config(config)))
}

/// What [`init_observability`] installed. Hold it for the life of the
/// process so the log file keeps being written.
pub struct Observability {
    alerts_armed: bool,
    tracing: TracingGuard,
}

impl Observability {
    pub fn alerts_armed(&self) -> bool {
        self.alerts_armed
    }

    pub fn writes_file(&self) -> bool {
        self.tracing.writes_file()
    }
}

/// Install color-eyre and the global subscriber, with the email alert layer
/// when [`alert_layer`] allows it.
pub fn init_observability(environment: &Environment, config: &MailConfig) -> Observability {
    core_config::tracing::install_color_eyre();

    let layer = alert_layer(environment, config);
    let alerts_armed = layer.is_some();

    let guard = core_config::tracing::init_tracing_with(environment, layer);

    info!("PaperLight startup");
    if alerts_armed {
        info!(admins = config.admins.len(), "Error alerts by email enabled");
    } else {
        info!(environment = ?environment, "Error alerts by email disabled");
    }

    Observability {
        alerts_armed,
        tracing: guard,
    }
}

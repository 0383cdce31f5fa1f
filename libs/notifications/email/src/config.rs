//! Mail and dispatcher configuration, loaded once at startup and injected.

use crate::credential::SENDGRID_API_KEY_VAR;
use crate::provider::SENDGRID_API_URL;
use core_config::{env_list, env_non_empty, env_or_default, env_parse_or, ConfigError, FromEnv};
use std::time::Duration;

/// Addresses and provider settings for outbound mail.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Sender used for alerts and as the default `from`
    pub sender: String,
    /// Administrator recipients for error alerts
    pub admins: Vec<String>,
    /// Subject line for error alerts
    pub alert_subject: String,
    /// Environment variable the API key is read from on every send
    pub api_key_var: String,
    /// SendGrid send endpoint
    pub api_url: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender: "noreply@localhost".to_string(),
            admins: Vec::new(),
            alert_subject: "PaperLight Failure".to_string(),
            api_key_var: SENDGRID_API_KEY_VAR.to_string(),
            api_url: SENDGRID_API_URL.to_string(),
        }
    }
}

impl FromEnv for MailConfig {
    /// Reads:
    /// - `MAIL_SENDER`, falling back to `MAIL_USERNAME`
    /// - `ADMINS` (comma-separated)
    /// - `ALERT_SUBJECT`
    /// - `SENDGRID_API_URL`
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let sender = env_non_empty("MAIL_SENDER")
            .or_else(|| env_non_empty("MAIL_USERNAME"))
            .unwrap_or(defaults.sender);

        Ok(Self {
            sender,
            admins: env_list("ADMINS"),
            alert_subject: env_or_default("ALERT_SUBJECT", &defaults.alert_subject),
            api_key_var: defaults.api_key_var,
            api_url: env_or_default("SENDGRID_API_URL", &defaults.api_url),
        })
    }
}

/// Sizing of the dispatcher's worker pool and queue.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Maximum sends in flight at once
    pub pool_size: usize,
    /// Messages that may wait for a free worker
    pub queue_capacity: usize,
    /// Longest a caller waits for queue space before the message is rejected
    pub enqueue_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            queue_capacity: 256,
            enqueue_timeout: Duration::from_millis(100),
        }
    }
}

impl DispatcherConfig {
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_enqueue_timeout(mut self, timeout: Duration) -> Self {
        self.enqueue_timeout = timeout;
        self
    }
}

impl FromEnv for DispatcherConfig {
    /// Reads `NOTIFY_POOL_SIZE`, `NOTIFY_QUEUE_CAPACITY` and
    /// `NOTIFY_ENQUEUE_TIMEOUT_MS`; pool size and capacity must be at least 1.
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let pool_size = env_parse_or("NOTIFY_POOL_SIZE", defaults.pool_size)?;
        let queue_capacity = env_parse_or("NOTIFY_QUEUE_CAPACITY", defaults.queue_capacity)?;
        let timeout_ms = env_parse_or(
            "NOTIFY_ENQUEUE_TIMEOUT_MS",
            defaults.enqueue_timeout.as_millis() as u64,
        )?;

        if pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "NOTIFY_POOL_SIZE".to_string(),
                details: "must be at least 1".to_string(),
            });
        }
        if queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "NOTIFY_QUEUE_CAPACITY".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            pool_size,
            queue_capacity,
            enqueue_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

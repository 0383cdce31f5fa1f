//! HTTP transports used by delivery channels.
//!
//! Two flavours share one reply type: [`HttpTransport`] for the async
//! dispatcher path and [`BlockingHttpTransport`] for alert delivery, which
//! runs inline on the thread emitting a log event.

use async_trait::async_trait;
use eyre::{eyre, Result};
use std::sync::OnceLock;

/// What a delivery channel needs to know about a provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    /// Provider message id (`X-Message-Id`), when returned
    pub message_id: Option<String>,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Async JSON POST with bearer authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> Result<HttpReply>;
}

#[async_trait]
impl HttpTransport for reqwest::Client {
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> Result<HttpReply> {
        let response = self
            .post(url)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await
            .map_err(|e| eyre!("request to {} failed: {}", url, e))?;

        let status = response.status().as_u16();
        let message_id = message_id_header(response.headers());
        let body = response.text().await.unwrap_or_default();

        Ok(HttpReply {
            status,
            message_id,
            body,
        })
    }
}

/// Blocking JSON POST with bearer authentication.
#[cfg_attr(test, mockall::automock)]
pub trait BlockingHttpTransport: Send + Sync {
    fn post_json(&self, url: &str, bearer: &str, body: &serde_json::Value) -> Result<HttpReply>;
}

/// `reqwest::blocking::Client` built on first use.
///
/// The blocking client must be created and used where blocking is allowed,
/// so construction is deferred to the first delivery instead of startup.
#[derive(Default)]
pub struct LazyBlockingClient {
    inner: OnceLock<reqwest::blocking::Client>,
}

impl LazyBlockingClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockingHttpTransport for LazyBlockingClient {
    fn post_json(&self, url: &str, bearer: &str, body: &serde_json::Value) -> Result<HttpReply> {
        let client = self.inner.get_or_init(reqwest::blocking::Client::new);

        let response = client
            .post(url)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .map_err(|e| eyre!("request to {} failed: {}", url, e))?;

        let status = response.status().as_u16();
        let message_id = message_id_header(response.headers());
        let body = response.text().unwrap_or_default();

        Ok(HttpReply {
            status,
            message_id,
            body,
        })
    }
}

fn message_id_header(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get("X-Message-Id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

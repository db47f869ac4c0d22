pub mod clock;
pub mod gateway;
pub mod http_fetcher;
pub mod retry;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use thiserror::Error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use gateway::{FetchGateway, RequestOptions};
pub use retry::RetryPolicy;

/// Errors surfaced by the fetch layer.
///
/// Cloneable because one result is handed to every caller that was waiting
/// on the same in-flight request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Rate limited (429) after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("HTTP {status}{}", body_suffix(.body))]
    Upstream { status: u16, body: Option<String> },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request aborted")]
    Aborted,
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref().map(|b| format!(": {}", b)).unwrap_or_default()
}

/// A raw HTTP response, before any status handling.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    /// Raw `Retry-After` header value, if the provider sent one
    pub retry_after: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> Option<String> {
        let text = String::from_utf8_lossy(&self.body).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

/// Performs a single HTTP GET. Retry, caching and dedupe live in
/// [`FetchGateway`].
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

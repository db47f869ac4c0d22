//! Backoff schedule for rate-limited and failing upstreams.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Retries after the first attempt when the provider answers 429.
pub const DEFAULT_RATE_LIMIT_RETRIES: u32 = 4;
/// Retries after the first attempt when the provider answers 5xx.
pub const DEFAULT_SERVER_ERROR_RETRIES: u32 = 3;
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_RATE_LIMIT_CAP_MS: u64 = 8000;
pub const DEFAULT_SERVER_ERROR_CAP_MS: u64 = 4000;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub rate_limit_retries: u32,
    pub server_error_retries: u32,
    pub base_backoff: Duration,
    pub rate_limit_cap: Duration,
    pub server_error_cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limit_retries: DEFAULT_RATE_LIMIT_RETRIES,
            server_error_retries: DEFAULT_SERVER_ERROR_RETRIES,
            base_backoff: Duration::from_millis(DEFAULT_BASE_BACKOFF_MS),
            rate_limit_cap: Duration::from_millis(DEFAULT_RATE_LIMIT_CAP_MS),
            server_error_cap: Duration::from_millis(DEFAULT_SERVER_ERROR_CAP_MS),
        }
    }
}

impl RetryPolicy {
    /// `min(base * 2^attempt, 8s)`, used when no Retry-After hint is given.
    pub fn rate_limit_backoff(&self, attempt: u32) -> Duration {
        exponential(self.base_backoff, attempt, self.rate_limit_cap)
    }

    /// `min(base * 2^attempt, 4s)`
    pub fn server_error_backoff(&self, attempt: u32) -> Duration {
        exponential(self.base_backoff, attempt, self.server_error_cap)
    }
}

fn exponential(base: Duration, attempt: u32, cap: Duration) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(cap).min(cap)
}

/// Parse a `Retry-After` header: delay in whole seconds, or an HTTP date.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

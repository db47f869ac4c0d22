//! Single chokepoint for outbound JSON reads.
//!
//! Every read goes through [`FetchGateway::request`], which in order:
//! 1. serves a fresh cached body (TTL, checked on read),
//! 2. joins an identical request that is already in flight,
//! 3. otherwise performs the call, retrying 429 and 5xx answers with backoff.
//!
//! The network work runs in a spawned task so it always settles and clears
//! its in-flight marker, even if every caller stops waiting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::fetcher::clock::{Clock, SystemClock};
use crate::fetcher::retry::{parse_retry_after, RetryPolicy};
use crate::fetcher::{FetchError, FetchResponse, Fetcher};

/// Default freshness window for cached responses (2 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(120);

type FetchOutcome = Result<Arc<Value>, FetchError>;
type PendingFetch = Shared<BoxFuture<'static, FetchOutcome>>;

#[derive(Debug, Clone)]
struct CachedEntry {
    value: Arc<Value>,
    stored_at: DateTime<Utc>,
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Abandons the underlying call when cancelled. Nothing is cached and the
    /// in-flight marker is removed; waiters see [`FetchError::Aborted`].
    pub abort: Option<CancellationToken>,
}

struct GatewayInner {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedEntry>>,
    in_flight: Mutex<HashMap<String, PendingFetch>>,
}

#[derive(Clone)]
pub struct FetchGateway {
    inner: Arc<GatewayInner>,
}

impl FetchGateway {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_clock(fetcher, Arc::new(SystemClock))
    }

    pub fn with_clock(fetcher: Arc<dyn Fetcher + Send + Sync>, clock: Arc<dyn Clock>) -> Self {
        Self::with_settings(fetcher, clock, RetryPolicy::default(), DEFAULT_CACHE_TTL)
    }

    pub fn with_settings(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
        ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                fetcher,
                clock,
                policy,
                ttl,
                cache: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.inner.clock.clone()
    }

    pub async fn request(&self, url: &str) -> FetchOutcome {
        self.request_with(url, RequestOptions::default()).await
    }

    pub async fn request_with(&self, url: &str, options: RequestOptions) -> FetchOutcome {
        if let Some(value) = self.inner.cached(url) {
            return Ok(value);
        }

        let pending = {
            let mut in_flight = self.inner.lock_in_flight();

            // A request may have settled between the cache check and taking the lock
            if let Some(value) = self.inner.cached(url) {
                return Ok(value);
            }

            match in_flight.get(url) {
                Some(pending) => {
                    debug!("Joining in-flight request for {}", url);
                    pending.clone()
                }
                None => {
                    let pending = self.spawn_request(url.to_string(), options);
                    in_flight.insert(url.to_string(), pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Number of requests currently awaiting the network.
    pub fn pending_requests(&self) -> usize {
        self.inner.lock_in_flight().len()
    }

    /// Number of cached bodies, fresh or not yet evicted.
    pub fn cached_entries(&self) -> usize {
        self.inner.lock_cache().len()
    }

    // Called with the in-flight lock held; the task cannot clear its marker
    // before the caller has inserted it.
    fn spawn_request(&self, url: String, options: RequestOptions) -> PendingFetch {
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            let result = inner.fetch_with_retry(&url, options.abort.as_ref()).await;
            if let Ok(value) = &result {
                inner.store(&url, value.clone());
            }
            inner.lock_in_flight().remove(&url);
            result
        });

        async move {
            handle.await.unwrap_or_else(|e| {
                error!("Fetch task join error: {}", e);
                Err(FetchError::Transport(format!("request task failed: {}", e)))
            })
        }
        .boxed()
        .shared()
    }
}

impl GatewayInner {
    fn lock_cache(&self) -> MutexGuard<'_, HashMap<String, CachedEntry>> {
        self.cache.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<String, PendingFetch>> {
        self.in_flight.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn cached(&self, url: &str) -> Option<Arc<Value>> {
        let mut cache = self.lock_cache();
        let entry = cache.get(url)?;

        let age = self.clock.now().signed_duration_since(entry.stored_at);
        // A negative age means the clock went backwards; keep the entry
        let expired = age.to_std().map(|age| age > self.ttl).unwrap_or(false);
        if !expired {
            debug!("Response cache HIT for {}", url);
            return Some(entry.value.clone());
        }

        debug!("Response cache entry expired for {}", url);
        cache.remove(url);
        None
    }

    fn store(&self, url: &str, value: Arc<Value>) {
        let stored_at = self.clock.now();
        self.lock_cache()
            .insert(url.to_string(), CachedEntry { value, stored_at });
    }

    async fn fetch_with_retry(
        &self,
        url: &str,
        abort: Option<&CancellationToken>,
    ) -> FetchOutcome {
        let mut attempt: u32 = 0;

        loop {
            let response = self.send(url, abort).await?;

            if response.status == 429 {
                if attempt >= self.policy.rate_limit_retries {
                    warn!("Rate limited on {} after {} attempts", url, attempt + 1);
                    return Err(FetchError::RateLimited {
                        attempts: attempt + 1,
                    });
                }
                let wait = response
                    .retry_after
                    .as_deref()
                    .and_then(|v| parse_retry_after(v, self.clock.now()))
                    .unwrap_or_else(|| self.policy.rate_limit_backoff(attempt));
                warn!(
                    "HTTP 429 for {} (attempt {}), retrying in {}ms",
                    url,
                    attempt + 1,
                    wait.as_millis()
                );
                self.pause(wait, abort).await?;
                attempt += 1;
                continue;
            }

            if (500..600).contains(&response.status) {
                if attempt < self.policy.server_error_retries {
                    let wait = self.policy.server_error_backoff(attempt);
                    warn!(
                        "HTTP {} for {} (attempt {}), retrying in {}ms",
                        response.status,
                        url,
                        attempt + 1,
                        wait.as_millis()
                    );
                    self.pause(wait, abort).await?;
                    attempt += 1;
                    continue;
                }
                return Err(upstream(&response));
            }

            if !response.is_success() {
                warn!("HTTP {} for {}", response.status, url);
                return Err(upstream(&response));
            }

            let value: Value = serde_json::from_slice(&response.body)
                .map_err(|e| FetchError::Malformed(e.to_string()))?;
            return Ok(Arc::new(value));
        }
    }

    async fn send(
        &self,
        url: &str,
        abort: Option<&CancellationToken>,
    ) -> Result<FetchResponse, FetchError> {
        match abort {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Request for {} aborted", url);
                    Err(FetchError::Aborted)
                }
                result = self.fetcher.fetch(url) => result,
            },
            None => self.fetcher.fetch(url).await,
        }
    }

    async fn pause(
        &self,
        duration: Duration,
        abort: Option<&CancellationToken>,
    ) -> Result<(), FetchError> {
        match abort {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(FetchError::Aborted),
                _ = self.clock.sleep(duration) => Ok(()),
            },
            None => {
                self.clock.sleep(duration).await;
                Ok(())
            }
        }
    }
}

fn upstream(response: &FetchResponse) -> FetchError {
    FetchError::Upstream {
        status: response.status,
        body: response.body_text(),
    }
}

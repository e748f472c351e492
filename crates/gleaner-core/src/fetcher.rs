//! The retrying fetcher: one logical "get resource" operation.
//!
//! One instance is bound to one source. A fetch consults the cache, then
//! runs up to `max_attempts` sequential network attempts, each gated by the
//! source's circuit breaker, paced, routed through a rotating proxy
//! endpoint, and classified into success / transient / permanent / blocked.
//! Attempts for the same URL are never parallelized; spreading them out is
//! the point.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::blocking::BlockSignatures;
use crate::cache::CacheStore;
use crate::circuit_breaker::CircuitBreaker;
use crate::config::RetrievalConfig;
use crate::error::FetchError;
use crate::headers::browser_headers;
use crate::http_client::{HttpClient, HttpRequest};
use crate::metrics::MetricsCollector;
use crate::pacing::Pacer;
use crate::proxy::ProxyPool;
use crate::retry::{BackoffClass, RetryConfig};
use crate::source::SourceId;

/// Classified outcome of a single transport attempt.
enum AttemptOutcome {
    /// Usable body.
    Success(String),
    /// 404: retrying is pointless.
    NotFound,
    /// Worth another attempt after a backoff.
    Transient { reason: String, class: BackoffClass },
}

/// Resilient single-URL fetcher for one source.
///
/// CacheStore and ProxyPool are shared across sources; the circuit breaker
/// and metrics collector are owned here, per source.
pub struct RetryingFetcher {
    source: SourceId,
    transport: Arc<dyn HttpClient>,
    cache: CacheStore,
    proxies: ProxyPool,
    breaker: CircuitBreaker,
    metrics: MetricsCollector,
    retry: RetryConfig,
    signatures: BlockSignatures,
    pacer: Pacer,
    request_timeout: std::time::Duration,
}

impl RetryingFetcher {
    pub fn new(
        source: SourceId,
        transport: Arc<dyn HttpClient>,
        cache: CacheStore,
        proxies: ProxyPool,
        config: &RetrievalConfig,
    ) -> Self {
        let signatures = match &config.block_indicators {
            Some(indicators) => BlockSignatures::with_indicators(indicators.clone()),
            None => BlockSignatures::default(),
        };

        Self {
            source,
            transport,
            cache,
            proxies,
            breaker: CircuitBreaker::new(config.breaker),
            metrics: MetricsCollector::new(),
            retry: config.retry.clone(),
            signatures,
            pacer: Pacer::new(config.request_delay),
            request_timeout: config.request_timeout,
        }
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Fetch one URL, retrying transient failures with backoff.
    ///
    /// A cached body is returned immediately without touching the network,
    /// the proxy pool, or the circuit breaker. An open circuit aborts the
    /// whole call; a 404 aborts the retry loop. Exhausting the attempt
    /// budget is a recoverable "source unavailable" error, never fatal.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Some(body) = self.cache.get(url).await {
            self.metrics.record_cache_hit();
            debug!(source = %self.source, url, "serving cached body");
            return Ok(body);
        }

        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::from("no attempts made");

        for attempt in 1..=max_attempts {
            if !self.breaker.allow_request() {
                let retry_in = self.breaker.retry_in().unwrap_or_default();
                info!(source = %self.source, url, ?retry_in, "circuit open, failing fast");
                return Err(FetchError::CircuitOpen {
                    source_id: self.source.clone(),
                    retry_in,
                });
            }

            self.pacer.wait().await;

            let endpoint = self.proxies.next_endpoint();
            let started = Instant::now();
            debug!(
                source = %self.source,
                url,
                attempt,
                max_attempts,
                proxy = endpoint.as_deref().unwrap_or("direct"),
                "attempting fetch"
            );

            match self.attempt(url, endpoint.as_deref()).await {
                AttemptOutcome::Success(body) => {
                    self.cache.set(url, &body).await;
                    if let Some(endpoint) = &endpoint {
                        self.proxies.mark_success(endpoint);
                    }
                    self.breaker.record_success();
                    self.metrics.record_success(started.elapsed());
                    info!(source = %self.source, url, attempt, "fetch succeeded");
                    return Ok(body);
                }
                AttemptOutcome::NotFound => {
                    self.metrics.record_failure();
                    info!(source = %self.source, url, "resource not found, not retrying");
                    return Err(FetchError::PermanentFailure {
                        url: url.to_owned(),
                    });
                }
                AttemptOutcome::Transient { reason, class } => {
                    if let Some(endpoint) = &endpoint {
                        self.proxies.mark_failed(endpoint);
                        self.metrics.record_proxy_failure();
                    }
                    self.breaker.record_failure();
                    warn!(
                        source = %self.source,
                        url,
                        attempt,
                        max_attempts,
                        reason,
                        "attempt failed"
                    );
                    last_error = reason;

                    // Delay before the next attempt, never after the last one.
                    if attempt < max_attempts {
                        self.metrics.record_retry();
                        let delay = self.retry.delay_for(attempt - 1, class);
                        debug!(
                            source = %self.source,
                            url,
                            delay_ms = delay.as_millis() as u64,
                            "backing off before retry"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        self.metrics.record_failure();
        warn!(source = %self.source, url, max_attempts, "attempt budget exhausted");
        Err(FetchError::ExhaustedRetries {
            url: url.to_owned(),
            attempts: max_attempts,
            last_error,
        })
    }

    async fn attempt(&self, url: &str, proxy: Option<&str>) -> AttemptOutcome {
        let request = HttpRequest::get(url)
            .with_headers(browser_headers())
            .with_timeout(self.request_timeout)
            .with_proxy(proxy.map(str::to_owned));

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(error) => {
                return AttemptOutcome::Transient {
                    reason: error.to_string(),
                    class: BackoffClass::Standard,
                };
            }
        };

        if response.is_success() {
            // Anti-bot systems answer 200 with a challenge page; trust the
            // body, not the status.
            if let Some(indicator) = self.signatures.matched_indicator(&response.body) {
                warn!(source = %self.source, url, indicator, "block page behind 200");
                return AttemptOutcome::Transient {
                    reason: format!("block page detected ({indicator})"),
                    class: BackoffClass::Extended,
                };
            }
            return AttemptOutcome::Success(response.body);
        }

        match response.status {
            403 | 429 => AttemptOutcome::Transient {
                reason: format!("status {}", response.status),
                class: BackoffClass::Standard,
            },
            404 => AttemptOutcome::NotFound,
            status => AttemptOutcome::Transient {
                reason: format!("unexpected status {status}"),
                class: BackoffClass::Short,
            },
        }
    }
}

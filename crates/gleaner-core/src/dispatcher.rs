//! Concurrent fan-out over sources.
//!
//! One worker per source, all independent: a worker that errors or panics
//! is logged and becomes a failure marker in the result set, and can never
//! abort a sibling or the batch. The batch waits for natural completion;
//! per-request timeouts inside the fetcher are the only deadlines.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::cache::CacheStore;
use crate::config::RetrievalConfig;
use crate::fetcher::RetryingFetcher;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::metrics::MetricsSummary;
use crate::proxy::ProxyPool;
use crate::source::{Source, SourceId};

/// Error descriptor for a source whose worker produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub message: String,
}

impl Display for SourceFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Per-source result collected at the fan-in boundary. Never an Err across
/// that boundary: failures are data.
#[derive(Debug, Clone)]
pub struct SourceFetchOutcome {
    pub source: SourceId,
    pub result: Result<Vec<String>, SourceFailure>,
    pub metrics: MetricsSummary,
}

impl SourceFetchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn bodies(&self) -> &[String] {
        match &self.result {
            Ok(bodies) => bodies,
            Err(_) => &[],
        }
    }
}

/// Fans a batch of per-source fetch jobs out to concurrent workers and
/// collects the partial results.
///
/// The cache, proxy pool, and transport are shared across workers; each
/// worker gets its own fetcher (and with it a fresh circuit breaker and
/// metrics collector).
pub struct ConcurrentDispatcher {
    transport: Arc<dyn HttpClient>,
    cache: CacheStore,
    proxies: ProxyPool,
    config: RetrievalConfig,
}

impl ConcurrentDispatcher {
    pub fn new(config: RetrievalConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestHttpClient::new()))
    }

    /// Dispatcher over a caller-supplied transport (browser-automation
    /// clients, test doubles).
    pub fn with_transport(config: RetrievalConfig, transport: Arc<dyn HttpClient>) -> Self {
        let cache = CacheStore::new(&config.cache_dir, config.cache_ttl);
        let proxies = ProxyPool::from_file(&config.proxy_file);
        Self {
            transport,
            cache,
            proxies,
            config,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn proxies(&self) -> &ProxyPool {
        &self.proxies
    }

    /// Run every source's scraping routine concurrently and collect the
    /// per-source outcomes, in no particular order.
    pub async fn dispatch_all(&self, sources: &[Arc<dyn Source>]) -> Vec<SourceFetchOutcome> {
        let mut tasks = JoinSet::new();
        let mut task_sources: HashMap<tokio::task::Id, SourceId> = HashMap::new();

        for source in sources {
            let source = Arc::clone(source);
            let source_id = source.id();
            let transport = Arc::clone(&self.transport);
            let cache = self.cache.clone();
            let proxies = self.proxies.clone();
            let config = self.config.clone();

            let handle = tasks
                .spawn(async move { scrape_source(source, transport, cache, proxies, &config).await });
            task_sources.insert(handle.id(), source_id);
        }

        let mut outcomes = Vec::with_capacity(sources.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => outcomes.push(outcome),
                Err(join_error) => {
                    let source = task_sources
                        .get(&join_error.id())
                        .cloned()
                        .unwrap_or_else(|| SourceId::new("unknown"));
                    error!(%source, %join_error, "source worker died");
                    outcomes.push(SourceFetchOutcome {
                        source,
                        result: Err(SourceFailure {
                            message: format!("worker failed: {join_error}"),
                        }),
                        metrics: MetricsSummary::default(),
                    });
                }
            }
        }

        info!(
            sources = sources.len(),
            succeeded = outcomes.iter().filter(|o| o.is_success()).count(),
            "dispatch batch complete"
        );
        outcomes
    }
}

/// Batch-level metrics merge for reporting.
pub fn merged_metrics(outcomes: &[SourceFetchOutcome]) -> MetricsSummary {
    MetricsSummary::merge(outcomes.iter().map(|outcome| outcome.metrics))
}

async fn scrape_source(
    source: Arc<dyn Source>,
    transport: Arc<dyn HttpClient>,
    cache: CacheStore,
    proxies: ProxyPool,
    config: &RetrievalConfig,
) -> SourceFetchOutcome {
    let id = source.id();
    let fetcher = RetryingFetcher::new(id.clone(), transport, cache, proxies, config);
    let urls = source.page_urls();
    info!(source = %id, pages = urls.len(), "scraping source");

    let mut bodies = Vec::new();
    let mut errors = Vec::new();
    for url in urls {
        match fetcher.fetch(&url).await {
            Ok(body) => bodies.push(body),
            Err(fetch_error) => {
                warn!(source = %id, url, %fetch_error, "page fetch failed");
                errors.push(fetch_error.to_string());
            }
        }
    }

    let metrics = fetcher.metrics().summary();
    let result = if bodies.is_empty() && !errors.is_empty() {
        Err(SourceFailure {
            message: errors.join("; "),
        })
    } else {
        Ok(bodies)
    };

    SourceFetchOutcome {
        source: id,
        result,
        metrics,
    }
}

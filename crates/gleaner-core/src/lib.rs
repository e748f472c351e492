//! # Gleaner Core
//!
//! Resilient retrieval core for the gleaner content-collection toolkit.
//!
//! ## Overview
//!
//! Gleaner pulls raw page bodies out of multiple independent, unreliable,
//! and actively hostile sites, and returns as much usable data as possible
//! despite rate-limiting, transient network errors, and intermittent
//! blocking. This crate is the part with the tradeoffs:
//!
//! - **TTL cache** of fetched bodies, one record file per URL
//! - **Rotating proxy pool** with per-endpoint failure tracking
//! - **Per-source circuit breaker** that fails fast on saturated sites
//! - **Retrying fetcher** with failure classification, exponential backoff
//!   with jitter, and block-page detection
//! - **Concurrent dispatcher** that fans out one worker per source and
//!   tolerates per-source failure
//! - **Metrics** counters with an EWMA of latency
//!
//! Content extraction and relevance filtering are external collaborators:
//! they consume the raw bodies this crate produces.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`blocking`] | Disguised block-page detection |
//! | [`cache`] | Disk-backed TTL cache of response bodies |
//! | [`circuit_breaker`] | Per-source circuit breaker |
//! | [`config`] | Retrieval configuration and env overrides |
//! | [`dispatcher`] | Concurrent per-source fan-out |
//! | [`error`] | Fetch error taxonomy |
//! | [`fetcher`] | The retrying fetcher |
//! | [`headers`] | Browser-grade request headers |
//! | [`http_client`] | Pluggable HTTP transport |
//! | [`metrics`] | Passive retrieval counters |
//! | [`pacing`] | Inter-request politeness gate |
//! | [`proxy`] | Rotating proxy pool |
//! | [`retry`] | Backoff policy |
//! | [`source`] | Source contract and identifiers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gleaner_core::{ConcurrentDispatcher, RetrievalConfig, Source, StaticSource};
//!
//! #[tokio::main]
//! async fn main() {
//!     let dispatcher = ConcurrentDispatcher::new(RetrievalConfig::from_env());
//!
//!     let sources: Vec<Arc<dyn Source>> = vec![Arc::new(StaticSource::new(
//!         "revolico",
//!         vec![String::from("https://www.revolico.com/empleos")],
//!     ))];
//!
//!     for outcome in dispatcher.dispatch_all(&sources).await {
//!         println!("{}: {} page(s)", outcome.source, outcome.bodies().len());
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ ConcurrentDispatcher │  one worker per source
//! └──────────┬───────────┘
//!            │ N parallel
//!            ▼
//! ┌──────────────────────┐     ┌─────────────────┐
//! │   RetryingFetcher    │────▶│ CircuitBreaker  │  per source
//! │  (per source)        │     ├─────────────────┤
//! │                      │────▶│ MetricsCollector│  per source
//! └──────────┬───────────┘     └─────────────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐     ┌─────────────────┐
//! │      CacheStore      │     │    ProxyPool    │  shared
//! └──────────────────────┘     └─────────────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │  HttpClient trait    │  reqwest / test double / browser client
//! └──────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Failures are recovered as close to their origin as possible: a failed
//! URL degrades to a retry, a failed source to an empty result, a failed
//! worker to a failure marker in the batch. Nothing here is a fatal
//! process-level error; the worst observable outcome is an empty result
//! set with non-zero failure counters.

pub mod blocking;
pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fetcher;
pub mod headers;
pub mod http_client;
pub mod metrics;
pub mod pacing;
pub mod proxy;
pub mod retry;
pub mod source;

// Re-export commonly used types at crate root for convenience

// Block-page detection
pub use blocking::BlockSignatures;

// Caching
pub use cache::{CacheStats, CacheStore};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Configuration
pub use config::RetrievalConfig;

// Dispatch
pub use dispatcher::{merged_metrics, ConcurrentDispatcher, SourceFailure, SourceFetchOutcome};

// Errors
pub use error::FetchError;

// Fetching
pub use fetcher::RetryingFetcher;

// HTTP transport
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};

// Metrics
pub use metrics::{MetricsCollector, MetricsSummary};

// Pacing
pub use pacing::Pacer;

// Proxies
pub use proxy::{ProxyPool, ProxyStats};

// Retry policy
pub use retry::{Backoff, BackoffClass, RetryConfig};

// Sources
pub use source::{Source, SourceId, StaticSource};

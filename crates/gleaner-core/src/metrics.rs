//! Passive retrieval counters.
//!
//! One collector per source; incremented by the fetcher, read by whoever
//! reports. Counting never blocks the fetch path and never fails. Counters
//! only reset on explicit [`MetricsCollector::reset`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Default)]
struct MetricsInner {
    total_requests: u64,
    successes: u64,
    failures: u64,
    cache_hits: u64,
    retries: u64,
    proxy_failures: u64,
    /// Exponentially-weighted moving average of response latency, seconds.
    avg_latency_secs: f64,
}

/// Read-only snapshot of a collector, plus derived rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub total_requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub cache_hits: u64,
    pub retries: u64,
    pub proxy_failures: u64,
    pub avg_latency_secs: f64,
    /// successes / total, as a percentage.
    pub success_rate: f64,
    /// cache hits / total, as a percentage.
    pub cache_hit_rate: f64,
}

impl MetricsSummary {
    /// Caller-side merge across per-source collectors, for batch reporting.
    /// Latency is averaged weighted by each source's success count.
    pub fn merge(summaries: impl IntoIterator<Item = MetricsSummary>) -> MetricsSummary {
        let mut merged = MetricsSummary::default();
        let mut weighted_latency = 0.0;

        for summary in summaries {
            merged.total_requests += summary.total_requests;
            merged.successes += summary.successes;
            merged.failures += summary.failures;
            merged.cache_hits += summary.cache_hits;
            merged.retries += summary.retries;
            merged.proxy_failures += summary.proxy_failures;
            weighted_latency += summary.avg_latency_secs * summary.successes as f64;
        }

        if merged.successes > 0 {
            merged.avg_latency_secs = weighted_latency / merged.successes as f64;
        }
        merged.success_rate = rate(merged.successes, merged.total_requests);
        merged.cache_hit_rate = rate(merged.cache_hits, merged.total_requests);
        merged
    }
}

/// Thread-safe counter set shared by clone.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsInner>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A completed fetch that produced a usable body.
    pub fn record_success(&self, latency: Duration) {
        let mut inner = self.inner.lock().expect("metrics lock is not poisoned");
        inner.total_requests += 1;
        inner.successes += 1;

        let sample = latency.as_secs_f64();
        if inner.avg_latency_secs == 0.0 {
            inner.avg_latency_secs = sample;
        } else {
            // 90% weight on history, 10% on the new sample
            inner.avg_latency_secs = inner.avg_latency_secs * 0.9 + sample * 0.1;
        }
    }

    /// A completed fetch that produced no body (permanent or exhausted).
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("metrics lock is not poisoned");
        inner.total_requests += 1;
        inner.failures += 1;
    }

    pub fn record_cache_hit(&self) {
        let mut inner = self.inner.lock().expect("metrics lock is not poisoned");
        inner.cache_hits += 1;
    }

    pub fn record_retry(&self) {
        let mut inner = self.inner.lock().expect("metrics lock is not poisoned");
        inner.retries += 1;
    }

    pub fn record_proxy_failure(&self) {
        let mut inner = self.inner.lock().expect("metrics lock is not poisoned");
        inner.proxy_failures += 1;
    }

    /// Explicit reset; nothing in the fetch path calls this.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("metrics lock is not poisoned");
        *inner = MetricsInner::default();
    }

    pub fn summary(&self) -> MetricsSummary {
        let inner = self.inner.lock().expect("metrics lock is not poisoned");
        MetricsSummary {
            total_requests: inner.total_requests,
            successes: inner.successes,
            failures: inner.failures,
            cache_hits: inner.cache_hits,
            retries: inner.retries,
            proxy_failures: inner.proxy_failures,
            avg_latency_secs: inner.avg_latency_secs,
            success_rate: rate(inner.successes, inner.total_requests),
            cache_hit_rate: rate(inner.cache_hits, inner.total_requests),
        }
    }
}

fn rate(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_failure_both_count_toward_total() {
        let metrics = MetricsCollector::new();

        metrics.record_success(Duration::from_millis(100));
        metrics.record_failure();

        let summary = metrics.summary();
        assert_eq!(summary.total_requests, 2);
        assert_eq!(summary.successes, 1);
        assert_eq!(summary.failures, 1);
        assert!((summary.success_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn latency_is_an_exponential_moving_average() {
        let metrics = MetricsCollector::new();

        metrics.record_success(Duration::from_secs(1));
        assert!((metrics.summary().avg_latency_secs - 1.0).abs() < 1e-9);

        metrics.record_success(Duration::from_secs(2));
        // 1.0 * 0.9 + 2.0 * 0.1
        assert!((metrics.summary().avg_latency_secs - 1.1).abs() < 1e-9);
    }

    #[test]
    fn cache_hits_do_not_inflate_total_requests() {
        let metrics = MetricsCollector::new();

        metrics.record_cache_hit();
        metrics.record_cache_hit();

        let summary = metrics.summary();
        assert_eq!(summary.cache_hits, 2);
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn reset_zeroes_every_counter() {
        let metrics = MetricsCollector::new();
        metrics.record_success(Duration::from_millis(10));
        metrics.record_retry();
        metrics.record_proxy_failure();

        metrics.reset();
        assert_eq!(metrics.summary(), MetricsSummary::default());
    }

    #[test]
    fn merge_sums_counters_across_collectors() {
        let a = MetricsCollector::new();
        let b = MetricsCollector::new();
        a.record_success(Duration::from_secs(1));
        a.record_retry();
        b.record_success(Duration::from_secs(3));
        b.record_failure();

        let merged = MetricsSummary::merge([a.summary(), b.summary()]);
        assert_eq!(merged.total_requests, 3);
        assert_eq!(merged.successes, 2);
        assert_eq!(merged.retries, 1);
        assert!((merged.avg_latency_secs - 2.0).abs() < 1e-9);
    }
}

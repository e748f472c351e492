//! Retrieval configuration.
//!
//! Hard defaults match the design values (2 h cache TTL, 30 s request
//! timeout, 2 s base request delay, 3 attempts, breaker 5/60 s); every knob
//! can be overridden through `GLEANER_*` environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheStore;
use crate::circuit_breaker::CircuitBreakerConfig;
use crate::retry::RetryConfig;

/// Knobs shared by every fetcher a dispatcher creates.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Directory for cache record files.
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
    /// Line-oriented proxy list; missing file means direct egress.
    pub proxy_file: PathBuf,
    /// Per-attempt network timeout.
    pub request_timeout: Duration,
    /// Minimum interval between requests of one source.
    pub request_delay: Duration,
    pub retry: RetryConfig,
    pub breaker: CircuitBreakerConfig,
    /// Override for the block-page indicator set; `None` keeps the built-ins.
    pub block_indicators: Option<Vec<String>>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            cache_ttl: CacheStore::DEFAULT_TTL,
            proxy_file: PathBuf::from("proxies.txt"),
            request_timeout: Duration::from_secs(30),
            request_delay: Duration::from_secs(2),
            retry: RetryConfig::default(),
            breaker: CircuitBreakerConfig::default(),
            block_indicators: None,
        }
    }
}

impl RetrievalConfig {
    /// Defaults overridden by `GLEANER_*` environment variables.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `GLEANER_CACHE_DIR` | cache directory |
    /// | `GLEANER_CACHE_TTL_HOURS` | cache TTL in hours |
    /// | `GLEANER_PROXY_FILE` | proxy list path |
    /// | `GLEANER_REQUEST_TIMEOUT_SECS` | per-attempt timeout |
    /// | `GLEANER_REQUEST_DELAY_SECS` | inter-request delay |
    /// | `GLEANER_MAX_RETRIES` | attempts per URL |
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("GLEANER_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(hours) = env_parse::<u64>("GLEANER_CACHE_TTL_HOURS") {
            config.cache_ttl = Duration::from_secs(hours * 60 * 60);
        }
        if let Ok(path) = env::var("GLEANER_PROXY_FILE") {
            config.proxy_file = PathBuf::from(path);
        }
        if let Some(secs) = env_parse::<u64>("GLEANER_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("GLEANER_REQUEST_DELAY_SECS") {
            config.request_delay = Duration::from_secs(secs);
        }
        if let Some(attempts) = env_parse::<u32>("GLEANER_MAX_RETRIES") {
            config.retry.max_attempts = attempts;
        }

        config
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_design_values() {
        let config = RetrievalConfig::default();

        assert_eq!(config.cache_ttl, Duration::from_secs(7200));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.request_delay, Duration::from_secs(2));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.breaker.failure_threshold, 5);
        assert_eq!(config.breaker.recovery_timeout, Duration::from_secs(60));
        assert!(config.block_indicators.is_none());
    }
}

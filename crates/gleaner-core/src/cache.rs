//! Disk-backed, TTL-based cache of fetched response bodies.
//!
//! One JSON record per cached URL, addressed by the SHA-256 of the URL as
//! the filename stem. An entry is valid while `now - stored_at <= ttl`;
//! expired entries are treated as absent and unlinked lazily on lookup.
//!
//! Storage errors never fail the caller: a write that cannot land simply
//! means the next `get` misses. Per-key atomicity falls out of the one
//! record = one file layout; no lock is held across I/O.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, warn};

/// Cache counters reported by [`CacheStore::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
}

/// On-disk record layout. The URL is kept truncated for reference only;
/// the filename stem is the authoritative key.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    timestamp: String,
    content: String,
    url: String,
}

/// Shared, TTL-based store of response bodies keyed by request URL.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: Arc<PathBuf>,
    ttl: Duration,
}

impl CacheStore {
    /// Design default TTL: two hours.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        let dir = dir.into();
        if let Err(error) = std::fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), %error, "could not create cache dir");
        }
        Self {
            dir: Arc::new(dir),
            ttl,
        }
    }

    /// Store rooted at `dir` with the default two-hour TTL.
    pub fn with_default_ttl(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, Self::DEFAULT_TTL)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached payload for `url`, if a non-expired entry exists.
    ///
    /// An expired entry found here is unlinked and reported absent. Read or
    /// parse errors also report absent, never an error.
    pub async fn get(&self, url: &str) -> Option<String> {
        let path = self.record_path(url);
        let raw = tokio::fs::read_to_string(&path).await.ok()?;

        let record: CacheRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(error) => {
                warn!(path = %path.display(), %error, "corrupt cache record, ignoring");
                return None;
            }
        };

        if !self.is_fresh(&record.timestamp) {
            debug!(url, "cache entry expired, evicting");
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }

        debug!(url, "cache hit");
        Some(record.content)
    }

    /// Persist `payload` under the key for `url`, overwriting any prior
    /// entry. Storage errors are logged and swallowed.
    pub async fn set(&self, url: &str, payload: &str) {
        let timestamp = match OffsetDateTime::now_utc().format(&Rfc3339) {
            Ok(timestamp) => timestamp,
            Err(error) => {
                warn!(%error, "could not format cache timestamp");
                return;
            }
        };

        let record = CacheRecord {
            timestamp,
            content: payload.to_owned(),
            url: url.chars().take(100).collect(),
        };

        let body = match serde_json::to_string_pretty(&record) {
            Ok(body) => body,
            Err(error) => {
                warn!(url, %error, "could not serialize cache record");
                return;
            }
        };

        let path = self.record_path(url);
        if let Err(error) = tokio::fs::write(&path, body).await {
            warn!(path = %path.display(), %error, "could not write cache record");
        }
    }

    /// Remove every entry. Maintenance only; the fetch path never calls it.
    pub async fn clear(&self) {
        for path in self.record_files().await {
            if let Err(error) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), %error, "could not remove cache record");
            }
        }
    }

    /// Scan all entries and report validity at call time.
    pub async fn stats(&self) -> CacheStats {
        let mut valid = 0;
        let mut expired = 0;

        let files = self.record_files().await;
        for path in &files {
            let fresh = match tokio::fs::read_to_string(path).await {
                Ok(raw) => serde_json::from_str::<CacheRecord>(&raw)
                    .map(|record| self.is_fresh(&record.timestamp))
                    .unwrap_or(false),
                Err(_) => false,
            };

            if fresh {
                valid += 1;
            } else {
                expired += 1;
            }
        }

        CacheStats {
            total: files.len(),
            valid,
            expired,
        }
    }

    fn is_fresh(&self, timestamp: &str) -> bool {
        let Ok(stored_at) = OffsetDateTime::parse(timestamp, &Rfc3339) else {
            return false;
        };
        let ttl = time::Duration::try_from(self.ttl).unwrap_or(time::Duration::MAX);
        OffsetDateTime::now_utc() - stored_at <= ttl
    }

    fn record_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.dir.join(format!("{digest:x}.json"))
    }

    async fn record_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(self.dir.as_path()).await else {
            return files;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files
    }
}

impl AsRef<Path> for CacheStore {
    fn as_ref(&self) -> &Path {
        self.dir.as_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(ttl: Duration) -> (tempfile::TempDir, CacheStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = CacheStore::new(dir.path(), ttl);
        (dir, store)
    }

    #[tokio::test]
    async fn set_then_get_within_ttl_returns_payload() {
        let (_dir, cache) = store(Duration::from_secs(60));

        assert!(cache.get("https://example.test/a").await.is_none());

        cache.set("https://example.test/a", "<html>a</html>").await;
        assert_eq!(
            cache.get("https://example.test/a").await.as_deref(),
            Some("<html>a</html>")
        );

        // Overwrite
        cache.set("https://example.test/a", "<html>b</html>").await;
        assert_eq!(
            cache.get("https://example.test/a").await.as_deref(),
            Some("<html>b</html>")
        );
    }

    #[tokio::test]
    async fn expired_entry_is_absent_and_evicted() {
        let (_dir, cache) = store(Duration::from_millis(50));

        cache.set("https://example.test/a", "payload").await;
        assert!(cache.get("https://example.test/a").await.is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(cache.get("https://example.test/a").await.is_none());
        // Lazy eviction removed the record file entirely.
        let stats = cache.stats().await;
        assert_eq!(stats.total, 0);
        assert_eq!(stats.valid, 0);
    }

    #[tokio::test]
    async fn stats_partition_valid_and_expired() {
        let (_dir, cache) = store(Duration::from_millis(50));

        cache.set("https://example.test/old", "stale").await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        cache.set("https://example.test/new", "fresh").await;

        let stats = cache.stats().await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.expired, 1);
    }

    #[tokio::test]
    async fn corrupt_record_is_treated_as_absent() {
        let (dir, cache) = store(Duration::from_secs(60));

        cache.set("https://example.test/a", "payload").await;
        let files: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read dir")
            .map(|e| e.expect("entry").path())
            .collect();
        assert_eq!(files.len(), 1);
        std::fs::write(&files[0], "{not json").expect("write");

        assert!(cache.get("https://example.test/a").await.is_none());
        assert_eq!(cache.stats().await.expired, 1);
    }

    #[tokio::test]
    async fn clear_removes_all_entries() {
        let (_dir, cache) = store(Duration::from_secs(60));

        cache.set("https://example.test/a", "a").await;
        cache.set("https://example.test/b", "b").await;
        assert_eq!(cache.stats().await.total, 2);

        cache.clear().await;
        assert_eq!(cache.stats().await.total, 0);
    }

    #[tokio::test]
    async fn keys_are_stable_across_store_instances() {
        let dir = tempfile::tempdir().expect("temp dir");
        let first = CacheStore::new(dir.path(), Duration::from_secs(60));
        let second = CacheStore::new(dir.path(), Duration::from_secs(60));

        first.set("https://example.test/a", "payload").await;
        assert_eq!(
            second.get("https://example.test/a").await.as_deref(),
            Some("payload")
        );
    }
}

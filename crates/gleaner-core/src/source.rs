use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Identifier for one upstream origin (site) content is retrieved from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Contract for one scrapeable site: a name plus the page/category URLs
/// its raw bodies are produced from.
///
/// Variants differ only in where the URL list comes from; the retry, cache,
/// and circuit logic upstream of this trait is never forked per source.
pub trait Source: Send + Sync {
    /// Unique source identifier, used for per-source breaker and metrics.
    fn id(&self) -> SourceId;

    /// Page/category URLs to fetch for this source, in fetch order.
    fn page_urls(&self) -> Vec<String>;
}

/// Configuration-driven source: a fixed name and URL list.
#[derive(Debug, Clone)]
pub struct StaticSource {
    id: SourceId,
    urls: Vec<String>,
}

impl StaticSource {
    pub fn new(id: impl Into<SourceId>, urls: Vec<String>) -> Self {
        Self {
            id: id.into(),
            urls,
        }
    }
}

impl Source for StaticSource {
    fn id(&self) -> SourceId {
        self.id.clone()
    }

    fn page_urls(&self) -> Vec<String> {
        self.urls.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_source_reports_id_and_urls() {
        let source = StaticSource::new(
            "revolico",
            vec![String::from("https://example.test/jobs")],
        );

        assert_eq!(source.id().as_str(), "revolico");
        assert_eq!(source.page_urls().len(), 1);
    }
}

//! Detection of disguised block pages.
//!
//! Anti-bot systems frequently answer HTTP 200 with a challenge page, so a
//! successful status alone does not mean usable content. Detection is a
//! substring match against a small known-indicator set. Best-effort: an
//! empty match means "probably fine", never a guarantee.

/// Known markers of CAPTCHA/WAF interstitials.
const DEFAULT_INDICATORS: [&str; 9] = [
    "captcha",
    "cloudflare",
    "access denied",
    "forbidden",
    "ddos protection",
    "incapsula",
    "sucuri",
    "blocked",
    "security check",
];

/// Case-insensitive block-page matcher over a configurable indicator set.
#[derive(Debug, Clone)]
pub struct BlockSignatures {
    indicators: Vec<String>,
}

impl Default for BlockSignatures {
    fn default() -> Self {
        Self {
            indicators: DEFAULT_INDICATORS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl BlockSignatures {
    /// Replace the built-in indicator set.
    pub fn with_indicators(indicators: Vec<String>) -> Self {
        Self {
            indicators: indicators
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect(),
        }
    }

    /// First indicator found in `body`, if any.
    pub fn matched_indicator(&self, body: &str) -> Option<&str> {
        let lowered = body.to_lowercase();
        self.indicators
            .iter()
            .find(|indicator| lowered.contains(indicator.as_str()))
            .map(String::as_str)
    }

    pub fn is_blocked(&self, body: &str) -> bool {
        self.matched_indicator(body).is_some()
    }
}

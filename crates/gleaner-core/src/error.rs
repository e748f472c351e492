use std::time::Duration;

use thiserror::Error;

use crate::source::SourceId;

/// Errors surfaced by a single logical fetch.
///
/// Every variant is recoverable from the caller's point of view: a failed
/// fetch degrades to an empty result for that URL, never to a process error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The source's circuit breaker is open; no network attempt was made
    /// and the fetch is not retried.
    #[error("circuit open for source '{source_id}', retry in {retry_in:?}")]
    CircuitOpen {
        source_id: SourceId,
        retry_in: Duration,
    },

    /// The resource does not exist upstream; retrying is pointless.
    #[error("resource not found (404): {url}")]
    PermanentFailure { url: String },

    /// The attempt budget was spent without a usable response.
    #[error("'{url}' unavailable after {attempts} attempt(s): {last_error}")]
    ExhaustedRetries {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

impl FetchError {
    /// Whether a later fetch of the same URL could plausibly succeed.
    pub const fn retryable_later(&self) -> bool {
        !matches!(self, Self::PermanentFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_failure_is_not_retryable_later() {
        let error = FetchError::PermanentFailure {
            url: String::from("https://example.test/gone"),
        };
        assert!(!error.retryable_later());
    }

    #[test]
    fn exhausted_retries_is_retryable_later() {
        let error = FetchError::ExhaustedRetries {
            url: String::from("https://example.test/jobs"),
            attempts: 3,
            last_error: String::from("request timeout"),
        };
        assert!(error.retryable_later());
    }
}

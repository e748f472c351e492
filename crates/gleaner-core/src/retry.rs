//! Retry policy with exponential backoff and jitter.

use std::time::Duration;

/// Backoff strategy applied between attempts of the same URL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Fixed delay between attempts.
    Fixed {
        /// Delay between attempts.
        delay: Duration,
    },
    /// Exponential delay, calculated as `base * (factor ^ attempt)`.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent attempt.
        factor: f64,
        /// The maximum delay between attempts.
        max: Duration,
        /// Whether to apply random jitter (+/- 50%) to the delay.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_secs(2),
            factor: 2.0,
            max: Duration::from_secs(60),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay for a given attempt number (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(attempt as i32);
                let seconds = base.as_secs_f64() * scale;
                let capped_seconds = seconds.min(max.as_secs_f64());

                let mut delay = Duration::from_secs_f64(capped_seconds);

                // Apply jitter: +/- 50% of the delay
                if jitter {
                    let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
                    let random_offset = fastrand::u64(0..=(jitter_ms * 2));
                    let total_ms =
                        delay.as_millis() as i64 + (random_offset as i64 - jitter_ms as i64);
                    delay = Duration::from_millis(total_ms.max(0) as u64);
                }

                delay
            }
        }
    }
}

/// How the backoff for a failed attempt is scaled, per failure class.
///
/// A detected block page gets an extended cooldown; an unclassified status
/// gets a shorter one than the 403/429/timeout path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffClass {
    Standard,
    Extended,
    Short,
}

/// Attempt budget and backoff policy for one fetcher.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts per URL, including the first.
    pub max_attempts: u32,
    /// The backoff strategy between attempts.
    pub backoff: Backoff,
    /// Multiplier applied to the delay after a detected block page.
    pub blocked_cooldown_factor: f64,
    /// Multiplier applied to the delay after an unclassified status.
    pub short_backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
            blocked_cooldown_factor: 3.0,
            short_backoff_factor: 0.5,
        }
    }
}

impl RetryConfig {
    /// Exponential backoff with the given total attempt budget.
    pub fn exponential(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Fixed backoff with the given total attempt budget.
    pub fn fixed(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    /// One attempt, no retries.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before the attempt following `attempt` (0-based), scaled by
    /// the failure class of the attempt that just failed.
    pub fn delay_for(&self, attempt: u32, class: BackoffClass) -> Duration {
        let base = self.backoff.delay(attempt);
        match class {
            BackoffClass::Standard => base,
            BackoffClass::Extended => base.mul_f64(self.blocked_cooldown_factor),
            BackoffClass::Short => base.mul_f64(self.short_backoff_factor),
        }
    }
}

//! Retry policy for queued tasks.
//!
//! A task that fails with a retryable error is run again after the delay
//! its [`RetryPolicy`] gives for that attempt, until the policy runs out.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tileseeder::executor::RetryPolicy;
//!
//! let policy = RetryPolicy::fixed(3, Duration::from_secs(5));
//! assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_secs(5)));
//! assert_eq!(policy.delay_for_attempt(3), None);
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Attempts for a backend fetch: the first try plus five retries.
pub const DEFAULT_FETCH_ATTEMPTS: u32 = 6;

/// Countdown between backend fetch retries.
pub const DEFAULT_FETCH_DELAY_SECS: u64 = 5;

/// Default maximum delay for exponential backoff (60 seconds).
pub const DEFAULT_MAX_DELAY_SECS: u64 = 60;

/// Default multiplier for exponential backoff.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// How the delay between retries evolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Backoff {
    /// The same delay before every retry.
    #[default]
    Fixed,
    /// The delay doubles after each retry, up to [`DEFAULT_MAX_DELAY_SECS`].
    Exponential,
}

impl FromStr for Backoff {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "exponential" => Ok(Self::Exponential),
            other => Err(format!("unknown backoff '{}'", other)),
        }
    }
}

impl fmt::Display for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Exponential => write!(f, "exponential"),
        }
    }
}

/// How a task handles retryable failures.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum RetryPolicy {
    /// Fail on the first error.
    #[default]
    None,

    /// Constant delay between attempts.
    Fixed {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        delay: Duration,
    },

    /// Delay multiplied after each failure, capped at `max_delay`.
    ExponentialBackoff {
        /// Maximum number of attempts (including the initial attempt).
        max_attempts: u32,
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    },
}

impl RetryPolicy {
    /// The policy backend fetch tasks use unless configured otherwise.
    pub fn fetch_default() -> Self {
        Self::fixed(
            DEFAULT_FETCH_ATTEMPTS,
            Duration::from_secs(DEFAULT_FETCH_DELAY_SECS),
        )
    }

    /// Builds the fetch policy from a retry count (not counting the first
    /// attempt), the delay before the first retry and the backoff mode.
    pub fn from_retries(max_retries: u32, delay: Duration, backoff: Backoff) -> Self {
        if max_retries == 0 {
            return Self::None;
        }
        let max_attempts = max_retries.saturating_add(1);
        match backoff {
            Backoff::Fixed => Self::fixed(max_attempts, delay),
            Backoff::Exponential => Self::exponential(max_attempts, delay),
        }
    }

    /// Doubling delays starting at `initial_delay`, capped at
    /// [`DEFAULT_MAX_DELAY_SECS`] or `initial_delay` if that is larger.
    pub fn exponential(max_attempts: u32, initial_delay: Duration) -> Self {
        Self::ExponentialBackoff {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS).max(initial_delay),
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::Fixed {
            max_attempts,
            delay,
        }
    }

    /// Delay before retrying after failed attempt number `attempt`
    /// (1-based), or `None` once the attempts are used up.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fixed {
                max_attempts,
                delay,
            } => (attempt < *max_attempts).then_some(*delay),
            Self::ExponentialBackoff {
                max_attempts,
                initial_delay,
                max_delay,
                multiplier,
            } => {
                if attempt >= *max_attempts {
                    return None;
                }
                let factor = multiplier.powi(attempt.saturating_sub(1) as i32);
                let delay_ms = (initial_delay.as_millis() as f64 * factor)
                    .min(max_delay.as_millis() as f64);
                Some(Duration::from_millis(delay_ms as u64).min(*max_delay))
            }
        }
    }

    /// Maximum number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::Fixed { max_attempts, .. } => *max_attempts,
            Self::ExponentialBackoff { max_attempts, .. } => *max_attempts,
        }
    }
}

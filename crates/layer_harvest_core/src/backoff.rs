use std::num::NonZeroU32;
use std::time::Duration;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(60);

/// Retry ceiling for a single chunk. With neither limit set the chunk is
/// retried until it succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    /// Total attempts including the first request.
    pub max_attempts: Option<NonZeroU32>,
    /// Time budget for one chunk, measured from its first request.
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_attempts: None,
            max_elapsed: None,
        }
    }
}

impl RetryPolicy {
    pub fn unbounded(base_delay: Duration) -> Self {
        Self {
            base_delay,
            ..Self::default()
        }
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.base_delay)
    }

    /// Record one more failed attempt and decide whether to try again.
    ///
    /// `elapsed` is the time spent on the chunk so far.
    pub fn on_failure(&self, backoff: &mut Backoff, elapsed: Duration) -> RetryDecision {
        let attempts = backoff.record_failure();
        if let Some(max) = self.max_attempts {
            if attempts >= max.get() {
                return RetryDecision::GiveUp { attempts };
            }
        }
        let delay = backoff.next_delay();
        if let Some(budget) = self.max_elapsed {
            if elapsed.saturating_add(delay) > budget {
                return RetryDecision::GiveUp { attempts };
            }
        }
        backoff.advance();
        RetryDecision::RetryAfter { delay, attempts }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter { delay: Duration, attempts: u32 },
    GiveUp { attempts: u32 },
}

/// Doubling delay, one per consecutive failure; never capped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    next: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(base_delay: Duration) -> Self {
        Self {
            next: base_delay,
            failures: 0,
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn next_delay(&self) -> Duration {
        self.next
    }

    fn record_failure(&mut self) -> u32 {
        self.failures = self.failures.saturating_add(1);
        self.failures
    }

    fn advance(&mut self) {
        self.next = self.next.saturating_mul(2);
    }
}

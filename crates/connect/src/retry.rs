//! Bounded retry with a distinguished "soft" failure that never counts
//! towards the ceiling.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive hard failures that end automatic retrying.
    pub max_failures: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_failures: u32, delay: Duration) -> Self {
        Self {
            max_failures,
            delay,
        }
    }

    /// Policy expressed as "retry this many times after the first failure".
    pub const fn with_retries(retries: u32, delay: Duration) -> Self {
        Self::new(retries.saturating_add(1), delay)
    }

    pub const fn max_retries(&self) -> u32 {
        self.max_failures.saturating_sub(1)
    }
}

/// How a single attempt went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Transient condition; retry without counting it.
    Soft,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    Done,
    RetryAfter(Duration),
    /// Ceiling reached. The counter has already been reset so a manual
    /// retry starts fresh.
    Exhausted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    failures: u32,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn record(&mut self, outcome: Outcome, policy: &RetryPolicy) -> RetryStep {
        match outcome {
            Outcome::Success => {
                self.failures = 0;
                RetryStep::Done
            }
            Outcome::Soft => RetryStep::RetryAfter(policy.delay),
            Outcome::Hard => {
                self.failures += 1;
                if self.failures < policy.max_failures {
                    RetryStep::RetryAfter(policy.delay)
                } else {
                    self.failures = 0;
                    RetryStep::Exhausted
                }
            }
        }
    }
}

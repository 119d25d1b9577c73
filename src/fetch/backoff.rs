// src/fetch/backoff.rs

use std::time::Duration;

/// Retry pacing knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub threshold: u32,
    pub max: Duration,
}

impl BackoffPolicy {
    /// Delay after `failures` consecutive failures.
    ///
    /// Up to `threshold` failures retry at `base`; beyond that the delay
    /// doubles per failure, capped at `max`.
    pub fn delay(&self, failures: u32) -> Duration {
        if failures <= self.threshold {
            return self.base;
        }
        let exp = (failures - self.threshold).min(31);
        self.base
            .checked_mul(1u32 << exp)
            .map_or(self.max, |d| d.min(self.max))
    }
}

/// Identifies one fetch attempt. Later attempts have larger ids.
pub type Generation = u64;

/// Bookkeeping owned by the orchestrator.
#[derive(Debug)]
pub struct FetchAttemptState {
    policy: BackoffPolicy,
    in_flight: Option<Generation>,
    last_generation: Generation,
    consecutive_failures: u32,
    next_interval: Duration,
}

impl FetchAttemptState {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            in_flight: None,
            last_generation: 0,
            consecutive_failures: 0,
            next_interval: policy.base,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn next_interval(&self) -> Duration {
        self.next_interval
    }

    /// Start a new attempt, or `None` if one is already running.
    pub fn begin(&mut self) -> Option<Generation> {
        if self.in_flight.is_some() {
            return None;
        }
        self.last_generation += 1;
        self.in_flight = Some(self.last_generation);
        Some(self.last_generation)
    }

    /// `true` if `generation` is the attempt currently in flight.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.in_flight == Some(generation)
    }

    /// Record a success. Returns `false` (and changes nothing) for a stale generation.
    pub fn succeed(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.in_flight = None;
        self.consecutive_failures = 0;
        self.next_interval = self.policy.base;
        true
    }

    /// Record a failure. Returns `false` (and changes nothing) for a stale generation.
    pub fn fail(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.in_flight = None;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.next_interval = self.policy.delay(self.consecutive_failures);
        true
    }
}

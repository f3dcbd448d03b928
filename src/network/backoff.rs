use rand_core::RngCore;

use crate::config::Timing;

/// Attempt spacing with exponential growth and a fixed ceiling.
///
/// After the `n`-th consecutive failure the next delay is
/// `(base << n) + jitter` for `n` up to `max_shift`, and `ceiling` beyond.
/// Jitter is drawn from `[0, jitter_ms)`.
#[derive(Debug, Clone)]
pub struct Backoff {
    failures: u8,
    delay_ms: u64,
    last_attempt: Option<u64>,
}

impl Backoff {
    pub const fn new() -> Self {
        Self {
            failures: 0,
            delay_ms: 0,
            last_attempt: None,
        }
    }

    /// Consecutive failures since the last success.
    pub fn failures(&self) -> u8 {
        self.failures
    }

    /// Current minimum spacing before the next attempt.
    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Milliseconds since the last attempt; `u64::MAX` if there was none.
    pub fn since_attempt(&self, now: u64) -> u64 {
        elapsed(self.last_attempt, now)
    }

    /// `true` once the current delay has passed since the last attempt.
    pub fn elapsed(&self, now: u64) -> bool {
        self.since_attempt(now) >= self.delay_ms
    }

    /// Clears the failure count and delay. The last attempt time is kept.
    pub fn reset(&mut self) {
        self.failures = 0;
        self.delay_ms = 0;
    }

    /// Forgets everything, including when the last attempt happened.
    pub fn forget(&mut self) {
        *self = Self::new();
    }

    /// Records an attempt at `now` that counts as a failure until proven
    /// otherwise, and returns the new delay.
    pub fn record_attempt<R: RngCore>(&mut self, now: u64, timing: &Timing, rng: &mut R) -> u64 {
        self.failures = self.failures.saturating_add(1);
        let jitter = match timing.jitter_ms {
            0 => 0,
            bound => rng.next_u32() % bound,
        };
        self.delay_ms = next_delay(self.failures, jitter, timing);
        self.last_attempt = Some(now);
        self.delay_ms
    }

    /// Stamps an attempt at `now` without touching the failure count.
    pub fn mark_attempt(&mut self, now: u64) {
        self.last_attempt = Some(now);
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// Delay after `failures` consecutive failures with the given jitter.
pub fn next_delay(failures: u8, jitter: u32, timing: &Timing) -> u64 {
    match failures {
        0 => 0,
        n if n <= timing.backoff_max_shift => (timing.backoff_base_ms << n) + u64::from(jitter),
        _ => timing.backoff_ceiling_ms,
    }
}

/// Milliseconds from `since` to `now`; `u64::MAX` when `since` is unset.
pub(crate) fn elapsed(since: Option<u64>, now: u64) -> u64 {
    since.map_or(u64::MAX, |t| now.saturating_sub(t))
}

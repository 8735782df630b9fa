//! Reconnection policy
//!
//! The wait before attempt n is `initial_delay + n * increment`, capped at
//! `max_delay`. The counter is monotonically non-decreasing across sessions,
//! successful or not; an explicit disconnect is the only thing that clears
//! reconnect state.

use std::time::Duration;

/// Floor applied when backoff is disabled
const MIN_DELAY: Duration = Duration::from_secs(1);

/// Configuration for automatic reconnection
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Whether to reconnect at all after a transport close
    pub enabled: bool,
    /// Whether the delay grows with consecutive failures
    pub backoff: bool,
    /// Delay before the first reconnection attempt
    pub initial_delay: Duration,
    /// Added to the delay after each consecutive failure
    pub increment: Duration,
    /// Cap on the delay
    pub max_delay: Duration,
    /// Random jitter factor (0.0 to 1.0) to prevent thundering herd
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backoff: true,
            initial_delay: Duration::from_secs(1),
            increment: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: 0.0,
        }
    }
}

impl ReconnectConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the per-failure increment
    pub fn with_increment(mut self, increment: Duration) -> Self {
        self.increment = increment;
        self
    }

    /// Set the maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enable or disable backoff growth
    pub fn with_backoff(mut self, backoff: bool) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set jitter factor
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Disable reconnection entirely
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Delay before a reconnection attempt
    ///
    /// `attempt` counts prior consecutive failures, so the first retry uses
    /// `initial_delay`. With backoff disabled every retry waits the same
    /// amount, floored at one second.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if !self.backoff {
            return self.initial_delay.max(MIN_DELAY);
        }
        let delay = self
            .initial_delay
            .saturating_add(self.increment.saturating_mul(attempt));
        delay.min(self.max_delay)
    }

    /// Apply jitter to a base delay
    pub fn apply_jitter(&self, base: Duration) -> Duration {
        if self.jitter == 0.0 {
            return base;
        }
        let jitter_range = base.as_millis() as f64 * self.jitter;
        let jitter = rand::random::<f64>() * 2.0 * jitter_range - jitter_range;
        let adjusted_ms = (base.as_millis() as f64 + jitter).max(0.0) as u64;
        Duration::from_millis(adjusted_ms)
    }

    /// Delay with jitter applied for a given attempt
    pub fn delay_with_jitter(&self, attempt: u32) -> Duration {
        self.apply_jitter(self.delay_for_attempt(attempt))
    }
}

//! Bounded reconnection policy.
//!
//! ```text
//!            unexpected close (code != 1000, counter < max)
//!   Idle ─────────────────────────────────────────────────▶ Scheduled{n}
//!    ▲                                                         │   │
//!    │              reconnect succeeded (counter := 0)         │   │ attempt failed,
//!    └─────────────────────────────────────────────────────────┘   │ counter == max
//!                                                                  ▼
//!                                                              Exhausted
//! ```
//!
//! `Exhausted` only leaves through [`ReconnectPolicy::reset`], which an
//! explicit `connect()` performs.

use std::time::Duration;

use toolwire_transport_traits::close_code;

use crate::config::ClientConfig;

/// Where the policy currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectState {
    /// Connected, or closed on purpose.
    #[default]
    Idle,
    /// Reconnection attempt `attempt` (1-based) is pending or running.
    Scheduled {
        /// Attempt number
        attempt: u32,
    },
    /// Every attempt failed; no more automatic retries.
    Exhausted,
}

/// Decides whether and when to reconnect after a close.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    enabled: bool,
    max_attempts: u32,
    interval: Duration,
    attempts: u32,
    state: ReconnectState,
}

impl ReconnectPolicy {
    /// Policy allowing `max_attempts` retries spaced by `interval`
    pub fn new(enabled: bool, max_attempts: u32, interval: Duration) -> Self {
        Self {
            enabled,
            max_attempts,
            interval,
            attempts: 0,
            state: ReconnectState::Idle,
        }
    }

    /// Policy described by a client configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.reconnect,
            config.reconnect_attempts,
            config.reconnect_interval(),
        )
    }

    /// Current state
    pub fn state(&self) -> ReconnectState {
        self.state
    }

    /// Attempts made since the last successful open
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// A connection opened: forget past attempts.
    pub fn on_open(&mut self) {
        self.attempts = 0;
        self.state = ReconnectState::Idle;
    }

    /// The connection closed unexpectedly with `code`.
    ///
    /// Returns the delay before the next attempt, or `None` when no attempt
    /// should be made.
    pub fn on_close(&mut self, code: u16) -> Option<Duration> {
        if !self.enabled || code == close_code::NORMAL {
            self.state = ReconnectState::Idle;
            return None;
        }
        self.schedule()
    }

    /// The scheduled attempt failed.
    pub fn on_attempt_failed(&mut self) -> Option<Duration> {
        self.schedule()
    }

    /// Back to `Idle` with a zero counter.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.state = ReconnectState::Idle;
    }

    fn schedule(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            self.state = ReconnectState::Exhausted;
            return None;
        }
        self.attempts += 1;
        self.state = ReconnectState::Scheduled {
            attempt: self.attempts,
        };
        Some(self.interval)
    }
}

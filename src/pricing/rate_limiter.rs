//! Sliding-window limiter for outbound pricing calls
//!
//! Admits a call only if fewer than `max_calls` previously admitted calls
//! fall inside the trailing `window`. Rejected calls are not recorded, so a
//! burst of rejections does not extend the wait.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
pub struct RateLimiter {
    /// Admitted call timestamps, oldest first
    calls: VecDeque<Instant>,
    max_calls: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            calls: VecDeque::with_capacity(max_calls),
            max_calls,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admits and records a call now, or rejects it
    pub fn allow_call(&mut self) -> bool {
        self.allow_call_at(Instant::now())
    }

    pub fn allow_call_at(&mut self, now: Instant) -> bool {
        self.evict_expired(now);

        if self.calls.len() >= self.max_calls {
            debug!(
                in_window = self.calls.len(),
                max_calls = self.max_calls,
                "Rate limiter rejected call"
            );
            return false;
        }

        self.calls.push_back(now);
        true
    }

    /// Time until the oldest admitted call leaves the window, if currently full
    pub fn retry_after(&mut self, now: Instant) -> Option<Duration> {
        self.evict_expired(now);
        if self.calls.len() < self.max_calls {
            return None;
        }
        self.calls
            .front()
            .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
    }

    /// Number of admitted calls still inside the window
    pub fn calls_in_window(&mut self, now: Instant) -> usize {
        self.evict_expired(now);
        self.calls.len()
    }

    fn evict_expired(&mut self, now: Instant) {
        while let Some(oldest) = self.calls.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                self.calls.pop_front();
            } else {
                break;
            }
        }
    }
}

//! Sliding-window limit on cloud calls.
//!
//! One window is shared by every request in the process. It is not
//! coordinated across processes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Time source for the window. Tests substitute a manual clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Rolling window of call timestamps.
pub struct RateWindow {
    calls: Mutex<Vec<Instant>>,
    max_calls: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl RateWindow {
    /// Window allowing `max_calls` per rolling `window_secs`.
    pub fn new(max_calls: usize, window_secs: u64) -> Self {
        Self::with_clock(max_calls, window_secs, Arc::new(SystemClock))
    }

    pub fn with_clock(max_calls: usize, window_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            max_calls,
            window: Duration::from_secs(window_secs),
            clock,
        }
    }

    /// Records a call if the window has room.
    ///
    /// Returns `false` without recording when the window is full.
    pub fn check_and_record(&self) -> bool {
        let now = self.clock.now();
        let mut calls = self.calls.lock();
        calls.retain(|t| now.duration_since(*t) < self.window);

        if calls.len() >= self.max_calls {
            tracing::warn!(
                calls = calls.len(),
                max = self.max_calls,
                "Cloud rate window full"
            );
            return false;
        }

        calls.push(now);
        true
    }

    /// Calls still available in the current window.
    pub fn remaining(&self) -> usize {
        let now = self.clock.now();
        let used = self
            .calls
            .lock()
            .iter()
            .filter(|t| now.duration_since(**t) < self.window)
            .count();
        self.max_calls.saturating_sub(used)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    #[test]
    fn test_window_fills_and_ages_out() {
        let clock = Arc::new(ManualClock::new());
        let window = RateWindow::with_clock(14, 60, clock.clone());

        for _ in 0..14 {
            assert!(window.check_and_record());
        }
        assert!(!window.check_and_record());
        assert_eq!(window.remaining(), 0);

        clock.advance(Duration::from_secs(59));
        assert!(!window.check_and_record());

        clock.advance(Duration::from_secs(1));
        assert_eq!(window.remaining(), 14);
        assert!(window.check_and_record());
    }

    #[test]
    fn test_rejected_calls_are_not_recorded() {
        let clock = Arc::new(ManualClock::new());
        let window = RateWindow::with_clock(1, 60, clock.clone());
        assert!(window.check_and_record());
        clock.advance(Duration::from_secs(30));
        assert!(!window.check_and_record());
        clock.advance(Duration::from_secs(30));
        assert!(window.check_and_record());
    }
}

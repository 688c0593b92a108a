//! Timeout alarm of the closed loop.
//!
//! The timer starts at the first execution of a run. An excursion beyond
//! tolerance that is still present once the timeout has elapsed fires the
//! alarm exactly once. The alarm latches until an explicit clear.

use std::time::{Duration, Instant};

/// Result of one alarm evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmEvent {
    /// Deviation within tolerance.
    Quiet,
    /// Out of tolerance, timeout not yet reached.
    Pending,
    /// Fired on this evaluation.
    Fired,
    /// Already active; no re-fire.
    Latched,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeoutAlarm {
    first_execution: Option<Instant>,
    active: bool,
    message: Option<String>,
}

impl TimeoutAlarm {
    pub const fn new() -> Self {
        Self {
            first_execution: None,
            active: false,
            message: None,
        }
    }

    #[inline]
    pub fn first_execution(&self) -> Option<Instant> {
        self.first_execution
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Start the timer if it is not already running.
    #[inline]
    pub fn arm(&mut self, now: Instant) {
        self.first_execution.get_or_insert(now);
    }

    /// Forget the first execution. Used on a fresh start.
    #[inline]
    pub fn reset_timer(&mut self) {
        self.first_execution = None;
    }

    /// Evaluate a deviation against tolerance and timeout.
    pub fn evaluate(
        &mut self,
        now: Instant,
        deviation_pct: f64,
        tolerance_pct: f64,
        timeout: Duration,
    ) -> AlarmEvent {
        if self.active {
            return AlarmEvent::Latched;
        }
        if deviation_pct.abs() <= tolerance_pct {
            return AlarmEvent::Quiet;
        }
        let elapsed = self
            .first_execution
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or(Duration::ZERO);
        if elapsed < timeout {
            return AlarmEvent::Pending;
        }

        self.active = true;
        self.message = Some(format!(
            "K deviation {deviation_pct:.2}% beyond ±{tolerance_pct}% for {}s",
            elapsed.as_secs()
        ));
        AlarmEvent::Fired
    }

    /// Operator acknowledgement. Returns true if an alarm was cleared.
    pub fn clear(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        self.message = None;
        self.first_execution = None;
        was_active
    }
}

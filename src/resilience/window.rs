//! Call outcomes and the count-based sliding window used to compute
//! failure and slow-call rates.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Classification of a completed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    Success,
    Failure,
    SlowSuccess,
    SlowFailure,
}

impl OutcomeKind {
    pub fn is_failure(self) -> bool {
        matches!(self, OutcomeKind::Failure | OutcomeKind::SlowFailure)
    }

    pub fn is_slow(self) -> bool {
        matches!(self, OutcomeKind::SlowSuccess | OutcomeKind::SlowFailure)
    }
}

/// Outcome of a permitted call together with how long it took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOutcome {
    pub kind: OutcomeKind,
    pub duration: Duration,
}

impl CallOutcome {
    /// Classify a call; it is slow when `duration >= slow_threshold`
    pub fn classify(succeeded: bool, duration: Duration, slow_threshold: Duration) -> Self {
        let slow = duration >= slow_threshold;
        let kind = match (succeeded, slow) {
            (true, false) => OutcomeKind::Success,
            (true, true) => OutcomeKind::SlowSuccess,
            (false, false) => OutcomeKind::Failure,
            (false, true) => OutcomeKind::SlowFailure,
        };
        Self { kind, duration }
    }

    pub fn success(duration: Duration) -> Self {
        Self {
            kind: OutcomeKind::Success,
            duration,
        }
    }

    pub fn failure(duration: Duration) -> Self {
        Self {
            kind: OutcomeKind::Failure,
            duration,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.kind.is_failure()
    }

    pub fn is_slow(&self) -> bool {
        self.kind.is_slow()
    }
}

/// Fixed-capacity FIFO of the most recent outcomes
///
/// Failure and slow counts are maintained on push/evict so rates are O(1).
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    capacity: usize,
    outcomes: VecDeque<CallOutcome>,
    failures: usize,
    slow_calls: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            outcomes: VecDeque::with_capacity(capacity),
            failures: 0,
            slow_calls: 0,
        }
    }

    /// Append an outcome, evicting the oldest one when full
    pub fn push(&mut self, outcome: CallOutcome) {
        if self.outcomes.len() == self.capacity {
            if let Some(evicted) = self.outcomes.pop_front() {
                if evicted.is_failure() {
                    self.failures -= 1;
                }
                if evicted.is_slow() {
                    self.slow_calls -= 1;
                }
            }
        }

        if outcome.is_failure() {
            self.failures += 1;
        }
        if outcome.is_slow() {
            self.slow_calls += 1;
        }
        self.outcomes.push_back(outcome);
    }

    pub fn clear(&mut self) {
        self.outcomes.clear();
        self.failures = 0;
        self.slow_calls = 0;
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn failure_count(&self) -> usize {
        self.failures
    }

    pub fn slow_call_count(&self) -> usize {
        self.slow_calls
    }

    /// Failed calls as a percentage of occupancy (0.0 when empty)
    pub fn failure_rate(&self) -> f32 {
        self.percentage(self.failures)
    }

    /// Slow calls as a percentage of occupancy (0.0 when empty)
    pub fn slow_call_rate(&self) -> f32 {
        self.percentage(self.slow_calls)
    }

    fn percentage(&self, count: usize) -> f32 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        count as f32 * 100.0 / self.outcomes.len() as f32
    }

    pub fn iter(&self) -> impl Iterator<Item = &CallOutcome> {
        self.outcomes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLOW: Duration = Duration::from_secs(2);

    #[test]
    fn test_classify_uses_inclusive_slow_threshold() {
        assert_eq!(
            CallOutcome::classify(true, Duration::from_millis(1999), SLOW).kind,
            OutcomeKind::Success
        );
        assert_eq!(
            CallOutcome::classify(true, SLOW, SLOW).kind,
            OutcomeKind::SlowSuccess
        );
        assert_eq!(
            CallOutcome::classify(false, Duration::from_millis(5), SLOW).kind,
            OutcomeKind::Failure
        );
        assert_eq!(
            CallOutcome::classify(false, Duration::from_secs(3), SLOW).kind,
            OutcomeKind::SlowFailure
        );
    }

    #[test]
    fn test_window_evicts_oldest_first() {
        let mut window = SlidingWindow::new(3);
        window.push(CallOutcome::failure(Duration::ZERO));
        window.push(CallOutcome::success(Duration::ZERO));
        window.push(CallOutcome::success(Duration::ZERO));
        assert_eq!(window.failure_count(), 1);

        // The failure is the oldest entry and falls out
        window.push(CallOutcome::success(Duration::ZERO));
        assert_eq!(window.len(), 3);
        assert_eq!(window.failure_count(), 0);
        assert_eq!(window.failure_rate(), 0.0);
    }

    #[test]
    fn test_slow_failure_counts_toward_both_rates() {
        let mut window = SlidingWindow::new(4);
        window.push(CallOutcome::classify(false, SLOW, SLOW));
        window.push(CallOutcome::success(Duration::ZERO));

        assert_eq!(window.failure_rate(), 50.0);
        assert_eq!(window.slow_call_rate(), 50.0);
    }

    #[test]
    fn test_empty_window_has_zero_rates() {
        let window = SlidingWindow::new(10);
        assert!(window.is_empty());
        assert_eq!(window.failure_rate(), 0.0);
        assert_eq!(window.slow_call_rate(), 0.0);
    }
}

//! Property-based tests for the sliding window and breaker tripping

mod common;

use common::strategies::*;
use mall_resilience::resilience::{
    execute, CallOutcome, CircuitBreakerConfig, CircuitState, SlidingWindow,
};
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    /// The window keeps exactly the most recent `capacity` outcomes, oldest first
    #[test]
    fn window_retains_most_recent_outcomes(
        capacity in 1usize..16,
        outcomes in outcome_sequence_strategy(64),
    ) {
        let mut window = SlidingWindow::new(capacity);
        for outcome in &outcomes {
            window.push(*outcome);
        }

        let skip = outcomes.len().saturating_sub(capacity);
        let expected: Vec<CallOutcome> = outcomes[skip..].to_vec();
        let retained: Vec<CallOutcome> = window.iter().copied().collect();

        prop_assert_eq!(window.len(), expected.len());
        prop_assert!(window.len() <= window.capacity());
        prop_assert_eq!(retained, expected);
    }

    /// Maintained counts and rates agree with a recount of the retained outcomes
    #[test]
    fn window_rates_match_recount(
        capacity in 1usize..16,
        outcomes in outcome_sequence_strategy(64),
    ) {
        let mut window = SlidingWindow::new(capacity);
        for outcome in &outcomes {
            window.push(*outcome);
        }

        let failures = window.iter().filter(|o| o.is_failure()).count();
        let slow = window.iter().filter(|o| o.is_slow()).count();
        prop_assert_eq!(window.failure_count(), failures);
        prop_assert_eq!(window.slow_call_count(), slow);

        if window.is_empty() {
            prop_assert_eq!(window.failure_rate(), 0.0);
            prop_assert_eq!(window.slow_call_rate(), 0.0);
        } else {
            let len = window.len() as f32;
            prop_assert!((window.failure_rate() - failures as f32 * 100.0 / len).abs() < 1e-3);
            prop_assert!((window.slow_call_rate() - slow as f32 * 100.0 / len).abs() < 1e-3);
            prop_assert!((0.0..=100.0).contains(&window.failure_rate()));
        }
    }

    /// Clearing always yields an empty window with zero rates
    #[test]
    fn cleared_window_is_empty(outcomes in outcome_sequence_strategy(32)) {
        let mut window = SlidingWindow::new(8);
        for outcome in outcomes {
            window.push(outcome);
        }
        window.clear();

        prop_assert!(window.is_empty());
        prop_assert_eq!(window.failure_count(), 0);
        prop_assert_eq!(window.slow_call_rate(), 0.0);
    }

    /// A closed breaker never opens before `minimum_number_of_calls` outcomes,
    /// and opens on exactly that call when every call fails
    #[test]
    fn all_failures_open_exactly_at_minimum((window, minimum) in window_and_minimum_strategy()) {
        let config = CircuitBreakerConfig::builder()
            .sliding_window_size(window)
            .minimum_number_of_calls(minimum)
            .build()
            .unwrap();
        let (breaker, _clock) = common::manual_breaker("prop", config);

        for call in 1..=minimum {
            prop_assert_eq!(breaker.state(), CircuitState::Closed);
            let result = execute(&breaker, || Err::<(), _>(format!("failure {call}")));
            prop_assert!(result.is_err());
        }

        prop_assert_eq!(breaker.state(), CircuitState::Open);
        prop_assert!(breaker.allow().is_none());
    }

    /// Successful calls below the slow threshold never open the breaker
    #[test]
    fn successes_never_open(calls in 1usize..50) {
        let (breaker, _clock) = common::manual_breaker("prop", common::standard_config());

        for _ in 0..calls {
            prop_assert_eq!(execute(&breaker, || Ok::<_, String>(1)).unwrap(), 1);
        }

        prop_assert_eq!(breaker.state(), CircuitState::Closed);
        prop_assert_eq!(breaker.metrics().success_count, calls as u64);
    }
}

#[test]
fn window_with_zero_capacity_holds_one_outcome() {
    let mut window = SlidingWindow::new(0);
    window.push(CallOutcome::failure(Duration::ZERO));
    window.push(CallOutcome::success(Duration::ZERO));

    assert_eq!(window.capacity(), 1);
    assert_eq!(window.len(), 1);
    assert_eq!(window.failure_count(), 0);
}

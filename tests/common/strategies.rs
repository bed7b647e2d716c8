//! Proptest strategies for call outcomes and breaker tunables

use mall_resilience::resilience::{CallOutcome, OutcomeKind};
use proptest::prelude::*;
use std::time::Duration;

pub fn outcome_kind_strategy() -> impl Strategy<Value = OutcomeKind> {
    prop_oneof![
        Just(OutcomeKind::Success),
        Just(OutcomeKind::Failure),
        Just(OutcomeKind::SlowSuccess),
        Just(OutcomeKind::SlowFailure),
    ]
}

pub fn call_outcome_strategy() -> impl Strategy<Value = CallOutcome> {
    (outcome_kind_strategy(), 0u64..5_000).prop_map(|(kind, millis)| CallOutcome {
        kind,
        duration: Duration::from_millis(millis),
    })
}

pub fn outcome_sequence_strategy(max_len: usize) -> impl Strategy<Value = Vec<CallOutcome>> {
    prop::collection::vec(call_outcome_strategy(), 0..max_len)
}

/// (window size, minimum calls) with minimum <= window
pub fn window_and_minimum_strategy() -> impl Strategy<Value = (u32, u32)> {
    (1u32..20).prop_flat_map(|window| (Just(window), 1..=window))
}

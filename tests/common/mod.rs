//! Shared helpers for integration tests

#![allow(dead_code)]

use mall_resilience::resilience::{CircuitBreaker, CircuitBreakerConfig, ManualClock};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

pub mod strategies;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Threshold 50%, window 10, minimum 5 calls, 3 trial calls, 60s wait
pub fn standard_config() -> CircuitBreakerConfig {
    CircuitBreakerConfig::builder()
        .failure_rate_threshold(50.0)
        .sliding_window_size(10)
        .minimum_number_of_calls(5)
        .permitted_number_of_calls_in_half_open_state(3)
        .wait_duration_in_open_state(Duration::from_secs(60))
        .slow_call_rate_threshold(50.0)
        .slow_call_duration_threshold(Duration::from_secs(2))
        .build()
        .expect("standard config is valid")
}

/// Breaker on a manual clock, plus the clock to drive it
pub fn manual_breaker(name: &str, config: CircuitBreakerConfig) -> (Arc<CircuitBreaker>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let breaker = Arc::new(CircuitBreaker::with_clock(name, config, clock.clone()));
    (breaker, clock)
}

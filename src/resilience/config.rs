//! # Circuit Breaker Configuration
//!
//! Validated, immutable tunables for a single circuit breaker.
//!
//! File-facing settings live in `crate::config::BreakerSettings` and are
//! converted into this type at startup; invalid values are rejected there
//! rather than at call time.

use crate::config::{ConfigResult, ConfigurationError};
use serde::Serialize;
use std::time::Duration;

/// Configuration for a single circuit breaker
///
/// Construct through [`CircuitBreakerConfig::builder`] or one of the presets.
/// Fields are private so a validated config cannot be altered afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitBreakerConfig {
    failure_rate_threshold: f32,
    wait_duration_in_open_state: Duration,
    sliding_window_size: u32,
    minimum_number_of_calls: u32,
    permitted_number_of_calls_in_half_open_state: u32,
    slow_call_rate_threshold: f32,
    slow_call_duration_threshold: Duration,
}

impl CircuitBreakerConfig {
    /// Start building a configuration from the defaults
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::default()
    }

    /// Preset for the product search index
    pub fn for_search_index() -> Self {
        Self::preset(Duration::from_secs(60), Duration::from_secs(2))
    }

    /// Preset for the distributed cache
    pub fn for_cache() -> Self {
        Self::preset(Duration::from_secs(30), Duration::from_secs(1))
    }

    /// Preset for the message broker
    pub fn for_broker() -> Self {
        Self::preset(Duration::from_secs(60), Duration::from_secs(2))
    }

    /// Preset for the order service
    pub fn for_order_service() -> Self {
        Self::preset(Duration::from_secs(30), Duration::from_secs(3))
    }

    fn preset(wait: Duration, slow_call_duration: Duration) -> Self {
        Self {
            wait_duration_in_open_state: wait,
            slow_call_duration_threshold: slow_call_duration,
            ..Self::default()
        }
    }

    /// Failure rate (percent) at or above which the breaker opens
    pub fn failure_rate_threshold(&self) -> f32 {
        self.failure_rate_threshold
    }

    /// How long the breaker stays open before allowing trial calls
    pub fn wait_duration_in_open_state(&self) -> Duration {
        self.wait_duration_in_open_state
    }

    /// Number of most recent call outcomes kept for rate calculation
    pub fn sliding_window_size(&self) -> u32 {
        self.sliding_window_size
    }

    /// Calls required in the window before rates are evaluated
    pub fn minimum_number_of_calls(&self) -> u32 {
        self.minimum_number_of_calls
    }

    /// Trial calls permitted while half-open
    pub fn permitted_number_of_calls_in_half_open_state(&self) -> u32 {
        self.permitted_number_of_calls_in_half_open_state
    }

    /// Slow-call rate (percent) at or above which the breaker opens
    pub fn slow_call_rate_threshold(&self) -> f32 {
        self.slow_call_rate_threshold
    }

    /// Calls taking at least this long are classified as slow
    pub fn slow_call_duration_threshold(&self) -> Duration {
        self.slow_call_duration_threshold
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> ConfigResult<()> {
        validate_percentage("failure_rate_threshold", self.failure_rate_threshold)?;
        validate_percentage("slow_call_rate_threshold", self.slow_call_rate_threshold)?;

        if self.wait_duration_in_open_state.is_zero() {
            return Err(ConfigurationError::invalid_value(
                "wait_duration_in_open_state",
                format!("{:?}", self.wait_duration_in_open_state),
                "must be greater than 0",
            ));
        }

        if self.slow_call_duration_threshold.is_zero() {
            return Err(ConfigurationError::invalid_value(
                "slow_call_duration_threshold",
                format!("{:?}", self.slow_call_duration_threshold),
                "must be greater than 0",
            ));
        }

        if self.sliding_window_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "sliding_window_size",
                self.sliding_window_size,
                "must be greater than 0",
            ));
        }

        if self.minimum_number_of_calls == 0 {
            return Err(ConfigurationError::invalid_value(
                "minimum_number_of_calls",
                self.minimum_number_of_calls,
                "must be greater than 0",
            ));
        }

        if self.minimum_number_of_calls > self.sliding_window_size {
            return Err(ConfigurationError::conflicting_values(
                "minimum_number_of_calls",
                "sliding_window_size",
                format!(
                    "minimum_number_of_calls ({}) must not exceed sliding_window_size ({})",
                    self.minimum_number_of_calls, self.sliding_window_size
                ),
            ));
        }

        if self.permitted_number_of_calls_in_half_open_state == 0 {
            return Err(ConfigurationError::invalid_value(
                "permitted_number_of_calls_in_half_open_state",
                self.permitted_number_of_calls_in_half_open_state,
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

fn validate_percentage(field: &str, value: f32) -> ConfigResult<()> {
    if !(1.0..=100.0).contains(&value) {
        return Err(ConfigurationError::invalid_value(
            field,
            value,
            "must be a percentage between 1 and 100",
        ));
    }
    Ok(())
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            wait_duration_in_open_state: Duration::from_secs(60),
            sliding_window_size: 10,
            minimum_number_of_calls: 5,
            permitted_number_of_calls_in_half_open_state: 3,
            slow_call_rate_threshold: 50.0,
            slow_call_duration_threshold: Duration::from_secs(2),
        }
    }
}

/// Builder for [`CircuitBreakerConfig`]; `build` validates
#[derive(Debug, Clone, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    pub fn failure_rate_threshold(mut self, percent: f32) -> Self {
        self.config.failure_rate_threshold = percent;
        self
    }

    pub fn wait_duration_in_open_state(mut self, wait: Duration) -> Self {
        self.config.wait_duration_in_open_state = wait;
        self
    }

    pub fn sliding_window_size(mut self, size: u32) -> Self {
        self.config.sliding_window_size = size;
        self
    }

    pub fn minimum_number_of_calls(mut self, calls: u32) -> Self {
        self.config.minimum_number_of_calls = calls;
        self
    }

    pub fn permitted_number_of_calls_in_half_open_state(mut self, calls: u32) -> Self {
        self.config.permitted_number_of_calls_in_half_open_state = calls;
        self
    }

    pub fn slow_call_rate_threshold(mut self, percent: f32) -> Self {
        self.config.slow_call_rate_threshold = percent;
        self
    }

    pub fn slow_call_duration_threshold(mut self, threshold: Duration) -> Self {
        self.config.slow_call_duration_threshold = threshold;
        self
    }

    /// Validate and produce the immutable configuration
    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

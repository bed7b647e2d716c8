//! # Circuit Breaker Metrics
//!
//! Point-in-time snapshots of circuit breaker activity, per breaker and
//! aggregated across every dependency the service protects. Rates are
//! percentages (0-100), matching the configured thresholds.

use crate::resilience::CircuitState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Failure rate (percent) below which a closed breaker counts as healthy
pub const HEALTHY_FAILURE_RATE: f32 = 10.0;

/// Metrics for a single circuit breaker instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    /// Permitted calls whose outcome was recorded
    pub total_calls: u64,

    pub success_count: u64,

    /// Failed calls, slow or not
    pub failure_count: u64,

    /// Calls at or above the slow-call duration threshold
    pub slow_call_count: u64,

    /// Calls denied by the breaker
    pub not_permitted_count: u64,

    /// Total duration of all recorded calls
    pub total_duration: Duration,

    pub average_duration: Duration,

    /// Current circuit breaker state
    pub current_state: CircuitState,

    /// Outcomes currently held in the sliding window
    pub buffered_calls: usize,

    /// Window failure rate; `None` until the minimum number of calls is buffered
    pub failure_rate: Option<f32>,

    /// Window slow-call rate; `None` until the minimum number of calls is buffered
    pub slow_call_rate: Option<f32>,
}

impl CircuitBreakerMetrics {
    /// Create new metrics instance with zero values
    pub fn new() -> Self {
        Self {
            total_calls: 0,
            success_count: 0,
            failure_count: 0,
            slow_call_count: 0,
            not_permitted_count: 0,
            total_duration: Duration::ZERO,
            average_duration: Duration::ZERO,
            current_state: CircuitState::Closed,
            buffered_calls: 0,
            failure_rate: None,
            slow_call_rate: None,
        }
    }

    /// Lifetime success rate (percent), 100 when nothing ran yet
    pub fn success_rate(&self) -> f32 {
        if self.total_calls == 0 {
            return 100.0;
        }
        self.success_count as f32 * 100.0 / self.total_calls as f32
    }

    /// Check if metrics indicate healthy operation
    pub fn is_healthy(&self) -> bool {
        match self.current_state {
            CircuitState::Closed => self
                .failure_rate
                .map_or(true, |rate| rate < HEALTHY_FAILURE_RATE),
            CircuitState::Open => false,
            // Half-open is attempting recovery
            CircuitState::HalfOpen => true,
        }
    }

    /// Get human-readable state description
    pub fn state_description(&self) -> &'static str {
        match self.current_state {
            CircuitState::Closed => "Healthy - Normal operation",
            CircuitState::Open => "Failing - Rejecting all calls",
            CircuitState::HalfOpen => "Recovering - Testing dependency health",
        }
    }

    /// Format metrics for logging
    pub fn format_summary(&self) -> String {
        let window_rate = self
            .failure_rate
            .map_or_else(|| "n/a".to_string(), |rate| format!("{rate:.1}%"));

        format!(
            "State: {} | Calls: {} | Success: {:.1}% | Failures: {} | Slow: {} | Rejected: {} | Window failure rate: {} | Avg Duration: {}ms",
            self.state_description(),
            self.total_calls,
            self.success_rate(),
            self.failure_count,
            self.slow_call_count,
            self.not_permitted_count,
            window_rate,
            self.average_duration.as_millis()
        )
    }
}

impl Default for CircuitBreakerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// System-wide circuit breaker metrics aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemCircuitBreakerMetrics {
    /// Metrics for individual circuit breakers by component name
    pub circuit_breakers: HashMap<String, CircuitBreakerMetrics>,

    /// Timestamp of last metrics collection
    pub collected_at: chrono::DateTime<chrono::Utc>,
}

impl SystemCircuitBreakerMetrics {
    pub fn new() -> Self {
        Self {
            circuit_breakers: HashMap::new(),
            collected_at: chrono::Utc::now(),
        }
    }

    /// Add metrics for a circuit breaker
    pub fn add_circuit_breaker(&mut self, name: String, metrics: CircuitBreakerMetrics) {
        self.circuit_breakers.insert(name, metrics);
        self.collected_at = chrono::Utc::now();
    }

    /// Get count of circuit breakers by state
    pub fn count_by_state(&self) -> HashMap<CircuitState, usize> {
        let mut counts = HashMap::new();
        for metrics in self.circuit_breakers.values() {
            *counts.entry(metrics.current_state).or_insert(0) += 1;
        }
        counts
    }

    /// Get list of unhealthy circuit breakers
    pub fn unhealthy_circuits(&self) -> Vec<(&String, &CircuitBreakerMetrics)> {
        self.circuit_breakers
            .iter()
            .filter(|(_, metrics)| !metrics.is_healthy())
            .collect()
    }

    /// Fraction of healthy breakers (0.0 to 1.0); 1.0 when there are none
    pub fn health_score(&self) -> f64 {
        if self.circuit_breakers.is_empty() {
            return 1.0;
        }

        let healthy_count = self
            .circuit_breakers
            .values()
            .filter(|metrics| metrics.is_healthy())
            .count();

        healthy_count as f64 / self.circuit_breakers.len() as f64
    }

    pub fn total_calls(&self) -> u64 {
        self.circuit_breakers.values().map(|m| m.total_calls).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.circuit_breakers.values().map(|m| m.failure_count).sum()
    }

    pub fn total_not_permitted(&self) -> u64 {
        self.circuit_breakers
            .values()
            .map(|m| m.not_permitted_count)
            .sum()
    }

    /// Lifetime failure rate (percent) across all breakers
    pub fn system_failure_rate(&self) -> f64 {
        let total_calls = self.total_calls();
        if total_calls == 0 {
            return 0.0;
        }
        self.total_failures() as f64 * 100.0 / total_calls as f64
    }

    /// Format summary for logging
    pub fn format_summary(&self) -> String {
        let state_counts = self.count_by_state();
        let count = |state| state_counts.get(&state).copied().unwrap_or(0);

        format!(
            "Circuit Breakers: {} total | {} closed | {} open | {} half-open | Health: {:.1}% | System failure rate: {:.2}%",
            self.circuit_breakers.len(),
            count(CircuitState::Closed),
            count(CircuitState::Open),
            count(CircuitState::HalfOpen),
            self.health_score() * 100.0,
            self.system_failure_rate()
        )
    }
}

impl Default for SystemCircuitBreakerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_breaker_metrics_creation() {
        let metrics = CircuitBreakerMetrics::new();

        assert_eq!(metrics.total_calls, 0);
        assert_eq!(metrics.current_state, CircuitState::Closed);
        assert_eq!(metrics.failure_rate, None);
        assert_eq!(metrics.success_rate(), 100.0);
        assert!(metrics.is_healthy());
    }

    #[test]
    fn test_metrics_health_calculation() {
        let mut metrics = CircuitBreakerMetrics::new();

        metrics.current_state = CircuitState::Closed;
        metrics.failure_rate = Some(5.0);
        assert!(metrics.is_healthy());

        metrics.failure_rate = Some(15.0);
        assert!(!metrics.is_healthy());

        // Not yet evaluated counts as healthy
        metrics.failure_rate = None;
        assert!(metrics.is_healthy());

        metrics.current_state = CircuitState::Open;
        assert!(!metrics.is_healthy());

        metrics.current_state = CircuitState::HalfOpen;
        assert!(metrics.is_healthy());
    }

    #[test]
    fn test_system_metrics_aggregation() {
        let mut system_metrics = SystemCircuitBreakerMetrics::new();

        let search = CircuitBreakerMetrics {
            total_calls: 100,
            success_count: 95,
            failure_count: 5,
            failure_rate: Some(5.0),
            ..CircuitBreakerMetrics::new()
        };

        let broker = CircuitBreakerMetrics {
            current_state: CircuitState::Open,
            total_calls: 50,
            success_count: 25,
            failure_count: 25,
            not_permitted_count: 7,
            ..CircuitBreakerMetrics::new()
        };

        system_metrics.add_circuit_breaker("search-index".to_string(), search);
        system_metrics.add_circuit_breaker("broker".to_string(), broker);

        assert_eq!(system_metrics.total_calls(), 150);
        assert_eq!(system_metrics.total_failures(), 30);
        assert_eq!(system_metrics.total_not_permitted(), 7);
        assert_eq!(system_metrics.system_failure_rate(), 20.0);

        let state_counts = system_metrics.count_by_state();
        assert_eq!(state_counts.get(&CircuitState::Closed), Some(&1));
        assert_eq!(state_counts.get(&CircuitState::Open), Some(&1));

        assert_eq!(system_metrics.health_score(), 0.5);

        let unhealthy = system_metrics.unhealthy_circuits();
        assert_eq!(unhealthy.len(), 1);
        assert_eq!(unhealthy[0].0, "broker");

        assert!(system_metrics.format_summary().contains("1 open"));
    }
}

//! # Circuit Breaker Manager
//!
//! Registry of circuit breakers by dependency name. Every configured component
//! gets its breaker at startup; names first seen at runtime get one built from
//! the default settings.

use crate::config::{CircuitBreakersConfig, ConfigResult, ConfigurationError};
use crate::resilience::clock::{Clock, SystemClock};
use crate::resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState,
    SystemCircuitBreakerMetrics,
};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Manager for the circuit breakers of every protected dependency
///
/// Cloning is cheap and clones share the same breakers.
#[derive(Debug, Clone)]
pub struct CircuitBreakerManager {
    /// Circuit breakers by component name
    circuit_breakers: Arc<DashMap<String, Arc<CircuitBreaker>>>,

    /// Validated config applied to components not listed in configuration
    default_config: CircuitBreakerConfig,

    enabled: bool,

    clock: Arc<dyn Clock>,
}

impl CircuitBreakerManager {
    /// Build every configured circuit breaker, failing on the first invalid one
    pub fn from_config(config: &CircuitBreakersConfig) -> ConfigResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`from_config`](Self::from_config), with all breakers reading `clock`
    pub fn with_clock(config: &CircuitBreakersConfig, clock: Arc<dyn Clock>) -> ConfigResult<Self> {
        let default_config = config
            .default_config
            .to_resilience_config()
            .map_err(|e| ConfigurationError::for_component("default", e))?;

        let circuit_breakers = DashMap::new();
        for (name, settings) in &config.component_configs {
            let component_config = settings
                .to_resilience_config()
                .map_err(|e| ConfigurationError::for_component(name.as_str(), e))?;

            circuit_breakers.insert(
                name.clone(),
                Arc::new(CircuitBreaker::with_clock(
                    name.clone(),
                    component_config,
                    clock.clone(),
                )),
            );
        }

        info!(
            enabled = config.enabled,
            components = circuit_breakers.len(),
            "Circuit breaker manager initialized"
        );

        if !config.enabled {
            warn!("Circuit breakers disabled; dependencies will be called unprotected");
        }

        Ok(Self {
            circuit_breakers: Arc::new(circuit_breakers),
            default_config,
            enabled: config.enabled,
            clock,
        })
    }

    /// Whether adapters should guard their calls at all
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get or create circuit breaker for a component
    pub fn get_circuit_breaker(&self, component_name: &str) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.circuit_breakers.get(component_name) {
            return Arc::clone(breaker.value());
        }

        let breaker = self
            .circuit_breakers
            .entry(component_name.to_string())
            .or_insert_with(|| {
                info!(
                    component = component_name,
                    "Creating circuit breaker with default configuration"
                );
                Arc::new(CircuitBreaker::with_clock(
                    component_name,
                    self.default_config.clone(),
                    self.clock.clone(),
                ))
            });

        Arc::clone(breaker.value())
    }

    /// Breaker to guard `component_name` with, or `None` when breakers are disabled
    pub fn breaker_for(&self, component_name: &str) -> Option<Arc<CircuitBreaker>> {
        self.enabled
            .then(|| self.get_circuit_breaker(component_name))
    }

    /// Get all circuit breaker names, sorted
    pub fn list_components(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .circuit_breakers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Get metrics for a specific circuit breaker
    pub fn get_component_metrics(&self, component_name: &str) -> Option<CircuitBreakerMetrics> {
        self.circuit_breakers
            .get(component_name)
            .map(|breaker| breaker.metrics())
    }

    /// Get system-wide circuit breaker metrics
    pub fn get_system_metrics(&self) -> SystemCircuitBreakerMetrics {
        let mut system_metrics = SystemCircuitBreakerMetrics::new();
        for entry in self.circuit_breakers.iter() {
            system_metrics.add_circuit_breaker(entry.key().clone(), entry.value().metrics());
        }
        system_metrics
    }

    /// Get count of circuit breakers by state
    pub fn get_state_summary(&self) -> HashMap<CircuitState, usize> {
        self.get_system_metrics().count_by_state()
    }

    /// Overall health based on circuit breaker states (0.0 to 1.0)
    pub fn system_health_score(&self) -> f64 {
        self.get_system_metrics().health_score()
    }

    /// Force open all circuit breakers (emergency stop)
    pub fn force_open_all(&self) {
        warn!("Forcing all circuit breakers open (emergency stop)");
        for entry in self.circuit_breakers.iter() {
            entry.value().force_open();
        }
    }

    /// Force close all circuit breakers (emergency recovery)
    pub fn force_close_all(&self) {
        warn!("Forcing all circuit breakers closed (emergency recovery)");
        for entry in self.circuit_breakers.iter() {
            entry.value().force_closed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BreakerSettings;
    use crate::constants::components;
    use crate::resilience::window::CallOutcome;
    use std::time::Duration;

    #[test]
    fn test_configured_components_are_built_eagerly() {
        let manager = CircuitBreakerManager::from_config(&CircuitBreakersConfig::default()).unwrap();

        let mut expected: Vec<String> = components::ALL.iter().map(|c| c.to_string()).collect();
        expected.sort();
        assert_eq!(manager.list_components(), expected);

        let cache = manager.get_circuit_breaker(components::CACHE);
        assert_eq!(cache.config(), &CircuitBreakerConfig::for_cache());
        assert_eq!(manager.system_health_score(), 1.0);
    }

    #[test]
    fn test_get_or_create_circuit_breaker() {
        let manager = CircuitBreakerManager::from_config(&CircuitBreakersConfig::default()).unwrap();

        let breaker1 = manager.get_circuit_breaker("recommendations");
        assert_eq!(breaker1.name(), "recommendations");
        assert_eq!(breaker1.config(), &CircuitBreakerConfig::default());

        let breaker2 = manager.get_circuit_breaker("recommendations");
        assert!(Arc::ptr_eq(&breaker1, &breaker2));

        // Clones share breakers
        let cloned = manager.clone();
        assert!(Arc::ptr_eq(
            &breaker1,
            &cloned.get_circuit_breaker("recommendations")
        ));
        assert_eq!(manager.list_components().len(), components::ALL.len() + 1);
    }

    #[test]
    fn test_invalid_component_fails_construction() {
        let mut config = CircuitBreakersConfig::default();
        config.component_configs.insert(
            components::SEARCH_INDEX.to_string(),
            BreakerSettings {
                sliding_window_size: 0,
                ..BreakerSettings::default()
            },
        );

        let err = CircuitBreakerManager::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidComponent { ref component, .. } if component == components::SEARCH_INDEX
        ));
    }

    #[test]
    fn test_disabled_manager_hands_out_no_breakers() {
        let config = CircuitBreakersConfig {
            enabled: false,
            ..CircuitBreakersConfig::default()
        };
        let manager = CircuitBreakerManager::from_config(&config).unwrap();

        assert!(!manager.is_enabled());
        assert!(manager.breaker_for(components::BROKER).is_none());
    }

    #[test]
    fn test_system_metrics_and_force_controls() {
        let manager = CircuitBreakerManager::from_config(&CircuitBreakersConfig::default()).unwrap();

        let broker = manager.breaker_for(components::BROKER).unwrap();
        broker
            .allow()
            .unwrap()
            .record(CallOutcome::failure(Duration::from_millis(3)));

        let broker_metrics = manager.get_component_metrics(components::BROKER).unwrap();
        assert_eq!(broker_metrics.failure_count, 1);
        assert!(manager.get_component_metrics("unknown").is_none());

        manager.force_open_all();
        let summary = manager.get_state_summary();
        assert_eq!(summary.get(&CircuitState::Open), Some(&components::ALL.len()));
        assert_eq!(manager.system_health_score(), 0.0);

        manager.force_close_all();
        assert_eq!(
            manager.get_state_summary().get(&CircuitState::Closed),
            Some(&components::ALL.len())
        );
        assert_eq!(manager.get_system_metrics().total_calls(), 1);
    }
}

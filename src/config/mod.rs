//! # Mall Configuration System
//!
//! Startup configuration for the resilience layer: logging options and one set
//! of circuit breaker tunables per protected dependency.
//!
//! ## Sources
//!
//! Later sources override earlier ones:
//!
//! 1. Built-in defaults ([`MallConfig::default`])
//! 2. `config/mall.toml`
//! 3. `config/mall.{environment}.toml`
//! 4. `MALL__`-prefixed environment variables, `__` separated
//!    (`MALL__CIRCUIT_BREAKERS__ENABLED=false`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mall_resilience::config::ConfigManager;
//! use mall_resilience::resilience::CircuitBreakerManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::load()?;
//! let breakers = CircuitBreakerManager::from_config(&config.config().circuit_breakers)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::components;
use crate::resilience::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MallConfig {
    /// Deployment environment the configuration was resolved for
    pub environment: String,

    pub logging: LoggingConfig,

    /// Per-dependency circuit breaker settings
    pub circuit_breakers: CircuitBreakersConfig,
}

impl MallConfig {
    /// Validate every section; run once at load
    pub fn validate(&self) -> ConfigResult<()> {
        self.circuit_breakers.validate()
    }
}

impl Default for MallConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            logging: LoggingConfig::default(),
            circuit_breakers: CircuitBreakersConfig::default(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, for terminals
    #[default]
    Pretty,
    /// One JSON object per line, for log shippers
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,

    /// `EnvFilter` directive; derived from the environment when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Circuit breaker configuration for all protected dependencies
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakersConfig {
    /// When false, adapters call their dependency directly without a breaker
    pub enabled: bool,

    /// Settings for components without an entry in `component_configs`
    pub default_config: BreakerSettings,

    /// Settings by component name
    pub component_configs: HashMap<String, BreakerSettings>,
}

impl CircuitBreakersConfig {
    /// Get configuration for a specific component
    pub fn config_for_component(&self, component_name: &str) -> &BreakerSettings {
        self.component_configs
            .get(component_name)
            .unwrap_or(&self.default_config)
    }

    /// Check that the default and every named component convert to a valid breaker config
    pub fn validate(&self) -> ConfigResult<()> {
        self.default_config
            .to_resilience_config()
            .map_err(|e| ConfigurationError::for_component("default", e))?;

        for (name, settings) in &self.component_configs {
            settings
                .to_resilience_config()
                .map_err(|e| ConfigurationError::for_component(name.as_str(), e))?;
        }
        Ok(())
    }
}

impl Default for CircuitBreakersConfig {
    fn default() -> Self {
        let component_configs = [
            (
                components::SEARCH_INDEX,
                CircuitBreakerConfig::for_search_index(),
            ),
            (components::CACHE, CircuitBreakerConfig::for_cache()),
            (components::BROKER, CircuitBreakerConfig::for_broker()),
            (
                components::ORDER_SERVICE,
                CircuitBreakerConfig::for_order_service(),
            ),
        ]
        .into_iter()
        .map(|(name, config)| (name.to_string(), BreakerSettings::from(&config)))
        .collect();

        Self {
            enabled: true,
            default_config: BreakerSettings::default(),
            component_configs,
        }
    }
}

/// File-facing tunables for one circuit breaker
///
/// Durations are integer milliseconds so they can be written plainly in TOML
/// and environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub failure_rate_threshold: f32,
    pub wait_duration_in_open_state_ms: u64,
    pub sliding_window_size: u32,
    pub minimum_number_of_calls: u32,
    pub permitted_number_of_calls_in_half_open_state: u32,
    pub slow_call_rate_threshold: f32,
    pub slow_call_duration_threshold_ms: u64,
}

impl BreakerSettings {
    /// Convert to the resilience module's validated format
    pub fn to_resilience_config(&self) -> ConfigResult<CircuitBreakerConfig> {
        CircuitBreakerConfig::builder()
            .failure_rate_threshold(self.failure_rate_threshold)
            .wait_duration_in_open_state(Duration::from_millis(
                self.wait_duration_in_open_state_ms,
            ))
            .sliding_window_size(self.sliding_window_size)
            .minimum_number_of_calls(self.minimum_number_of_calls)
            .permitted_number_of_calls_in_half_open_state(
                self.permitted_number_of_calls_in_half_open_state,
            )
            .slow_call_rate_threshold(self.slow_call_rate_threshold)
            .slow_call_duration_threshold(Duration::from_millis(
                self.slow_call_duration_threshold_ms,
            ))
            .build()
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self::from(&CircuitBreakerConfig::default())
    }
}

impl From<&CircuitBreakerConfig> for BreakerSettings {
    fn from(config: &CircuitBreakerConfig) -> Self {
        Self {
            failure_rate_threshold: config.failure_rate_threshold(),
            wait_duration_in_open_state_ms: config.wait_duration_in_open_state().as_millis()
                as u64,
            sliding_window_size: config.sliding_window_size(),
            minimum_number_of_calls: config.minimum_number_of_calls(),
            permitted_number_of_calls_in_half_open_state: config
                .permitted_number_of_calls_in_half_open_state(),
            slow_call_rate_threshold: config.slow_call_rate_threshold(),
            slow_call_duration_threshold_ms: config.slow_call_duration_threshold().as_millis()
                as u64,
        }
    }
}

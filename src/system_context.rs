//! # System Context
//!
//! Shared dependencies for the mall services: the loaded configuration and
//! the circuit breaker registry built from it. Constructing a context also
//! initializes logging, so it is the single entry point a service needs.

use crate::config::{ConfigManager, MallConfig};
use crate::logging;
use crate::resilience::{CircuitBreaker, CircuitBreakerManager};
use crate::Result;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SystemContext {
    /// Instance ID, for correlating logs across restarts
    pub system_id: Uuid,

    pub config_manager: Arc<ConfigManager>,

    pub circuit_breakers: CircuitBreakerManager,
}

impl SystemContext {
    /// Load configuration for the detected environment and build the context
    pub fn new() -> Result<Self> {
        let config_manager = ConfigManager::load()?;
        Self::from_config_manager(config_manager)
    }

    /// Build the context from an already-assembled configuration
    pub fn from_config(config: MallConfig) -> Result<Self> {
        Self::from_config_manager(ConfigManager::from_config(config)?)
    }

    pub fn from_config_manager(config_manager: Arc<ConfigManager>) -> Result<Self> {
        let config = config_manager.config();
        logging::init_logging(config_manager.environment(), &config.logging);

        let circuit_breakers = CircuitBreakerManager::from_config(&config.circuit_breakers)?;
        let system_id = Uuid::new_v4();

        info!(
            system_id = %system_id,
            environment = %config_manager.environment(),
            circuit_breakers_enabled = circuit_breakers.is_enabled(),
            components = ?circuit_breakers.list_components(),
            "System context initialized"
        );

        Ok(Self {
            system_id,
            config_manager,
            circuit_breakers,
        })
    }

    pub fn config(&self) -> &MallConfig {
        self.config_manager.config()
    }

    pub fn environment(&self) -> &str {
        self.config_manager.environment()
    }

    /// Breaker guarding `component`, or `None` when breakers are disabled
    pub fn breaker_for(&self, component: &str) -> Option<Arc<CircuitBreaker>> {
        self.circuit_breakers.breaker_for(component)
    }
}

//! Configuration Loader
//!
//! Environment-aware loading: detects the deployment environment, layers
//! defaults, TOML files and environment variables with the `config` crate, and
//! validates the result before anything is built from it.

use super::error::{ConfigResult, ConfigurationError};
use super::MallConfig;
use crate::constants::env as env_vars;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Base name of the configuration files (`mall.toml`, `mall.{env}.toml`)
const CONFIG_FILE_STEM: &str = "mall";

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: MallConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection from `./config`
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    ///
    /// Useful for tests that should not depend on process environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_overrides(config_dir, environment, None)
    }

    /// Load with an explicit set of `MALL__*` variables instead of the process environment
    pub fn load_with_overrides(
        config_dir: Option<PathBuf>,
        environment: &str,
        env_overrides: Option<config::Map<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            environment = %environment,
            config_directory = %config_directory.display(),
            "Loading configuration"
        );

        let config = Self::load_and_merge_config(&config_directory, environment, env_overrides)?;
        config.validate()?;

        info!(
            environment = %environment,
            circuit_breakers_enabled = config.circuit_breakers.enabled,
            components = config.circuit_breakers.component_configs.len(),
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Wrap an already-built configuration, validating it first
    pub fn from_config(config: MallConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            environment: config.environment.clone(),
            config,
            config_directory: PathBuf::from("config"),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &MallConfig {
        &self.config
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect environment from `MALL_ENV`, then `APP_ENV`, defaulting to `development`
    pub fn detect_environment() -> String {
        env::var(env_vars::ENVIRONMENT)
            .or_else(|_| env::var(env_vars::FALLBACK_ENVIRONMENT))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
        env_overrides: Option<config::Map<String, String>>,
    ) -> ConfigResult<MallConfig> {
        let to_load_error = |e: config::ConfigError| ConfigurationError::load_error(environment, e);

        let defaults = config::Config::try_from(&MallConfig::default()).map_err(to_load_error)?;

        let base_file = config_directory.join(format!("{CONFIG_FILE_STEM}.toml"));
        let environment_file =
            config_directory.join(format!("{CONFIG_FILE_STEM}.{environment}.toml"));

        debug!(
            base_file = %base_file.display(),
            base_file_present = base_file.is_file(),
            environment_file = %environment_file.display(),
            environment_file_present = environment_file.is_file(),
            "Resolved configuration files"
        );

        let environment_source = config::Environment::with_prefix(env_vars::CONFIG_PREFIX)
            .prefix_separator(env_vars::CONFIG_SEPARATOR)
            .separator(env_vars::CONFIG_SEPARATOR)
            .try_parsing(true)
            .source(env_overrides);

        config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(base_file).required(false))
            .add_source(config::File::from(environment_file).required(false))
            .add_source(environment_source)
            .set_override("environment", environment)
            .map_err(to_load_error)?
            .build()
            .map_err(to_load_error)?
            .try_deserialize::<MallConfig>()
            .map_err(to_load_error)
    }
}

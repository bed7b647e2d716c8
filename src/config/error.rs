//! Configuration Error Types
//!
//! Errors raised while loading configuration or constructing circuit breakers
//! from it. All of them surface at startup; none are produced at call time.

use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },

    /// Two fields that are valid on their own but not together
    #[error("Conflicting values for '{field}' and '{other}': {context}")]
    ConflictingValues {
        field: String,
        other: String,
        context: String,
    },

    /// Invalid configuration for a named circuit breaker component
    #[error("Invalid circuit breaker configuration for '{component}': {source}")]
    InvalidComponent {
        component: String,
        #[source]
        source: Box<ConfigurationError>,
    },

    /// Failure while layering or deserializing configuration sources
    #[error("Failed to load configuration for environment '{environment}': {error}")]
    LoadError { environment: String, error: String },
}

impl ConfigurationError {
    /// Create an invalid value error
    pub fn invalid_value<F: Into<String>, V: ToString, C: Into<String>>(
        field: F,
        value: V,
        context: C,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            context: context.into(),
        }
    }

    /// Create a conflicting values error
    pub fn conflicting_values<F: Into<String>, O: Into<String>, C: Into<String>>(
        field: F,
        other: O,
        context: C,
    ) -> Self {
        Self::ConflictingValues {
            field: field.into(),
            other: other.into(),
            context: context.into(),
        }
    }

    /// Attach the component name to an error raised while validating its settings
    pub fn for_component<C: Into<String>>(component: C, error: ConfigurationError) -> Self {
        Self::InvalidComponent {
            component: component.into(),
            source: Box::new(error),
        }
    }

    /// Create a load error
    pub fn load_error<E: Into<String>, R: std::fmt::Display>(environment: E, error: R) -> Self {
        Self::LoadError {
            environment: environment.into(),
            error: error.to_string(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigurationError>;

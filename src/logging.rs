//! # Structured Logging Module
//!
//! Environment-aware structured logging on `tracing-subscriber`. Console output
//! is human-readable by default or one JSON object per line when
//! `MALL_LOG_FORMAT=json` (or `logging.format = "json"`) is set.

use crate::config::{ConfigManager, LogFormat, LoggingConfig};
use crate::constants::env as env_vars;
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging from environment variables alone
pub fn init_structured_logging() {
    let environment = ConfigManager::detect_environment();
    let config = LoggingConfig {
        format: format_from_env().unwrap_or_default(),
        level: None,
    };
    init_logging(&environment, &config);
}

/// Initialize structured logging for `environment`
///
/// Only the first call in a process has an effect. `RUST_LOG` overrides the
/// configured level, and `MALL_LOG_FORMAT` overrides the configured format.
pub fn init_logging(environment: &str, config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let log_level = config
            .level
            .clone()
            .unwrap_or_else(|| get_log_level(environment).to_string());
        let format = format_from_env().unwrap_or(config.format);

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

        let result = match format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_current_span(true)
                        .with_filter(filter),
                )
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_level(true)
                        .with_filter(filter),
                )
                .try_init(),
        };

        // A global subscriber may already be installed by the host application
        if result.is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            log_level = %log_level,
            format = ?format,
            "Structured logging initialized"
        );
    });
}

fn format_from_env() -> Option<LogFormat> {
    match std::env::var(env_vars::LOG_FORMAT).ok()?.to_lowercase().as_str() {
        "json" => Some(LogFormat::Json),
        "pretty" | "text" => Some(LogFormat::Pretty),
        _ => None,
    }
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for message publish/consume operations
pub fn log_message_operation(
    operation: &str,
    queue: &str,
    message_key: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        queue = %queue,
        message_key = message_key,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "MESSAGE_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}

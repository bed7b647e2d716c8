#![allow(clippy::doc_markdown)] // Allow technical terms like RabbitMQ, Elasticsearch in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Mall Resilience
//!
//! Fault-tolerance layer for the mall services: circuit breakers in front of
//! the search index, the cache, the message broker and the order service, with
//! a degraded path for each.
//!
//! ## Overview
//!
//! Every protected dependency gets a count-based sliding-window circuit
//! breaker. While a dependency keeps failing (or answering slowly) its breaker
//! opens, calls stop reaching it, and a fallback answers instead:
//!
//! - Product search falls back to the product repository
//! - Cache reads become misses and cache writes become no-ops
//! - Order messages are logged for later recovery instead of published
//! - Order processing failures are re-raised so the broker redelivers
//!
//! After a configured wait the breaker lets a few trial calls through and
//! closes again once they succeed.
//!
//! ## Module Organization
//!
//! - [`resilience`] - Circuit breaker state machine, guarded executors, registry, metrics
//! - [`messaging`] - Order create/cancel messages, senders and receiver
//! - [`cache`] - Breaker-protected cache facade
//! - [`search`] - Breaker-protected product search
//! - [`config`] - Layered configuration loading
//! - [`logging`] - Structured logging setup
//! - [`system_context`] - Configuration and breakers bundled for a service
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mall_resilience::constants::components;
//! use mall_resilience::resilience::execute_with_fallback;
//! use mall_resilience::SystemContext;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let context = SystemContext::new()?;
//! if let Some(breaker) = context.breaker_for(components::SEARCH_INDEX) {
//!     let hits = execute_with_fallback(
//!         &breaker,
//!         || Err::<Vec<String>, _>("index unavailable"),
//!         Vec::new,
//!     );
//!     assert!(hits.is_empty());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod resilience;
pub mod search;
pub mod system_context;

pub use config::{ConfigManager, MallConfig};
pub use error::{MallError, Result};
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerManager,
    CircuitState,
};
pub use system_context::SystemContext;

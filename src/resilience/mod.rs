//! # Resilience Module
//!
//! Circuit breakers and guarded execution for calls to the external
//! dependencies of the mall services: the product search index, the cache,
//! the message broker and the order service.
//!
//! ## Architecture
//!
//! - **Circuit Breakers**: per-dependency Closed/Open/Half-Open state machine
//!   over a count-based sliding window of failure and slow-call outcomes
//! - **Guarded Executor**: runs work behind a breaker, falling back on denial
//!   or failure
//! - **Manager**: registry of breakers by dependency name, built at startup
//! - **Metrics**: per-breaker and system-wide snapshots
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mall_resilience::resilience::{execute_with_fallback, CircuitBreaker, CircuitBreakerConfig};
//!
//! let breaker = CircuitBreaker::new("search-index", CircuitBreakerConfig::for_search_index());
//!
//! let hits = execute_with_fallback(
//!     &breaker,
//!     || Err::<Vec<String>, _>("index unavailable"),
//!     Vec::new,
//! );
//! assert!(hits.is_empty());
//! ```

pub mod circuit_breaker;
pub mod clock;
pub mod config;
pub mod executor;
pub mod manager;
pub mod metrics;
pub mod window;

pub use circuit_breaker::{CallPermit, CircuitBreaker, CircuitBreakerError, CircuitState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use executor::{
    execute, execute_async, execute_with_fallback, execute_with_fallback_async,
    try_execute_with_fallback, try_execute_with_fallback_async,
};
pub use manager::CircuitBreakerManager;
pub use metrics::{CircuitBreakerMetrics, SystemCircuitBreakerMetrics};
pub use window::{CallOutcome, OutcomeKind, SlidingWindow};

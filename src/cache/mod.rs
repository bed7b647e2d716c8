//! # Protected Cache
//!
//! [`CircuitBreakerCache`] wraps a [`CacheStore`] with the cache circuit
//! breaker. The cache is an optimisation, so a degraded cache never fails
//! the caller:
//!
//! - `get()` returns `Ok(None)` (cache miss)
//! - `set()` / `delete()` return `Ok(())` (no-op)
//! - `health_check()` returns `Ok(false)` (unhealthy)
//!
//! This applies both when the breaker is open and when the store call fails.
//! Without a breaker, calls pass straight through and errors propagate.

use crate::constants::components;
use crate::resilience::{
    execute_with_fallback_async, CircuitBreaker, CircuitBreakerManager, CircuitState,
};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to connect to cache backend
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    /// Cache operation timed out
    #[error("Cache operation timed out: {0}")]
    Timeout(String),

    /// Generic backend error
    #[error("Cache backend error: {0}")]
    BackendError(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Operations on a distributed cache backend
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// `Ok(Some(value))` on hit, `Ok(None)` on miss
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    async fn health_check(&self) -> CacheResult<bool>;

    fn provider_name(&self) -> &'static str;
}

/// Circuit breaker protected cache
#[derive(Debug, Clone)]
pub struct CircuitBreakerCache {
    inner: Arc<dyn CacheStore>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl CircuitBreakerCache {
    pub fn new(store: Arc<dyn CacheStore>, circuit_breaker: Option<Arc<CircuitBreaker>>) -> Self {
        Self {
            inner: store,
            circuit_breaker,
        }
    }

    /// Use the manager's cache breaker, if breakers are enabled
    pub fn from_manager(store: Arc<dyn CacheStore>, manager: &CircuitBreakerManager) -> Self {
        Self::new(store, manager.breaker_for(components::CACHE))
    }

    /// `None` if no circuit breaker is configured
    pub fn circuit_state(&self) -> Option<CircuitState> {
        self.circuit_breaker.as_ref().map(|cb| cb.state())
    }

    pub fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    /// Get a value from cache; degraded cache reads as a miss
    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let Some(cb) = &self.circuit_breaker else {
            return self.inner.get(key).await;
        };

        Ok(execute_with_fallback_async(
            cb,
            || self.inner.get(key),
            || async { None },
        )
        .await)
    }

    /// Set a value in cache with TTL; skipped when the cache is degraded
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let Some(cb) = &self.circuit_breaker else {
            return self.inner.set(key, value, ttl).await;
        };

        execute_with_fallback_async(cb, || self.inner.set(key, value, ttl), || async {}).await;
        Ok(())
    }

    /// Delete a specific key; skipped when the cache is degraded
    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        let Some(cb) = &self.circuit_breaker else {
            return self.inner.delete(key).await;
        };

        execute_with_fallback_async(cb, || self.inner.delete(key), || async {}).await;
        Ok(())
    }

    /// Health check the cache backend; an unhealthy answer counts as a failure
    pub async fn health_check(&self) -> CacheResult<bool> {
        let Some(cb) = &self.circuit_breaker else {
            return self.inner.health_check().await;
        };

        Ok(execute_with_fallback_async(
            cb,
            || async {
                match self.inner.health_check().await {
                    Ok(true) => Ok(true),
                    Ok(false) => Err(CacheError::BackendError(
                        "health check reported unhealthy".to_string(),
                    )),
                    Err(e) => Err(e),
                }
            },
            || async { false },
        )
        .await)
    }

    /// Get the circuit breaker (for metrics/monitoring)
    pub fn circuit_breaker(&self) -> Option<&Arc<CircuitBreaker>> {
        self.circuit_breaker.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitBreakerConfig;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct FlakyStore {
        entries: tokio::sync::Mutex<HashMap<String, String>>,
        down: AtomicBool,
        calls: AtomicUsize,
    }

    impl FlakyStore {
        fn check(&self) -> CacheResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.down.load(Ordering::SeqCst) {
                return Err(CacheError::ConnectionError("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CacheStore for FlakyStore {
        async fn get(&self, key: &str) -> CacheResult<Option<String>> {
            self.check()?;
            Ok(self.entries.lock().await.get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str, _ttl: Duration) -> CacheResult<()> {
            self.check()?;
            self.entries
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> CacheResult<()> {
            self.check()?;
            self.entries.lock().await.remove(key);
            Ok(())
        }

        async fn health_check(&self) -> CacheResult<bool> {
            self.check()?;
            Ok(true)
        }

        fn provider_name(&self) -> &'static str {
            "flaky"
        }
    }

    fn cache_breaker() -> Arc<CircuitBreaker> {
        Arc::new(CircuitBreaker::new(
            components::CACHE,
            CircuitBreakerConfig::for_cache(),
        ))
    }

    #[tokio::test]
    async fn test_round_trip_when_healthy() {
        let store = Arc::new(FlakyStore::default());
        let cache = CircuitBreakerCache::new(store, Some(cache_breaker()));

        cache
            .set("product:26", "{\"name\":\"phone\"}", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            cache.get("product:26").await.unwrap().as_deref(),
            Some("{\"name\":\"phone\"}")
        );
        assert!(cache.health_check().await.unwrap());
        assert_eq!(cache.circuit_state(), Some(CircuitState::Closed));
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_miss() {
        let store = Arc::new(FlakyStore::default());
        store.down.store(true, Ordering::SeqCst);
        let breaker = cache_breaker();
        let cache = CircuitBreakerCache::new(store, Some(breaker.clone()));

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.set("k", "v", Duration::from_secs(1)).await.is_ok());
        assert!(cache.delete("k").await.is_ok());
        assert!(!cache.health_check().await.unwrap());
        assert_eq!(breaker.metrics().failure_count, 4);
    }

    #[tokio::test]
    async fn test_open_circuit_skips_store() {
        let store = Arc::new(FlakyStore::default());
        let breaker = cache_breaker();
        breaker.force_open();
        let cache = CircuitBreakerCache::new(store.clone(), Some(breaker));

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(!cache.health_check().await.unwrap());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_without_breaker_errors_propagate() {
        let store = Arc::new(FlakyStore::default());
        store.down.store(true, Ordering::SeqCst);
        let cache = CircuitBreakerCache::new(store, None);

        assert!(cache.circuit_state().is_none());
        assert!(matches!(
            cache.get("k").await,
            Err(CacheError::ConnectionError(_))
        ));
    }
}

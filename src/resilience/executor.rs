//! # Guarded Executor
//!
//! Runs a unit of work behind a [`CircuitBreaker`] and routes denials and
//! failures to a fallback.
//!
//! | function                          | denied                      | work fails                         |
//! |-----------------------------------|-----------------------------|------------------------------------|
//! | [`execute`]                       | `Err(CallNotPermitted)`     | `Err(OperationFailed(e))`          |
//! | [`execute_with_fallback`]         | `fallback()`                | logged, then `fallback()`          |
//! | [`try_execute_with_fallback`]     | `fallback()?`               | logged, then `fallback()?`         |
//!
//! Each has an `_async` counterpart taking closures that return futures.
//! Every failure of the work is recorded before the fallback runs; the
//! fallback itself is never recorded, retried, or protected by the breaker.

use crate::resilience::{CircuitBreaker, CircuitBreakerError};
use std::fmt::Display;
use std::future::Future;
use tracing::{error, warn};

/// Run `work` behind `breaker`, re-raising the failure without a fallback
///
/// A denial is logged and returned as [`CircuitBreakerError::CallNotPermitted`].
/// A work failure is recorded and returned as
/// [`CircuitBreakerError::OperationFailed`] carrying the original error.
pub fn execute<T, E, W>(breaker: &CircuitBreaker, work: W) -> Result<T, CircuitBreakerError<E>>
where
    W: FnOnce() -> Result<T, E>,
{
    let result = run_guarded(breaker, work);
    if let Err(CircuitBreakerError::CallNotPermitted { component, state }) = &result {
        warn!(component = %component, state = %state, "Circuit breaker open, call rejected");
    }
    result
}

/// Run `work` behind `breaker`, substituting `fallback()` on denial or failure
pub fn execute_with_fallback<T, E, W, F>(breaker: &CircuitBreaker, work: W, fallback: F) -> T
where
    W: FnOnce() -> Result<T, E>,
    E: Display,
    F: FnOnce() -> T,
{
    match run_guarded(breaker, work) {
        Ok(value) => value,
        Err(err) => {
            log_fallback(breaker, &err);
            fallback()
        }
    }
}

/// Like [`execute_with_fallback`], but the fallback may fail
///
/// The fallback's error is returned to the caller unmodified.
pub fn try_execute_with_fallback<T, E, FE, W, F>(
    breaker: &CircuitBreaker,
    work: W,
    fallback: F,
) -> Result<T, FE>
where
    W: FnOnce() -> Result<T, E>,
    E: Display,
    F: FnOnce() -> Result<T, FE>,
{
    match run_guarded(breaker, work) {
        Ok(value) => Ok(value),
        Err(err) => {
            log_fallback(breaker, &err);
            fallback()
        }
    }
}

/// Async counterpart of [`execute`]
pub async fn execute_async<T, E, W, Fut>(
    breaker: &CircuitBreaker,
    work: W,
) -> Result<T, CircuitBreakerError<E>>
where
    W: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let result = run_guarded_async(breaker, work).await;
    if let Err(CircuitBreakerError::CallNotPermitted { component, state }) = &result {
        warn!(component = %component, state = %state, "Circuit breaker open, call rejected");
    }
    result
}

/// Async counterpart of [`execute_with_fallback`]
pub async fn execute_with_fallback_async<T, E, W, Fut, F, FFut>(
    breaker: &CircuitBreaker,
    work: W,
    fallback: F,
) -> T
where
    W: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    F: FnOnce() -> FFut,
    FFut: Future<Output = T>,
{
    match run_guarded_async(breaker, work).await {
        Ok(value) => value,
        Err(err) => {
            log_fallback(breaker, &err);
            fallback().await
        }
    }
}

/// Async counterpart of [`try_execute_with_fallback`]
pub async fn try_execute_with_fallback_async<T, E, FE, W, Fut, F, FFut>(
    breaker: &CircuitBreaker,
    work: W,
    fallback: F,
) -> Result<T, FE>
where
    W: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    F: FnOnce() -> FFut,
    FFut: Future<Output = Result<T, FE>>,
{
    match run_guarded_async(breaker, work).await {
        Ok(value) => Ok(value),
        Err(err) => {
            log_fallback(breaker, &err);
            fallback().await
        }
    }
}

fn run_guarded<T, E, W>(breaker: &CircuitBreaker, work: W) -> Result<T, CircuitBreakerError<E>>
where
    W: FnOnce() -> Result<T, E>,
{
    let Some(permit) = breaker.allow() else {
        return Err(breaker.not_permitted_error());
    };

    let started = breaker.now();
    let result = work();
    let duration = breaker.now().saturating_duration_since(started);

    permit.record(breaker.classify(result.is_ok(), duration));
    result.map_err(CircuitBreakerError::OperationFailed)
}

async fn run_guarded_async<T, E, W, Fut>(
    breaker: &CircuitBreaker,
    work: W,
) -> Result<T, CircuitBreakerError<E>>
where
    W: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let Some(permit) = breaker.allow() else {
        return Err(breaker.not_permitted_error());
    };

    let started = breaker.now();
    let result = work().await;
    let duration = breaker.now().saturating_duration_since(started);

    permit.record(breaker.classify(result.is_ok(), duration));
    result.map_err(CircuitBreakerError::OperationFailed)
}

fn log_fallback<E: Display>(breaker: &CircuitBreaker, err: &CircuitBreakerError<E>) {
    match err {
        CircuitBreakerError::CallNotPermitted { component, state } => warn!(
            component = %component,
            state = %state,
            "Circuit breaker open, executing fallback"
        ),
        CircuitBreakerError::OperationFailed(e) => error!(
            component = %breaker.name(),
            error = %e,
            "Operation failed, executing fallback"
        ),
    }
}

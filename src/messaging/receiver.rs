//! # Order Create Receiver
//!
//! Consumer side of asynchronous order creation. Each message is handed to an
//! [`OrderProcessor`] supplied by the host application; any failure is logged
//! and returned so the broker redelivers the message.
//!
//! With an order-service breaker the processor runs through the no-fallback
//! executor: a denied call surfaces as
//! [`MessagingError::CircuitBreakerOpen`] and is redelivered like any other
//! failure.

use super::errors::MessagingError;
use super::message::OrderCreateMessage;
use crate::constants::{components, consumers};
use crate::logging::log_error;
use crate::resilience::{execute_async, CircuitBreaker, CircuitBreakerError, CircuitBreakerManager};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::info;

/// Business logic that turns an order create request into an order
#[async_trait]
pub trait OrderProcessor: Send + Sync + Debug {
    async fn process_order_create(&self, message: &OrderCreateMessage) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct OrderCreateReceiver {
    processor: Arc<dyn OrderProcessor>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl OrderCreateReceiver {
    pub fn new(
        processor: Arc<dyn OrderProcessor>,
        circuit_breaker: Option<Arc<CircuitBreaker>>,
    ) -> Self {
        Self {
            processor,
            circuit_breaker,
        }
    }

    /// Use the manager's order-service breaker, if breakers are enabled
    pub fn from_manager(processor: Arc<dyn OrderProcessor>, manager: &CircuitBreakerManager) -> Self {
        Self::new(processor, manager.breaker_for(components::ORDER_SERVICE))
    }

    /// Process one order create message
    pub async fn handle(&self, message: &OrderCreateMessage) -> Result<(), MessagingError> {
        let request_id = message.request_id;
        info!(request_id = %request_id, "Processing order create message");

        let result = match &self.circuit_breaker {
            Some(breaker) => execute_async(breaker, || {
                self.processor.process_order_create(message)
            })
            .await
            .map_err(|err| match err {
                CircuitBreakerError::CallNotPermitted { component, .. } => {
                    MessagingError::circuit_breaker_open(component)
                }
                CircuitBreakerError::OperationFailed(e) => {
                    MessagingError::processing(request_id, format!("{e:#}"))
                }
            }),
            None => self
                .processor
                .process_order_create(message)
                .await
                .map_err(|e| MessagingError::processing(request_id, format!("{e:#}"))),
        };

        match &result {
            Ok(()) => info!(request_id = %request_id, "Order create message processed"),
            Err(e) => log_error(
                consumers::ORDER_CREATE_RECEIVER,
                "handle",
                &e.to_string(),
                Some(&format!("request_id={request_id}")),
            ),
        }

        result
    }

    /// Decode a raw queue payload and process it
    pub async fn handle_payload(&self, payload: &Value) -> Result<(), MessagingError> {
        let message: OrderCreateMessage = serde_json::from_value(payload.clone())?;
        self.handle(&message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::test_support::CapturedLogs;
    use crate::resilience::CircuitBreakerConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingProcessor {
        processed: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl OrderProcessor for CountingProcessor {
        async fn process_order_create(&self, _message: &OrderCreateMessage) -> anyhow::Result<()> {
            self.processed.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("stock lock failed");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_successful_processing() {
        let processor = Arc::new(CountingProcessor::default());
        let receiver = OrderCreateReceiver::new(processor.clone(), None);

        receiver
            .handle(&OrderCreateMessage::new(1, 2, 0, vec![5]))
            .await
            .unwrap();
        assert_eq!(processor.processed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_reraised_and_recorded() {
        let processor = Arc::new(CountingProcessor {
            fail: true,
            ..CountingProcessor::default()
        });
        let breaker = Arc::new(CircuitBreaker::new(
            components::ORDER_SERVICE,
            CircuitBreakerConfig::for_order_service(),
        ));
        let receiver = OrderCreateReceiver::new(processor, Some(breaker.clone()));

        let err = receiver
            .handle(&OrderCreateMessage::new(1, 2, 0, vec![5]))
            .await
            .unwrap_err();

        assert!(matches!(err, MessagingError::Processing { ref message, .. } if message.contains("stock lock failed")));
        assert_eq!(breaker.metrics().failure_count, 1);
    }

    #[tokio::test]
    async fn test_open_breaker_rejects_without_processing() {
        let processor = Arc::new(CountingProcessor::default());
        let breaker = Arc::new(CircuitBreaker::new(
            components::ORDER_SERVICE,
            CircuitBreakerConfig::for_order_service(),
        ));
        breaker.force_open();
        let receiver = OrderCreateReceiver::new(processor.clone(), Some(breaker));

        let err = receiver
            .handle(&OrderCreateMessage::new(1, 2, 0, vec![5]))
            .await
            .unwrap_err();

        assert!(matches!(err, MessagingError::CircuitBreakerOpen { .. }));
        assert_eq!(processor.processed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_deserialization_error() {
        let receiver = OrderCreateReceiver::new(Arc::new(CountingProcessor::default()), None);

        let err = receiver
            .handle_payload(&serde_json::json!({ "memberId": "not a number" }))
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::MessageDeserialization { .. }));
    }

    #[tokio::test]
    async fn test_failure_is_logged_with_receiver_component() {
        let logs = CapturedLogs::default();
        let receiver = OrderCreateReceiver::new(
            Arc::new(CountingProcessor {
                fail: true,
                ..CountingProcessor::default()
            }),
            None,
        );
        let message = OrderCreateMessage::new(1, 2, 0, vec![5]);

        {
            let _guard = logs.install();
            assert!(receiver.handle(&message).await.is_err());
        }

        let errors = logs.lines_at("ERROR");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains(&format!("component={}", consumers::ORDER_CREATE_RECEIVER)));
        assert!(errors[0].contains(&message.request_id.to_string()));
    }
}

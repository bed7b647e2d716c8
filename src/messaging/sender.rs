//! # Order Message Senders
//!
//! Producers for order lifecycle messages, guarded by the broker circuit
//! breaker. When the breaker denies the publish or the publish fails, the
//! message is not sent: the fallback logs the identifiers needed to recover
//! it and the send reports [`SendStatus::Deferred`].
//!
//! Without a breaker (breakers disabled) messages are published directly and
//! publish errors propagate.

use super::client::{MessagePublisher, OutboundMessage};
use super::errors::MessagingError;
use super::message::OrderCreateMessage;
use super::queues::QueueDescriptor;
use crate::constants::components;
use crate::logging::log_message_operation;
use crate::resilience::{execute_with_fallback_async, CircuitBreaker, CircuitBreakerManager};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Result of a guarded send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendStatus {
    /// Accepted by the broker
    Sent,
    /// Not published; the fallback logged it for later recovery
    Deferred,
}

impl SendStatus {
    pub fn is_sent(self) -> bool {
        matches!(self, SendStatus::Sent)
    }
}

/// Producer for asynchronous order creation
#[derive(Debug, Clone)]
pub struct OrderCreateSender {
    publisher: Arc<dyn MessagePublisher>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl OrderCreateSender {
    pub fn new(
        publisher: Arc<dyn MessagePublisher>,
        circuit_breaker: Option<Arc<CircuitBreaker>>,
    ) -> Self {
        Self {
            publisher,
            circuit_breaker,
        }
    }

    /// Use the manager's broker breaker, if breakers are enabled
    pub fn from_manager(publisher: Arc<dyn MessagePublisher>, manager: &CircuitBreakerManager) -> Self {
        Self::new(publisher, manager.breaker_for(components::BROKER))
    }

    /// Publish an order create request to the order-create queue
    pub async fn send_message(
        &self,
        message: &OrderCreateMessage,
    ) -> Result<SendStatus, MessagingError> {
        let payload = serde_json::to_value(message)?;
        let outbound = OutboundMessage::to(&QueueDescriptor::ORDER_CREATE, payload);

        let Some(breaker) = &self.circuit_breaker else {
            self.publisher.publish(outbound).await?;
            log_sent(&QueueDescriptor::ORDER_CREATE, &message.request_id.to_string());
            return Ok(SendStatus::Sent);
        };

        let status = execute_with_fallback_async(
            breaker,
            move || async move {
                self.publisher.publish(outbound).await?;
                log_sent(&QueueDescriptor::ORDER_CREATE, &message.request_id.to_string());
                Ok::<_, MessagingError>(SendStatus::Sent)
            },
            || async {
                error!(
                    request_id = %message.request_id,
                    member_id = message.member_id,
                    "Broker unavailable, order create message not sent"
                );
                warn!(
                    request_id = %message.request_id,
                    "Order create request must be recorded for later processing"
                );
                SendStatus::Deferred
            },
        )
        .await;

        Ok(status)
    }
}

/// Producer for delayed order cancellation
///
/// Publishes the order id to the TTL queue with the delay as per-message
/// expiration; the broker dead-letters it into the cancel queue afterwards.
#[derive(Debug, Clone)]
pub struct CancelOrderSender {
    publisher: Arc<dyn MessagePublisher>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl CancelOrderSender {
    pub fn new(
        publisher: Arc<dyn MessagePublisher>,
        circuit_breaker: Option<Arc<CircuitBreaker>>,
    ) -> Self {
        Self {
            publisher,
            circuit_breaker,
        }
    }

    pub fn from_manager(publisher: Arc<dyn MessagePublisher>, manager: &CircuitBreakerManager) -> Self {
        Self::new(publisher, manager.breaker_for(components::BROKER))
    }

    /// Schedule cancellation of `order_id` after `delay`
    pub async fn send_message(
        &self,
        order_id: i64,
        delay: Duration,
    ) -> Result<SendStatus, MessagingError> {
        let outbound = OutboundMessage::to(
            &QueueDescriptor::ORDER_CANCEL_TTL,
            serde_json::Value::from(order_id),
        )
        .with_expiration(delay);
        let delay_ms = delay.as_millis() as u64;

        let Some(breaker) = &self.circuit_breaker else {
            self.publisher.publish(outbound).await?;
            log_sent(&QueueDescriptor::ORDER_CANCEL_TTL, &order_id.to_string());
            return Ok(SendStatus::Sent);
        };

        let status = execute_with_fallback_async(
            breaker,
            move || async move {
                self.publisher.publish(outbound).await?;
                log_sent(&QueueDescriptor::ORDER_CANCEL_TTL, &order_id.to_string());
                Ok::<_, MessagingError>(SendStatus::Sent)
            },
            || async {
                warn!(
                    order_id,
                    delay_ms, "Broker unavailable, order cancel message not sent"
                );
                warn!(
                    order_id,
                    "Order cancellation must be recorded for later processing"
                );
                SendStatus::Deferred
            },
        )
        .await;

        Ok(status)
    }
}

fn log_sent(queue: &QueueDescriptor, message_key: &str) {
    log_message_operation("publish", queue.name, Some(message_key), "sent", None);
}

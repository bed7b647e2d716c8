//! # Message Publisher
//!
//! The publishing seam between order messaging and a concrete broker, plus an
//! in-memory broker for tests and local development.
//!
//! The in-memory broker routes by `(exchange, routing_key)` to a bound queue,
//! keeps the per-message expiration it was given, and can be switched offline
//! to simulate an outage.

use super::errors::MessagingError;
use super::queues::QueueDescriptor;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// A message ready to hand to the broker
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub exchange: String,
    pub routing_key: String,
    pub payload: Value,
    /// Per-message time-to-live; used for delayed delivery through TTL queues
    pub expiration: Option<Duration>,
}

impl OutboundMessage {
    pub fn to(queue: &QueueDescriptor, payload: Value) -> Self {
        Self {
            exchange: queue.exchange.to_string(),
            routing_key: queue.routing_key.to_string(),
            payload,
            expiration: None,
        }
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

/// Publishes messages to a broker
#[async_trait]
pub trait MessagePublisher: Send + Sync + Debug {
    async fn publish(&self, message: OutboundMessage) -> Result<(), MessagingError>;

    fn publisher_name(&self) -> &'static str;
}

/// Message stored in an in-memory queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    pub id: u64,
    pub payload: Value,
    pub expiration: Option<Duration>,
    pub enqueued_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default)]
struct BrokerState {
    /// (exchange, routing key) -> queue name
    bindings: HashMap<(String, String), String>,
    queues: HashMap<String, VecDeque<QueuedMessage>>,
}

/// In-memory broker for testing
#[derive(Debug)]
pub struct InMemoryBroker {
    state: tokio::sync::Mutex<BrokerState>,
    next_id: AtomicU64,
    available: AtomicBool,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self {
            state: tokio::sync::Mutex::new(BrokerState::default()),
            next_id: AtomicU64::new(1),
            available: AtomicBool::new(true),
        }
    }

    /// Broker with the order cancel, order cancel TTL and order create queues bound
    pub async fn with_order_queues() -> Self {
        let broker = Self::new();
        for queue in QueueDescriptor::ALL {
            broker.bind(&queue).await;
        }
        broker
    }

    /// Bind a queue to its exchange and routing key
    pub async fn bind(&self, queue: &QueueDescriptor) {
        let mut state = self.state.lock().await;
        state.bindings.insert(
            (queue.exchange.to_string(), queue.routing_key.to_string()),
            queue.name.to_string(),
        );
        state.queues.entry(queue.name.to_string()).or_default();
    }

    /// Simulate the broker going down (`false`) or coming back (`true`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Pop the oldest message from a queue
    pub async fn receive(&self, queue_name: &str) -> Result<Option<QueuedMessage>, MessagingError> {
        let mut state = self.state.lock().await;
        let queue = state
            .queues
            .get_mut(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;
        Ok(queue.pop_front())
    }

    /// Number of messages waiting in a queue
    pub async fn queue_depth(&self, queue_name: &str) -> Result<usize, MessagingError> {
        let state = self.state.lock().await;
        state
            .queues
            .get(queue_name)
            .map(VecDeque::len)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryBroker {
    async fn publish(&self, message: OutboundMessage) -> Result<(), MessagingError> {
        if !self.is_available() {
            return Err(MessagingError::broker_unavailable(
                "in-memory broker is offline",
            ));
        }

        let mut state = self.state.lock().await;
        let key = (message.exchange.clone(), message.routing_key.clone());
        let queue_name = state
            .bindings
            .get(&key)
            .cloned()
            .ok_or_else(|| MessagingError::unroutable(&message.routing_key))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        state
            .queues
            .entry(queue_name.clone())
            .or_default()
            .push_back(QueuedMessage {
                id,
                payload: message.payload,
                expiration: message.expiration,
                enqueued_at: chrono::Utc::now(),
            });

        debug!(queue = %queue_name, msg_id = id, "Message enqueued");
        Ok(())
    }

    fn publisher_name(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_routes_by_exchange_and_routing_key() {
        let broker = InMemoryBroker::with_order_queues().await;

        broker
            .publish(
                OutboundMessage::to(&QueueDescriptor::ORDER_CANCEL_TTL, json!(42))
                    .with_expiration(Duration::from_millis(1500)),
            )
            .await
            .unwrap();

        assert_eq!(
            broker
                .queue_depth(QueueDescriptor::ORDER_CANCEL_TTL.name)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            broker
                .queue_depth(QueueDescriptor::ORDER_CANCEL.name)
                .await
                .unwrap(),
            0
        );

        let message = broker
            .receive(QueueDescriptor::ORDER_CANCEL_TTL.name)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.payload, json!(42));
        assert_eq!(message.expiration, Some(Duration::from_millis(1500)));
    }

    #[tokio::test]
    async fn test_unbound_routing_key_is_rejected() {
        let broker = InMemoryBroker::new();
        let err = broker
            .publish(OutboundMessage::to(&QueueDescriptor::ORDER_CREATE, json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::Unroutable { .. }));
    }

    #[tokio::test]
    async fn test_offline_broker_fails_publish() {
        let broker = InMemoryBroker::with_order_queues().await;
        broker.set_available(false);

        let err = broker
            .publish(OutboundMessage::to(&QueueDescriptor::ORDER_CREATE, json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::BrokerUnavailable { .. }));
    }
}

//! # Messaging Error Types
//!
//! Structured errors for publishing and consuming order lifecycle messages.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Message serialization error: {message}")]
    MessageSerialization { message: String },

    #[error("Message deserialization error: {message}")]
    MessageDeserialization { message: String },

    #[error("No queue bound to routing key: {routing_key}")]
    Unroutable { routing_key: String },

    #[error("Queue not found: {queue_name}")]
    QueueNotFound { queue_name: String },

    #[error("Broker unavailable: {message}")]
    BrokerUnavailable { message: String },

    #[error("Circuit breaker is open for component: {component}")]
    CircuitBreakerOpen { component: String },

    #[error("Order create processing failed for request {request_id}: {message}")]
    Processing { request_id: String, message: String },
}

impl MessagingError {
    pub fn message_serialization(message: impl Into<String>) -> Self {
        Self::MessageSerialization {
            message: message.into(),
        }
    }

    pub fn message_deserialization(message: impl Into<String>) -> Self {
        Self::MessageDeserialization {
            message: message.into(),
        }
    }

    pub fn unroutable(routing_key: impl Into<String>) -> Self {
        Self::Unroutable {
            routing_key: routing_key.into(),
        }
    }

    pub fn queue_not_found(queue_name: impl Into<String>) -> Self {
        Self::QueueNotFound {
            queue_name: queue_name.into(),
        }
    }

    pub fn broker_unavailable(message: impl Into<String>) -> Self {
        Self::BrokerUnavailable {
            message: message.into(),
        }
    }

    pub fn circuit_breaker_open(component: impl Into<String>) -> Self {
        Self::CircuitBreakerOpen {
            component: component.into(),
        }
    }

    pub fn processing(request_id: impl ToString, message: impl Into<String>) -> Self {
        Self::Processing {
            request_id: request_id.to_string(),
            message: message.into(),
        }
    }
}

/// Conversion from serde_json::Error to MessagingError
impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            MessagingError::message_deserialization(err.to_string())
        } else {
            MessagingError::message_serialization(err.to_string())
        }
    }
}

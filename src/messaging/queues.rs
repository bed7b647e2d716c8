//! Exchange, queue and routing key triples for order lifecycle messaging.

use crate::constants::queues;
use serde::Serialize;

/// Where a message is published and which queue receives it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct QueueDescriptor {
    pub exchange: &'static str,
    pub name: &'static str,
    pub routing_key: &'static str,
}

impl QueueDescriptor {
    /// Order cancellation, consumed once the TTL queue dead-letters into it
    pub const ORDER_CANCEL: QueueDescriptor = QueueDescriptor {
        exchange: queues::ORDER_EXCHANGE,
        name: queues::ORDER_CANCEL_QUEUE,
        routing_key: queues::ORDER_CANCEL_ROUTING_KEY,
    };

    /// Delay queue for order cancellation; messages carry a per-message expiration
    pub const ORDER_CANCEL_TTL: QueueDescriptor = QueueDescriptor {
        exchange: queues::ORDER_TTL_EXCHANGE,
        name: queues::ORDER_CANCEL_TTL_QUEUE,
        routing_key: queues::ORDER_CANCEL_TTL_ROUTING_KEY,
    };

    /// Asynchronous order creation
    pub const ORDER_CREATE: QueueDescriptor = QueueDescriptor {
        exchange: queues::ORDER_CREATE_EXCHANGE,
        name: queues::ORDER_CREATE_QUEUE,
        routing_key: queues::ORDER_CREATE_ROUTING_KEY,
    };

    pub const ALL: [QueueDescriptor; 3] = [
        Self::ORDER_CANCEL,
        Self::ORDER_CANCEL_TTL,
        Self::ORDER_CREATE,
    ];
}

//! # Messaging Module
//!
//! Order lifecycle messaging for the portal: the order-create and delayed
//! order-cancel producers, the order-create consumer, and the broker seam
//! they publish through. Producers are guarded by the broker circuit breaker,
//! the consumer by the order-service breaker.

pub mod client;
pub mod errors;
pub mod message;
pub mod queues;
pub mod receiver;
pub mod sender;

pub use client::{InMemoryBroker, MessagePublisher, OutboundMessage, QueuedMessage};
pub use errors::MessagingError;
pub use message::OrderCreateMessage;
pub use queues::QueueDescriptor;
pub use receiver::{OrderCreateReceiver, OrderProcessor};
pub use sender::{CancelOrderSender, OrderCreateSender, SendStatus};

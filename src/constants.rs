//! # System Constants
//!
//! Names shared between configuration, the breaker registry and the
//! dependency adapters.

/// Names of the dependencies protected by circuit breakers
pub mod components {
    /// Product full-text search index
    pub const SEARCH_INDEX: &str = "search-index";
    /// Distributed cache
    pub const CACHE: &str = "cache";
    /// Message broker
    pub const BROKER: &str = "broker";
    /// Downstream order service invoked by the order-create consumer
    pub const ORDER_SERVICE: &str = "order-service";

    pub const ALL: [&str; 4] = [SEARCH_INDEX, CACHE, BROKER, ORDER_SERVICE];
}

/// Log component names for message consumers
pub mod consumers {
    pub const ORDER_CREATE_RECEIVER: &str = "order-create-receiver";
}

/// Exchange, queue and routing key names for order lifecycle messaging
pub mod queues {
    pub const ORDER_EXCHANGE: &str = "mall.order.direct";
    pub const ORDER_CANCEL_QUEUE: &str = "mall.order.cancel";
    pub const ORDER_CANCEL_ROUTING_KEY: &str = "mall.order.cancel";

    pub const ORDER_TTL_EXCHANGE: &str = "mall.order.direct.ttl";
    pub const ORDER_CANCEL_TTL_QUEUE: &str = "mall.order.cancel.ttl";
    pub const ORDER_CANCEL_TTL_ROUTING_KEY: &str = "mall.order.cancel.ttl";

    pub const ORDER_CREATE_EXCHANGE: &str = "mall.order.direct";
    pub const ORDER_CREATE_QUEUE: &str = "mall.order.create";
    pub const ORDER_CREATE_ROUTING_KEY: &str = "mall.order.create";
}

/// Environment variable names read at startup
pub mod env {
    /// Prefix for configuration overrides, e.g. `MALL__CIRCUIT_BREAKERS__ENABLED`
    pub const CONFIG_PREFIX: &str = "MALL";
    pub const CONFIG_SEPARATOR: &str = "__";

    pub const ENVIRONMENT: &str = "MALL_ENV";
    pub const FALLBACK_ENVIRONMENT: &str = "APP_ENV";
    pub const LOG_FORMAT: &str = "MALL_LOG_FORMAT";
}

//! Error types for the mall resilience layer.
//!
//! Each concern owns a `thiserror` enum; [`MallError`] aggregates them for
//! callers that deal with more than one.

use crate::cache::CacheError;
use crate::config::ConfigurationError;
use crate::messaging::MessagingError;
use crate::search::SearchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MallError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}

pub type Result<T> = std::result::Result<T, MallError>;

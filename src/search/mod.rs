//! # Protected Product Search
//!
//! Product search goes to the full-text search index first. When the
//! search-index breaker denies the call or the index query fails, the same
//! filters are run against the product repository instead. Keyword matching
//! there is coarser, but search keeps working while the index is down.
//!
//! Repository errors are not masked: the fallback is not protected by the
//! breaker and its failure reaches the caller unchanged.

use crate::constants::components;
use crate::resilience::{try_execute_with_fallback_async, CircuitBreaker, CircuitBreakerManager};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search index error: {0}")]
    Index(String),

    #[error("Product repository error: {0}")]
    Repository(String),
}

/// Product document as stored in the search index
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EsProduct {
    pub id: i64,
    pub product_sn: String,
    pub brand_id: Option<i64>,
    pub brand_name: Option<String>,
    pub product_category_id: Option<i64>,
    pub product_category_name: Option<String>,
    pub name: String,
    pub sub_title: Option<String>,
    pub keywords: Option<String>,
    pub price: f64,
    pub sale: i32,
    pub stock: i32,
}

/// Filters for a product search; unset filters match everything
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductSearchQuery {
    pub keyword: Option<String>,
    pub brand_id: Option<i64>,
    pub product_category_id: Option<i64>,
}

impl ProductSearchQuery {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Some(keyword.into()),
            ..Self::default()
        }
    }

    pub fn with_brand(mut self, brand_id: i64) -> Self {
        self.brand_id = Some(brand_id);
        self
    }

    pub fn with_category(mut self, product_category_id: i64) -> Self {
        self.product_category_id = Some(product_category_id);
        self
    }
}

/// Primary full-text search backend
#[async_trait]
pub trait SearchIndex: Send + Sync + Debug {
    async fn search(&self, query: &ProductSearchQuery) -> Result<Vec<EsProduct>, SearchError>;
}

/// Relational product source used for index imports and degraded search
#[async_trait]
pub trait ProductRepository: Send + Sync + Debug {
    /// Keyword/brand/category query used while the index is unavailable
    async fn search_products(
        &self,
        keyword: Option<&str>,
        brand_id: Option<i64>,
        product_category_id: Option<i64>,
    ) -> Result<Vec<EsProduct>, SearchError>;

    /// Products to import into the index; all of them when `id` is `None`
    async fn get_all_es_products(&self, id: Option<i64>) -> Result<Vec<EsProduct>, SearchError>;
}

/// Search results and whether they came from the degraded path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSearchResult {
    pub products: Vec<EsProduct>,
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub struct ProtectedProductSearch {
    index: Arc<dyn SearchIndex>,
    repository: Arc<dyn ProductRepository>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl ProtectedProductSearch {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        repository: Arc<dyn ProductRepository>,
        circuit_breaker: Option<Arc<CircuitBreaker>>,
    ) -> Self {
        Self {
            index,
            repository,
            circuit_breaker,
        }
    }

    /// Use the manager's search-index breaker, if breakers are enabled
    pub fn from_manager(
        index: Arc<dyn SearchIndex>,
        repository: Arc<dyn ProductRepository>,
        manager: &CircuitBreakerManager,
    ) -> Self {
        Self::new(
            index,
            repository,
            manager.breaker_for(components::SEARCH_INDEX),
        )
    }

    /// Search the index, falling back to the repository
    pub async fn search(&self, query: &ProductSearchQuery) -> Result<ProductSearchResult, SearchError> {
        let Some(breaker) = &self.circuit_breaker else {
            let products = self.index.search(query).await?;
            return Ok(ProductSearchResult {
                products,
                degraded: false,
            });
        };

        try_execute_with_fallback_async(
            breaker,
            || async {
                let products = self.index.search(query).await?;
                Ok::<_, SearchError>(ProductSearchResult {
                    products,
                    degraded: false,
                })
            },
            || async {
                debug!(
                    keyword = ?query.keyword,
                    brand_id = ?query.brand_id,
                    product_category_id = ?query.product_category_id,
                    "Searching products in repository"
                );
                let products = self
                    .repository
                    .search_products(
                        query.keyword.as_deref(),
                        query.brand_id,
                        query.product_category_id,
                    )
                    .await?;
                Ok::<_, SearchError>(ProductSearchResult {
                    products,
                    degraded: true,
                })
            },
        )
        .await
    }

    /// Products to (re)import into the index, read straight from the repository
    pub async fn products_for_indexing(&self, id: Option<i64>) -> Result<Vec<EsProduct>, SearchError> {
        self.repository.get_all_es_products(id).await
    }
}

//! Read/write boundary between the personalization logic and persistence.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::customer::{CustomerId, CustomerRecord};
use crate::domain::health::CustomerHealthData;
use crate::domain::order::CustomerOrderItem;
use crate::domain::pattern::CustomerPurchasePattern;
use crate::domain::product::Product;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stored data could not be decoded: {0}")]
    Decode(String),
    #[error("store operation `{operation}` timed out after {timeout_ms}ms")]
    Timeout { operation: &'static str, timeout_ms: u64 },
}

/// Source of customer, health, order and catalog data.
///
/// Lookups return `Ok(None)` or an empty list when nothing exists; `Err` is reserved for
/// connectivity and decoding failures.
#[async_trait]
pub trait HealthOrderStore: Send + Sync {
    async fn customer_by_id(&self, id: &CustomerId) -> Result<Option<CustomerRecord>, StoreError>;

    async fn customer_health_info(
        &self,
        id: &CustomerId,
    ) -> Result<Option<CustomerHealthData>, StoreError>;

    /// Most recent first, at most `limit` items.
    async fn customer_order_items(
        &self,
        id: &CustomerId,
        limit: u32,
    ) -> Result<Vec<CustomerOrderItem>, StoreError>;

    async fn product_catalog(&self) -> Result<Vec<Product>, StoreError>;

    async fn purchase_patterns(
        &self,
        id: &CustomerId,
    ) -> Result<Vec<CustomerPurchasePattern>, StoreError>;

    /// Atomically replaces every stored pattern for `id` with `patterns`.
    async fn replace_purchase_patterns(
        &self,
        id: &CustomerId,
        patterns: Vec<CustomerPurchasePattern>,
    ) -> Result<(), StoreError>;
}

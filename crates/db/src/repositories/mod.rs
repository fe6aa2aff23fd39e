use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use carewise_core::domain::customer::{CustomerId, CustomerRecord};
use carewise_core::domain::health::CustomerHealthData;
use carewise_core::domain::order::CustomerOrderItem;
use carewise_core::domain::pattern::CustomerPurchasePattern;
use carewise_core::domain::product::{Product, ProductId};
use carewise_core::store::StoreError;

pub mod customer;
pub mod memory;
pub mod order_item;
pub mod product;
pub mod purchase_pattern;

pub use customer::SqlCustomerRepository;
pub use memory::InMemoryHealthOrderStore;
pub use order_item::SqlOrderItemRepository;
pub use product::SqlProductRepository;
pub use purchase_pattern::SqlPurchasePatternRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(source) => StoreError::Unavailable(source.to_string()),
            RepositoryError::Decode(message) => StoreError::Decode(message),
        }
    }
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<CustomerRecord>, RepositoryError>;
    async fn find_health_data(
        &self,
        id: &CustomerId,
    ) -> Result<Option<CustomerHealthData>, RepositoryError>;
    async fn save(&self, record: CustomerRecord) -> Result<(), RepositoryError>;
    async fn save_health_data(&self, data: CustomerHealthData) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait OrderItemRepository: Send + Sync {
    /// Most recent first, at most `limit` rows. Rows that fail to decode are skipped.
    async fn list_for_customer(
        &self,
        id: &CustomerId,
        limit: u32,
    ) -> Result<Vec<CustomerOrderItem>, RepositoryError>;
    async fn append(&self, item: CustomerOrderItem) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn list_catalog(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn save(&self, product: Product) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait PurchasePatternRepository: Send + Sync {
    async fn list_for_customer(
        &self,
        id: &CustomerId,
    ) -> Result<Vec<CustomerPurchasePattern>, RepositoryError>;
    /// Deletes and reinserts the customer's patterns inside one transaction.
    async fn replace_for_customer(
        &self,
        id: &CustomerId,
        patterns: Vec<CustomerPurchasePattern>,
    ) -> Result<(), RepositoryError>;
}

/// Canonical stored form: UTC, whole seconds, `Z` suffix, so text ordering matches time ordering.
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_rfc3339(field: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value).map(|ts| ts.with_timezone(&Utc)).map_err(|err| {
        RepositoryError::Decode(format!("invalid {field} timestamp '{value}': {err}"))
    })
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| RepositoryError::Decode(format!("invalid {field} date '{value}': {err}")))
}

pub(crate) fn parse_decimal(field: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value.trim())
        .map_err(|err| RepositoryError::Decode(format!("invalid {field} decimal '{value}': {err}")))
}

pub(crate) fn encode_json<T: serde::Serialize>(
    field: &str,
    value: &T,
) -> Result<String, RepositoryError> {
    serde_json::to_string(value)
        .map_err(|err| RepositoryError::Decode(format!("failed to encode {field}: {err}")))
}

/// Decodes an optional JSON column, falling back to `T::default()` with a warning when the stored
/// text is malformed.
pub(crate) fn decode_json_or_default<T: DeserializeOwned + Default>(
    entity_id: &str,
    field: &'static str,
    raw: Option<&str>,
) -> T {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return T::default();
    };

    serde_json::from_str(raw).unwrap_or_else(|error| {
        warn!(
            event_name = "db.decode.malformed_json",
            entity_id,
            field,
            error = %error,
            "stored JSON column could not be decoded; using empty value"
        );
        T::default()
    })
}

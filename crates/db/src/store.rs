use async_trait::async_trait;

use carewise_core::domain::customer::{CustomerId, CustomerRecord};
use carewise_core::domain::health::CustomerHealthData;
use carewise_core::domain::order::CustomerOrderItem;
use carewise_core::domain::pattern::CustomerPurchasePattern;
use carewise_core::domain::product::Product;
use carewise_core::store::{HealthOrderStore, StoreError};

use crate::repositories::{
    CustomerRepository, OrderItemRepository, ProductRepository, PurchasePatternRepository,
    SqlCustomerRepository, SqlOrderItemRepository, SqlProductRepository,
    SqlPurchasePatternRepository,
};
use crate::DbPool;

/// [`HealthOrderStore`] over the SQLite repositories.
pub struct SqlHealthOrderStore {
    customers: SqlCustomerRepository,
    order_items: SqlOrderItemRepository,
    products: SqlProductRepository,
    patterns: SqlPurchasePatternRepository,
}

impl SqlHealthOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            customers: SqlCustomerRepository::new(pool.clone()),
            order_items: SqlOrderItemRepository::new(pool.clone()),
            products: SqlProductRepository::new(pool.clone()),
            patterns: SqlPurchasePatternRepository::new(pool),
        }
    }
}

#[async_trait]
impl HealthOrderStore for SqlHealthOrderStore {
    async fn customer_by_id(&self, id: &CustomerId) -> Result<Option<CustomerRecord>, StoreError> {
        Ok(self.customers.find_by_id(id).await?)
    }

    async fn customer_health_info(
        &self,
        id: &CustomerId,
    ) -> Result<Option<CustomerHealthData>, StoreError> {
        Ok(self.customers.find_health_data(id).await?)
    }

    async fn customer_order_items(
        &self,
        id: &CustomerId,
        limit: u32,
    ) -> Result<Vec<CustomerOrderItem>, StoreError> {
        Ok(self.order_items.list_for_customer(id, limit).await?)
    }

    async fn product_catalog(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.list_catalog().await?)
    }

    async fn purchase_patterns(
        &self,
        id: &CustomerId,
    ) -> Result<Vec<CustomerPurchasePattern>, StoreError> {
        Ok(self.patterns.list_for_customer(id).await?)
    }

    async fn replace_purchase_patterns(
        &self,
        id: &CustomerId,
        patterns: Vec<CustomerPurchasePattern>,
    ) -> Result<(), StoreError> {
        Ok(self.patterns.replace_for_customer(id, patterns).await?)
    }
}

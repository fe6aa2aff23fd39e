use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use carewise_core::domain::customer::{CustomerId, CustomerRecord};
use carewise_core::domain::health::CustomerHealthData;
use carewise_core::domain::order::CustomerOrderItem;
use carewise_core::domain::pattern::CustomerPurchasePattern;
use carewise_core::domain::product::Product;
use carewise_core::store::{HealthOrderStore, StoreError};

/// Process-local store for tests and demos.
///
/// Pattern replacement swaps the customer's whole vector under a single write lock, so readers
/// observe either the old set or the new one.
#[derive(Default)]
pub struct InMemoryHealthOrderStore {
    customers: RwLock<HashMap<String, CustomerRecord>>,
    health: RwLock<HashMap<String, CustomerHealthData>>,
    order_items: RwLock<Vec<CustomerOrderItem>>,
    products: RwLock<BTreeMap<String, Product>>,
    patterns: RwLock<HashMap<String, Vec<CustomerPurchasePattern>>>,
}

impl InMemoryHealthOrderStore {
    pub async fn insert_customer(&self, record: CustomerRecord) {
        self.customers.write().await.insert(record.id.0.clone(), record);
    }

    pub async fn insert_health_data(&self, data: CustomerHealthData) {
        self.health.write().await.insert(data.customer_id.0.clone(), data);
    }

    pub async fn append_order_item(&self, item: CustomerOrderItem) {
        self.order_items.write().await.push(item);
    }

    pub async fn insert_product(&self, product: Product) {
        self.products.write().await.insert(product.id.0.clone(), product);
    }
}

#[async_trait]
impl HealthOrderStore for InMemoryHealthOrderStore {
    async fn customer_by_id(&self, id: &CustomerId) -> Result<Option<CustomerRecord>, StoreError> {
        Ok(self.customers.read().await.get(&id.0).cloned())
    }

    async fn customer_health_info(
        &self,
        id: &CustomerId,
    ) -> Result<Option<CustomerHealthData>, StoreError> {
        Ok(self.health.read().await.get(&id.0).cloned())
    }

    async fn customer_order_items(
        &self,
        id: &CustomerId,
        limit: u32,
    ) -> Result<Vec<CustomerOrderItem>, StoreError> {
        let mut items: Vec<CustomerOrderItem> = self
            .order_items
            .read()
            .await
            .iter()
            .filter(|item| item.customer_id == *id)
            .cloned()
            .collect();
        // stable sort keeps insertion order within one order
        items.sort_by(|a, b| {
            b.order_date.cmp(&a.order_date).then_with(|| a.order_id.cmp(&b.order_id))
        });
        items.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(items)
    }

    async fn product_catalog(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn purchase_patterns(
        &self,
        id: &CustomerId,
    ) -> Result<Vec<CustomerPurchasePattern>, StoreError> {
        Ok(self.patterns.read().await.get(&id.0).cloned().unwrap_or_default())
    }

    async fn replace_purchase_patterns(
        &self,
        id: &CustomerId,
        patterns: Vec<CustomerPurchasePattern>,
    ) -> Result<(), StoreError> {
        if patterns.iter().any(|pattern| pattern.customer_id != *id) {
            return Err(StoreError::Decode(format!(
                "patterns for other customers cannot replace patterns of {id}"
            )));
        }

        self.patterns.write().await.insert(id.0.clone(), patterns);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use carewise_core::config::EngineConfig;
    use carewise_core::domain::customer::{CustomerId, CustomerRecord};
    use carewise_core::domain::order::{CustomerOrderItem, OrderId, OrderStatus};
    use carewise_core::domain::product::{Product, ProductId};
    use carewise_core::service::PersonalizationService;
    use carewise_core::store::HealthOrderStore;

    use super::InMemoryHealthOrderStore;

    fn item(order: &str, category: &str, days_ago: i64) -> CustomerOrderItem {
        let now = Utc.with_ymd_and_hms(2026, 6, 15, 8, 0, 0).single().expect("valid timestamp");
        CustomerOrderItem {
            customer_id: CustomerId("cust-1".to_string()),
            order_id: OrderId(order.to_string()),
            product_id: ProductId(format!("prod-{order}")),
            product_name: format!("Product {order}"),
            product_category: category.to_string(),
            quantity: 1,
            unit_price: Decimal::new(500, 2),
            total_price: Decimal::new(500, 2),
            therapeutic_class: None,
            active_ingredients: Vec::new(),
            order_date: now - Duration::days(days_ago),
            order_status: OrderStatus::Delivered,
        }
    }

    #[tokio::test]
    async fn order_items_come_back_newest_first_and_limited() {
        let store = InMemoryHealthOrderStore::default();
        for (order, days_ago) in [("o-1", 40), ("o-2", 2), ("o-3", 10)] {
            store.append_order_item(item(order, "Vitamins", days_ago)).await;
        }

        let items = store
            .customer_order_items(&CustomerId("cust-1".to_string()), 2)
            .await
            .expect("items");

        let orders: Vec<_> = items.iter().map(|item| item.order_id.0.as_str()).collect();
        assert_eq!(orders, vec!["o-2", "o-3"]);
    }

    #[tokio::test]
    async fn catalog_is_ordered_by_product_id() {
        let store = InMemoryHealthOrderStore::default();
        for id in ["zinc", "aspirin"] {
            store
                .insert_product(Product {
                    id: ProductId(id.to_string()),
                    name: id.to_string(),
                    category: "Vitamins".to_string(),
                    price: Decimal::ONE,
                    description: String::new(),
                    therapeutic_class: None,
                    active_ingredients: Vec::new(),
                    stock_quantity: 1,
                })
                .await;
        }

        let catalog = store.product_catalog().await.expect("catalog");
        let ids: Vec<_> = catalog.iter().map(|product| product.id.0.as_str()).collect();
        assert_eq!(ids, vec!["aspirin", "zinc"]);
    }

    #[tokio::test]
    async fn service_recomputes_patterns_through_the_store() {
        let store = InMemoryHealthOrderStore::default();
        store.insert_customer(CustomerRecord::new("cust-1", "Ada")).await;
        store.append_order_item(item("o-1", "Vitamins", 5)).await;
        store.append_order_item(item("o-2", "Vitamins", 35)).await;
        store.append_order_item(item("o-3", "Allergy", 90)).await;
        let service = PersonalizationService::new(store, EngineConfig::default());
        let customer = CustomerId("cust-1".to_string());

        assert!(service.recompute_purchase_patterns(&customer).await);

        let patterns = service.store().purchase_patterns(&customer).await.expect("patterns");
        let categories: Vec<_> =
            patterns.iter().map(|pattern| pattern.product_category.as_str()).collect();
        assert_eq!(categories, vec!["Allergy", "Vitamins"]);
        assert_eq!(patterns[1].purchase_frequency, 2);

        let profile = service.get_customer_profile(&customer).await.expect("profile");
        assert_eq!(profile.preferred_categories, vec!["Vitamins", "Allergy"]);
    }
}

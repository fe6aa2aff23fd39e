use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};
use tracing::warn;

use carewise_core::domain::customer::CustomerId;
use carewise_core::domain::order::{CustomerOrderItem, OrderId, OrderStatus};
use carewise_core::domain::product::ProductId;

use super::{
    decode_json_or_default, encode_json, format_timestamp, parse_decimal, parse_rfc3339,
    OrderItemRepository, RepositoryError,
};
use crate::DbPool;

pub struct SqlOrderItemRepository {
    pool: DbPool,
}

impl SqlOrderItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderItemRepository for SqlOrderItemRepository {
    async fn list_for_customer(
        &self,
        id: &CustomerId,
        limit: u32,
    ) -> Result<Vec<CustomerOrderItem>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_id, order_id, product_id, product_name, product_category,
                   quantity, unit_price, total_price, therapeutic_class,
                   active_ingredients_json, order_date, order_status
            FROM customer_order_item
            WHERE customer_id = ?
            ORDER BY order_date DESC, order_id ASC, id ASC
            LIMIT ?
            "#,
        )
        .bind(&id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| match order_item_from_row(row) {
                Ok(item) => Some(item),
                Err(error) => {
                    let row_id = row.try_get::<i64, _>("id").unwrap_or_default();
                    warn!(
                        event_name = "db.order_item.skipped",
                        customer_id = %id,
                        row_id,
                        error = %error,
                        "skipping order item that could not be decoded"
                    );
                    None
                }
            })
            .collect())
    }

    async fn append(&self, item: CustomerOrderItem) -> Result<(), RepositoryError> {
        let ingredients_json = encode_json("active_ingredients", &item.active_ingredients)?;

        sqlx::query(
            r#"
            INSERT INTO customer_order_item (
                customer_id, order_id, product_id, product_name, product_category,
                quantity, unit_price, total_price, therapeutic_class,
                active_ingredients_json, order_date, order_status
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.customer_id.0)
        .bind(&item.order_id.0)
        .bind(&item.product_id.0)
        .bind(&item.product_name)
        .bind(&item.product_category)
        .bind(i64::from(item.quantity))
        .bind(item.unit_price.to_string())
        .bind(item.total_price.to_string())
        .bind(&item.therapeutic_class)
        .bind(ingredients_json)
        .bind(format_timestamp(item.order_date))
        .bind(item.order_status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn order_item_from_row(row: &SqliteRow) -> Result<CustomerOrderItem, RepositoryError> {
    let order_id: String = row.try_get("order_id")?;
    let quantity_raw: i64 = row.try_get("quantity")?;
    let quantity = u32::try_from(quantity_raw).map_err(|_| {
        RepositoryError::Decode(format!("order item quantity `{quantity_raw}` is out of range"))
    })?;
    let unit_price: String = row.try_get("unit_price")?;
    let total_price: String = row.try_get("total_price")?;
    let ingredients_json: Option<String> = row.try_get("active_ingredients_json")?;
    let order_date: String = row.try_get("order_date")?;
    let status_raw: String = row.try_get("order_status")?;
    let order_status = OrderStatus::parse(&status_raw).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown order status `{status_raw}`"))
    })?;

    Ok(CustomerOrderItem {
        customer_id: CustomerId(row.try_get("customer_id")?),
        product_id: ProductId(row.try_get("product_id")?),
        product_name: row.try_get("product_name")?,
        product_category: row.try_get("product_category")?,
        quantity,
        unit_price: parse_decimal("unit_price", &unit_price)?,
        total_price: parse_decimal("total_price", &total_price)?,
        therapeutic_class: row.try_get("therapeutic_class")?,
        active_ingredients: decode_json_or_default(
            &order_id,
            "active_ingredients",
            ingredients_json.as_deref(),
        ),
        order_date: parse_rfc3339("order_date", &order_date)?,
        order_status,
        order_id: OrderId(order_id),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use carewise_core::domain::customer::{CustomerId, CustomerRecord};
    use carewise_core::domain::order::{CustomerOrderItem, OrderId, OrderStatus};
    use carewise_core::domain::product::ProductId;

    use super::SqlOrderItemRepository;
    use crate::repositories::{CustomerRepository, OrderItemRepository, SqlCustomerRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlCustomerRepository::new(pool.clone())
            .save(CustomerRecord::new("cust-1", "Ada"))
            .await
            .expect("seed customer");
        pool
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).single().expect("valid timestamp")
    }

    fn item(order: &str, days_ago: i64) -> CustomerOrderItem {
        CustomerOrderItem {
            customer_id: CustomerId("cust-1".to_string()),
            order_id: OrderId(order.to_string()),
            product_id: ProductId("prod-omega".to_string()),
            product_name: "Omega-3".to_string(),
            product_category: "Heart Health".to_string(),
            quantity: 2,
            unit_price: Decimal::new(1499, 2),
            total_price: Decimal::new(2998, 2),
            therapeutic_class: Some("Supplement".to_string()),
            active_ingredients: vec!["EPA".to_string(), "DHA".to_string()],
            order_date: base() - Duration::days(days_ago),
            order_status: OrderStatus::Delivered,
        }
    }

    #[tokio::test]
    async fn items_are_listed_most_recent_first_with_limit() {
        let repo = SqlOrderItemRepository::new(setup_pool().await);
        for (order, days_ago) in [("o-old", 90), ("o-new", 1), ("o-mid", 30)] {
            repo.append(item(order, days_ago)).await.expect("append");
        }

        let customer = CustomerId("cust-1".to_string());
        let all = repo.list_for_customer(&customer, 10).await.expect("list");
        let orders: Vec<_> = all.iter().map(|item| item.order_id.0.as_str()).collect();
        assert_eq!(orders, vec!["o-new", "o-mid", "o-old"]);
        assert_eq!(all[0], item("o-new", 1));

        let limited = repo.list_for_customer(&customer, 2).await.expect("list limited");
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn undecodable_rows_are_skipped_and_bad_ingredients_emptied() {
        let pool = setup_pool().await;
        let repo = SqlOrderItemRepository::new(pool.clone());
        repo.append(item("o-good", 5)).await.expect("append");

        sqlx::query(
            "INSERT INTO customer_order_item (
                customer_id, order_id, product_id, product_name, product_category, quantity,
                unit_price, total_price, active_ingredients_json, order_date, order_status
            ) VALUES
                ('cust-1', 'o-bad-price', 'p', 'P', 'Vitamins', 1, 'ten', '10.00', '[]',
                 '2026-07-01T00:00:00Z', 'delivered'),
                ('cust-1', 'o-bad-json', 'p', 'P', 'Vitamins', 1, '10.00', '10.00', 'zinc, iron',
                 '2026-07-02T00:00:00Z', 'delivered')",
        )
        .execute(&pool)
        .await
        .expect("insert raw rows");

        let items = repo.list_for_customer(&CustomerId("cust-1".to_string()), 10).await.expect("list");

        let orders: Vec<_> = items.iter().map(|item| item.order_id.0.as_str()).collect();
        assert_eq!(orders, vec!["o-good", "o-bad-json"]);
        assert!(items[1].active_ingredients.is_empty());
    }
}

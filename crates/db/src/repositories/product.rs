use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};
use tracing::warn;

use carewise_core::domain::product::{Product, ProductId};

use super::{decode_json_or_default, encode_json, parse_decimal, ProductRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "id, name, category, price, description, therapeutic_class, \
                               active_ingredients_json, stock_quantity";

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn list_catalog(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| match product_from_row(row) {
                Ok(product) => Some(product),
                Err(error) => {
                    let product_id = row.try_get::<String, _>("id").unwrap_or_default();
                    warn!(
                        event_name = "db.product.skipped",
                        product_id = %product_id,
                        error = %error,
                        "skipping catalog entry that could not be decoded"
                    );
                    None
                }
            })
            .collect())
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        let ingredients_json = encode_json("active_ingredients", &product.active_ingredients)?;

        sqlx::query(
            r#"
            INSERT INTO product (
                id, name, category, price, description, therapeutic_class,
                active_ingredients_json, stock_quantity
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                price = excluded.price,
                description = excluded.description,
                therapeutic_class = excluded.therapeutic_class,
                active_ingredients_json = excluded.active_ingredients_json,
                stock_quantity = excluded.stock_quantity
            "#,
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price.to_string())
        .bind(&product.description)
        .bind(&product.therapeutic_class)
        .bind(ingredients_json)
        .bind(product.stock_quantity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn product_from_row(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("id")?;
    let price: String = row.try_get("price")?;
    let ingredients_json: Option<String> = row.try_get("active_ingredients_json")?;

    Ok(Product {
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        price: parse_decimal("price", &price)?,
        description: row.try_get("description")?,
        therapeutic_class: row.try_get("therapeutic_class")?,
        active_ingredients: decode_json_or_default(
            &id,
            "active_ingredients",
            ingredients_json.as_deref(),
        ),
        stock_quantity: row.try_get("stock_quantity")?,
        id: ProductId(id),
    })
}

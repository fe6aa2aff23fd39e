use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};
use tracing::warn;

use carewise_core::domain::customer::CustomerId;
use carewise_core::domain::pattern::{CustomerPurchasePattern, SeasonalPattern};

use super::{
    format_timestamp, parse_decimal, parse_rfc3339, PurchasePatternRepository, RepositoryError,
};
use crate::DbPool;

pub struct SqlPurchasePatternRepository {
    pool: DbPool,
}

impl SqlPurchasePatternRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurchasePatternRepository for SqlPurchasePatternRepository {
    async fn list_for_customer(
        &self,
        id: &CustomerId,
    ) -> Result<Vec<CustomerPurchasePattern>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT customer_id, product_category, purchase_frequency, total_quantity,
                   total_amount, average_quantity_per_order, first_purchase_date,
                   last_purchase_date, preference_score, season_spring, season_summer,
                   season_autumn, season_winter, updated_at
            FROM customer_purchase_pattern
            WHERE customer_id = ?
            ORDER BY product_category
            "#,
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| match pattern_from_row(row) {
                Ok(pattern) => Some(pattern),
                Err(error) => {
                    warn!(
                        event_name = "db.purchase_pattern.skipped",
                        customer_id = %id,
                        error = %error,
                        "skipping purchase pattern that could not be decoded"
                    );
                    None
                }
            })
            .collect())
    }

    async fn replace_for_customer(
        &self,
        id: &CustomerId,
        patterns: Vec<CustomerPurchasePattern>,
    ) -> Result<(), RepositoryError> {
        if let Some(foreign) = patterns.iter().find(|pattern| pattern.customer_id != *id) {
            return Err(RepositoryError::Decode(format!(
                "pattern for customer {} cannot replace patterns of {}",
                foreign.customer_id, id
            )));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM customer_purchase_pattern WHERE customer_id = ?")
            .bind(&id.0)
            .execute(&mut *tx)
            .await?;

        for pattern in &patterns {
            sqlx::query(
                r#"
                INSERT INTO customer_purchase_pattern (
                    customer_id, product_category, purchase_frequency, total_quantity,
                    total_amount, average_quantity_per_order, first_purchase_date,
                    last_purchase_date, preference_score, season_spring, season_summer,
                    season_autumn, season_winter, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&pattern.customer_id.0)
            .bind(&pattern.product_category)
            .bind(i64::from(pattern.purchase_frequency))
            .bind(i64::from(pattern.total_quantity))
            .bind(pattern.total_amount.to_string())
            .bind(pattern.average_quantity_per_order)
            .bind(format_timestamp(pattern.first_purchase_date))
            .bind(format_timestamp(pattern.last_purchase_date))
            .bind(pattern.preference_score)
            .bind(i64::from(pattern.seasonal_pattern.spring))
            .bind(i64::from(pattern.seasonal_pattern.summer))
            .bind(i64::from(pattern.seasonal_pattern.autumn))
            .bind(i64::from(pattern.seasonal_pattern.winter))
            .bind(format_timestamp(pattern.updated_at))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn count_column(row: &SqliteRow, column: &str) -> Result<u32, RepositoryError> {
    let raw: i64 = row.try_get(column)?;
    u32::try_from(raw)
        .map_err(|_| RepositoryError::Decode(format!("{column} value `{raw}` is out of range")))
}

fn pattern_from_row(row: &SqliteRow) -> Result<CustomerPurchasePattern, RepositoryError> {
    let total_amount: String = row.try_get("total_amount")?;
    let first: String = row.try_get("first_purchase_date")?;
    let last: String = row.try_get("last_purchase_date")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(CustomerPurchasePattern {
        customer_id: CustomerId(row.try_get("customer_id")?),
        product_category: row.try_get("product_category")?,
        purchase_frequency: count_column(row, "purchase_frequency")?,
        total_quantity: count_column(row, "total_quantity")?,
        total_amount: parse_decimal("total_amount", &total_amount)?,
        average_quantity_per_order: row.try_get("average_quantity_per_order")?,
        first_purchase_date: parse_rfc3339("first_purchase_date", &first)?,
        last_purchase_date: parse_rfc3339("last_purchase_date", &last)?,
        preference_score: row.try_get("preference_score")?,
        seasonal_pattern: SeasonalPattern {
            spring: count_column(row, "season_spring")?,
            summer: count_column(row, "season_summer")?,
            autumn: count_column(row, "season_autumn")?,
            winter: count_column(row, "season_winter")?,
        },
        updated_at: parse_rfc3339("updated_at", &updated_at)?,
    })
}

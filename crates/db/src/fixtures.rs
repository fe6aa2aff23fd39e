use crate::connection::DbPool;
use crate::repositories::RepositoryError;
use sqlx::Executor;

/// Per-customer expectations the demo dataset must satisfy after loading.
const SEED_CUSTOMERS: &[SeedCustomerContract] = &[
    SeedCustomerContract {
        customer_id: "cust-maria",
        name: "Maria Lopez",
        expected_order_items: 10,
        has_health_record: true,
        description: "Senior diabetic with monthly Metformin refills and vitamins",
    },
    SeedCustomerContract {
        customer_id: "cust-james",
        name: "James Carter",
        expected_order_items: 3,
        has_health_record: false,
        description: "Young adult with legacy asthma record and inhaler orders",
    },
    SeedCustomerContract {
        customer_id: "cust-priya",
        name: "Priya Shah",
        expected_order_items: 3,
        has_health_record: false,
        description: "Wellness shopper whose legacy allergy field is not JSON",
    },
];

const SEED_PRODUCT_COUNT: i64 = 14;

/// Deterministic demo dataset for exercising pattern recomputation, recommendations and insights.
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    /// SQL fixture content for the demo dataset.
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed.sql");

    /// Load the demo dataset. Safe to call repeatedly.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let customers_seeded = SEED_CUSTOMERS
            .iter()
            .map(|customer| CustomerSeedInfo {
                customer_id: customer.customer_id,
                description: customer.description,
            })
            .collect::<Vec<_>>();

        Ok(SeedResult { customers_seeded })
    }

    /// Verify that seed data exists and matches the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let product_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM product WHERE id IN {}",
            sql_array_from_ids(SEED_PRODUCT_IDS)
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("products", product_count == SEED_PRODUCT_COUNT));

        for customer in SEED_CUSTOMERS {
            let exists: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customer WHERE id = ?1 AND name = ?2)")
                    .bind(customer.customer_id)
                    .bind(customer.name)
                    .fetch_one(pool)
                    .await?;
            checks.push((customer.customer_id, exists == 1));

            let item_count: i64 = sqlx::query_scalar(
                "SELECT COUNT(1) FROM customer_order_item WHERE customer_id = ?1",
            )
            .bind(customer.customer_id)
            .fetch_one(pool)
            .await?;
            checks.push((customer.order_items_label(), item_count == customer.expected_order_items));

            let health_rows: i64 = sqlx::query_scalar(
                "SELECT COUNT(1) FROM customer_health_data WHERE customer_id = ?1",
            )
            .bind(customer.customer_id)
            .fetch_one(pool)
            .await?;
            checks.push((customer.health_label(), (health_rows == 1) == customer.has_health_record));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove the seeded rows, including any patterns computed for seeded customers.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        let quoted_customers = sql_array_from_ids(&SEED_CUSTOMER_IDS);
        let quoted_products = sql_array_from_ids(SEED_PRODUCT_IDS);

        for table in ["customer_purchase_pattern", "customer_order_item", "customer_health_data"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE customer_id IN {quoted_customers}"))
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query(&format!("DELETE FROM customer WHERE id IN {quoted_customers}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM product WHERE id IN {quoted_products}"))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

const SEED_CUSTOMER_IDS: [&str; 3] = ["cust-maria", "cust-james", "cust-priya"];

const SEED_PRODUCT_IDS: &[&str] = &[
    "prod-metformin",
    "prod-glipizide",
    "prod-glucose-meter",
    "prod-lisinopril",
    "prod-omega3",
    "prod-eye-drops",
    "prod-kidney-support",
    "prod-vitamin-d",
    "prod-multivitamin",
    "prod-zinc",
    "prod-albuterol",
    "prod-ibuprofen",
    "prod-senior-multi",
    "prod-cold-relief",
];

#[derive(Debug, Clone, Copy)]
struct SeedCustomerContract {
    customer_id: &'static str,
    name: &'static str,
    expected_order_items: i64,
    has_health_record: bool,
    description: &'static str,
}

impl SeedCustomerContract {
    fn order_items_label(&self) -> &'static str {
        match self.customer_id {
            "cust-maria" => "maria-order-items",
            "cust-james" => "james-order-items",
            _ => "priya-order-items",
        }
    }

    fn health_label(&self) -> &'static str {
        match self.customer_id {
            "cust-maria" => "maria-health-record",
            "cust-james" => "james-health-record",
            _ => "priya-health-record",
        }
    }
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{id}'")).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub customers_seeded: Vec<CustomerSeedInfo>,
}

#[derive(Debug)]
pub struct CustomerSeedInfo {
    pub customer_id: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    async fn migrated_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[test]
    fn seed_ids_agree_with_sql_fixture() {
        for id in SEED_CUSTOMER_IDS.iter().chain(SEED_PRODUCT_IDS) {
            assert!(DemoSeedDataset::SQL.contains(&format!("'{id}'")), "fixture is missing {id}");
        }
        assert_eq!(SEED_PRODUCT_IDS.len() as i64, SEED_PRODUCT_COUNT);
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = migrated_pool().await;

        let first = DemoSeedDataset::load(&pool).await.expect("load seed fixtures");
        let first_verification = DemoSeedDataset::verify(&pool).await.expect("verify seed fixtures");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);
        assert_eq!(first.customers_seeded.len(), 3);

        let second = DemoSeedDataset::load(&pool).await.expect("reload seed fixtures");
        let second_verification =
            DemoSeedDataset::verify(&pool).await.expect("re-verify seed fixtures");
        assert!(second_verification.all_present);
        assert_eq!(second.customers_seeded.len(), 3);
        assert_eq!(first_verification.checks, second_verification.checks);
    }

    #[tokio::test]
    async fn reload_keeps_health_record_attached_to_customer() {
        let pool = migrated_pool().await;
        DemoSeedDataset::load(&pool).await.expect("load");
        DemoSeedDataset::load(&pool).await.expect("reload");

        let chronic: String = sqlx::query_scalar(
            "SELECT chronic_conditions_json FROM customer_health_data WHERE customer_id = ?1",
        )
        .bind("cust-maria")
        .fetch_one(&pool)
        .await
        .expect("health row survives reload");
        assert_eq!(chronic, r#"["Diabetes"]"#);
    }

    #[tokio::test]
    async fn clean_removes_every_seeded_row() {
        let pool = migrated_pool().await;
        DemoSeedDataset::load(&pool).await.expect("load");

        DemoSeedDataset::clean(&pool).await.expect("clean");

        let verification = DemoSeedDataset::verify(&pool).await.expect("verify after clean");
        assert!(!verification.all_present);
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM customer_order_item")
            .fetch_one(&pool)
            .await
            .expect("count items");
        assert_eq!(remaining, 0);
    }
}

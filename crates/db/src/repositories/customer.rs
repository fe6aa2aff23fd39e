use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};
use tracing::warn;

use carewise_core::domain::customer::{CustomerId, CustomerRecord};
use carewise_core::domain::health::{CustomerHealthData, EmergencyContact, InsuranceInfo, Medication};

use super::{decode_json_or_default, encode_json, parse_date, CustomerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<CustomerRecord>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, date_of_birth, gender,
                   health_conditions, allergies, chronic_conditions
            FROM customer
            WHERE id = ?
            "#,
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(customer_from_row).transpose()
    }

    async fn find_health_data(
        &self,
        id: &CustomerId,
    ) -> Result<Option<CustomerHealthData>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT customer_id, blood_type, height_cm, weight_kg,
                   allergies_json, chronic_conditions_json, current_medications_json,
                   emergency_contact_json, insurance_provider, insurance_policy_number
            FROM customer_health_data
            WHERE customer_id = ?
            "#,
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(health_data_from_row).transpose()
    }

    async fn save(&self, record: CustomerRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO customer (
                id, name, email, date_of_birth, gender,
                health_conditions, allergies, chronic_conditions
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                date_of_birth = excluded.date_of_birth,
                gender = excluded.gender,
                health_conditions = excluded.health_conditions,
                allergies = excluded.allergies,
                chronic_conditions = excluded.chronic_conditions
            "#,
        )
        .bind(&record.id.0)
        .bind(&record.name)
        .bind(&record.email)
        .bind(record.date_of_birth.map(|dob| dob.format("%Y-%m-%d").to_string()))
        .bind(&record.gender)
        .bind(&record.legacy_health_conditions)
        .bind(&record.legacy_allergies)
        .bind(&record.legacy_chronic_conditions)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_health_data(&self, data: CustomerHealthData) -> Result<(), RepositoryError> {
        let allergies_json = encode_json("allergies", &data.allergies)?;
        let chronic_json = encode_json("chronic_conditions", &data.chronic_conditions)?;
        let medications_json = encode_json("current_medications", &data.current_medications)?;
        let contact_json = data
            .emergency_contact
            .as_ref()
            .map(|contact| encode_json("emergency_contact", contact))
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO customer_health_data (
                customer_id, blood_type, height_cm, weight_kg,
                allergies_json, chronic_conditions_json, current_medications_json,
                emergency_contact_json, insurance_provider, insurance_policy_number, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(customer_id) DO UPDATE SET
                blood_type = excluded.blood_type,
                height_cm = excluded.height_cm,
                weight_kg = excluded.weight_kg,
                allergies_json = excluded.allergies_json,
                chronic_conditions_json = excluded.chronic_conditions_json,
                current_medications_json = excluded.current_medications_json,
                emergency_contact_json = excluded.emergency_contact_json,
                insurance_provider = excluded.insurance_provider,
                insurance_policy_number = excluded.insurance_policy_number,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&data.customer_id.0)
        .bind(&data.blood_type)
        .bind(data.height_cm)
        .bind(data.weight_kg)
        .bind(allergies_json)
        .bind(chronic_json)
        .bind(medications_json)
        .bind(contact_json)
        .bind(&data.insurance.provider)
        .bind(&data.insurance.policy_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn customer_from_row(row: &SqliteRow) -> Result<CustomerRecord, RepositoryError> {
    let id: String = row.try_get("id")?;
    let date_of_birth_raw: Option<String> = row.try_get("date_of_birth")?;

    // an unreadable birth date only costs the age, not the whole customer
    let date_of_birth = date_of_birth_raw.as_deref().and_then(|raw| {
        parse_date("date_of_birth", raw)
            .map_err(|error| {
                warn!(
                    event_name = "db.customer.invalid_date_of_birth",
                    customer_id = %id,
                    error = %error,
                    "ignoring unreadable date of birth"
                );
            })
            .ok()
    });

    Ok(CustomerRecord {
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        date_of_birth,
        gender: row.try_get("gender")?,
        legacy_health_conditions: row.try_get("health_conditions")?,
        legacy_allergies: row.try_get("allergies")?,
        legacy_chronic_conditions: row.try_get("chronic_conditions")?,
        id: CustomerId(id),
    })
}

fn health_data_from_row(row: &SqliteRow) -> Result<CustomerHealthData, RepositoryError> {
    let customer_id: String = row.try_get("customer_id")?;
    let allergies_json: Option<String> = row.try_get("allergies_json")?;
    let chronic_json: Option<String> = row.try_get("chronic_conditions_json")?;
    let medications_json: Option<String> = row.try_get("current_medications_json")?;
    let contact_json: Option<String> = row.try_get("emergency_contact_json")?;

    Ok(CustomerHealthData {
        blood_type: row.try_get("blood_type")?,
        height_cm: row.try_get("height_cm")?,
        weight_kg: row.try_get("weight_kg")?,
        allergies: decode_json_or_default(&customer_id, "allergies", allergies_json.as_deref()),
        chronic_conditions: decode_json_or_default(
            &customer_id,
            "chronic_conditions",
            chronic_json.as_deref(),
        ),
        current_medications: decode_json_or_default::<Vec<Medication>>(
            &customer_id,
            "current_medications",
            medications_json.as_deref(),
        ),
        emergency_contact: decode_json_or_default::<Option<EmergencyContact>>(
            &customer_id,
            "emergency_contact",
            contact_json.as_deref(),
        ),
        insurance: InsuranceInfo {
            provider: row.try_get("insurance_provider")?,
            policy_number: row.try_get("insurance_policy_number")?,
        },
        customer_id: CustomerId(customer_id),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use carewise_core::domain::customer::{CustomerId, CustomerRecord};
    use carewise_core::domain::health::{CustomerHealthData, EmergencyContact, Medication};

    use super::SqlCustomerRepository;
    use crate::repositories::CustomerRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn customer_round_trip_keeps_legacy_fields_verbatim() {
        let repo = SqlCustomerRepository::new(setup_pool().await);
        let mut record = CustomerRecord::new("cust-1", "Ada Lovelace");
        record.email = Some("ada@example.com".to_string());
        record.date_of_birth = NaiveDate::from_ymd_opt(1958, 12, 10);
        record.legacy_allergies = Some("not json at all".to_string());

        repo.save(record.clone()).await.expect("save");
        let loaded = repo.find_by_id(&CustomerId("cust-1".to_string())).await.expect("find");

        assert_eq!(loaded, Some(record));
        assert!(repo.find_by_id(&CustomerId("missing".to_string())).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn unreadable_birth_date_is_dropped() {
        let pool = setup_pool().await;
        sqlx::query("INSERT INTO customer (id, name, date_of_birth) VALUES ('cust-2', 'Bo', 'last spring')")
            .execute(&pool)
            .await
            .expect("insert");

        let loaded = SqlCustomerRepository::new(pool)
            .find_by_id(&CustomerId("cust-2".to_string()))
            .await
            .expect("find")
            .expect("customer exists");

        assert_eq!(loaded.name, "Bo");
        assert!(loaded.date_of_birth.is_none());
    }

    #[tokio::test]
    async fn health_data_round_trip() {
        let repo = SqlCustomerRepository::new(setup_pool().await);
        repo.save(CustomerRecord::new("cust-1", "Ada")).await.expect("save customer");

        let mut data = CustomerHealthData::empty(CustomerId("cust-1".to_string()));
        data.blood_type = Some("O+".to_string());
        data.height_cm = Some(168.0);
        data.chronic_conditions = vec!["Hypertension".to_string()];
        data.current_medications = vec![Medication {
            name: "Lisinopril".to_string(),
            dosage: "10mg".to_string(),
            frequency: "daily".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 15),
            prescribed_by: Some("Dr. Reyes".to_string()),
        }];
        data.emergency_contact = Some(EmergencyContact {
            name: "Sam".to_string(),
            relationship: "sibling".to_string(),
            phone: "555-0100".to_string(),
        });
        data.insurance.provider = Some("Acme Health".to_string());

        repo.save_health_data(data.clone()).await.expect("save health");
        let loaded =
            repo.find_health_data(&CustomerId("cust-1".to_string())).await.expect("find health");

        assert_eq!(loaded, Some(data));
    }

    #[tokio::test]
    async fn malformed_health_lists_decode_as_empty() {
        let pool = setup_pool().await;
        sqlx::query("INSERT INTO customer (id, name) VALUES ('cust-3', 'Cy')")
            .execute(&pool)
            .await
            .expect("insert customer");
        sqlx::query(
            "INSERT INTO customer_health_data (customer_id, allergies_json, chronic_conditions_json)
             VALUES ('cust-3', '{\"broken\": true}', '[\"Asthma\"]')",
        )
        .execute(&pool)
        .await
        .expect("insert health");

        let loaded = SqlCustomerRepository::new(pool)
            .find_health_data(&CustomerId("cust-3".to_string()))
            .await
            .expect("find")
            .expect("health row exists");

        assert!(loaded.allergies.is_empty());
        assert_eq!(loaded.chronic_conditions, vec!["Asthma".to_string()]);
    }
}

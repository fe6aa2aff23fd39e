//! Customer profile composition.
//!
//! A read-only composer: it merges the base record, the optional health record, the order-item
//! history and the last stored pattern set. Patterns are never recomputed here.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::customer::{CustomerId, CustomerRecord};
use crate::domain::health::CustomerHealthData;
use crate::domain::order::CustomerOrderItem;
use crate::domain::pattern::CustomerPurchasePattern;

pub const PREFERRED_CATEGORY_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: CustomerId,
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub health_conditions: Vec<String>,
    pub allergies: Vec<String>,
    pub chronic_conditions: Vec<String>,
    pub preferred_categories: Vec<String>,
    pub total_orders: u32,
    pub average_order_value: Decimal,
    pub last_order_date: Option<DateTime<Utc>>,
    pub purchase_patterns: Vec<CustomerPurchasePattern>,
    pub health_info: Option<CustomerHealthData>,
}

impl CustomerProfile {
    /// Chronic and general health conditions, deduplicated case-insensitively, chronic first.
    pub fn conditions(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.chronic_conditions
            .iter()
            .chain(self.health_conditions.iter())
            .map(|condition| condition.trim())
            .filter(|condition| !condition.is_empty())
            .filter(|condition| seen.insert(condition.to_lowercase()))
            .collect()
    }

    pub fn prefers_category(&self, category: &str) -> bool {
        self.preferred_categories.iter().any(|preferred| preferred == category)
    }
}

/// Health-related list fields after resolving the two storage shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthFields {
    pub health_conditions: Vec<String>,
    pub allergies: Vec<String>,
    pub chronic_conditions: Vec<String>,
}

impl HealthFields {
    /// Resolves each list field: a non-empty list from the dedicated health record wins, the
    /// legacy JSON embedded in the customer row is the fallback.
    ///
    /// The dedicated record has no separate "health conditions" list, so its chronic conditions
    /// serve both fields.
    pub fn merge(record: &CustomerRecord, health: Option<&CustomerHealthData>) -> Self {
        let dedicated_chronic = health.map(|h| h.chronic_conditions.clone()).unwrap_or_default();
        let dedicated_allergies = health.map(|h| h.allergies.clone()).unwrap_or_default();

        Self {
            health_conditions: prefer(dedicated_chronic.clone(), || {
                parse_legacy_list(
                    &record.id,
                    "health_conditions",
                    record.legacy_health_conditions.as_deref(),
                )
            }),
            allergies: prefer(dedicated_allergies, || {
                parse_legacy_list(&record.id, "allergies", record.legacy_allergies.as_deref())
            }),
            chronic_conditions: prefer(dedicated_chronic, || {
                parse_legacy_list(
                    &record.id,
                    "chronic_conditions",
                    record.legacy_chronic_conditions.as_deref(),
                )
            }),
        }
    }
}

fn prefer(dedicated: Vec<String>, fallback: impl FnOnce() -> Vec<String>) -> Vec<String> {
    if dedicated.is_empty() {
        fallback()
    } else {
        dedicated
    }
}

/// Parses a legacy embedded JSON list. Anything that is not a JSON array is logged and treated as
/// empty; non-string array elements are dropped.
pub fn parse_legacy_list(customer_id: &CustomerId, field: &str, raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(values)) => values
            .into_iter()
            .filter_map(|value| match value {
                Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
                _ => None,
            })
            .collect(),
        Ok(other) => {
            warn!(
                event_name = "profile.legacy_field.not_array",
                customer_id = %customer_id,
                field,
                found = json_kind(&other),
                "legacy health field is not a JSON array; ignoring it"
            );
            Vec::new()
        }
        Err(error) => {
            warn!(
                event_name = "profile.legacy_field.malformed",
                customer_id = %customer_id,
                field,
                error = %error,
                "legacy health field is not valid JSON; ignoring it"
            );
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whole years between `date_of_birth` and `today`, one less if the birthday has not yet
/// occurred this year. `None` for birth dates in the future.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Category names of the highest-scoring patterns, best first, ties broken by name.
pub fn preferred_categories(patterns: &[CustomerPurchasePattern], limit: usize) -> Vec<String> {
    let mut ranked: Vec<&CustomerPurchasePattern> = patterns.iter().collect();
    ranked.sort_by(|a, b| {
        b.preference_score
            .partial_cmp(&a.preference_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.product_category.cmp(&b.product_category))
    });
    ranked.into_iter().take(limit).map(|pattern| pattern.product_category.clone()).collect()
}

pub fn build_profile(
    record: CustomerRecord,
    health: Option<CustomerHealthData>,
    items: &[CustomerOrderItem],
    patterns: Vec<CustomerPurchasePattern>,
    today: NaiveDate,
) -> CustomerProfile {
    let fields = HealthFields::merge(&record, health.as_ref());

    let total_orders = u32::try_from(items.len()).unwrap_or(u32::MAX);
    let total_spent: Decimal = items.iter().map(|item| item.total_price).sum();
    let average_order_value =
        if total_orders == 0 { Decimal::ZERO } else { total_spent / Decimal::from(total_orders) };
    let last_order_date = items.iter().map(|item| item.order_date).max();

    CustomerProfile {
        age: record.date_of_birth.and_then(|dob| age_on(dob, today)),
        preferred_categories: preferred_categories(&patterns, PREFERRED_CATEGORY_LIMIT),
        customer_id: record.id,
        name: record.name,
        gender: record.gender,
        health_conditions: fields.health_conditions,
        allergies: fields.allergies,
        chronic_conditions: fields.chronic_conditions,
        total_orders,
        average_order_value,
        last_order_date,
        purchase_patterns: patterns,
        health_info: health,
    }
}

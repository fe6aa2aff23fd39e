use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalPattern {
    pub spring: u32,
    pub summer: u32,
    pub autumn: u32,
    pub winter: u32,
}

impl SeasonalPattern {
    pub fn total(&self) -> u32 {
        self.spring + self.summer + self.autumn + self.winter
    }
}

/// Aggregated purchase statistics for one (customer, category) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerPurchasePattern {
    pub customer_id: CustomerId,
    pub product_category: String,
    pub purchase_frequency: u32,
    pub total_quantity: u32,
    pub total_amount: Decimal,
    pub average_quantity_per_order: f64,
    pub first_purchase_date: DateTime<Utc>,
    pub last_purchase_date: DateTime<Utc>,
    pub preference_score: f64,
    pub seasonal_pattern: SeasonalPattern,
    pub updated_at: DateTime<Utc>,
}

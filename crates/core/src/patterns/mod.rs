//! Purchase pattern aggregation.
//!
//! Folds a customer's full order-item history into one [`CustomerPurchasePattern`] per product
//! category. The fold is pure: the caller supplies `now`, and the output is ordered by category
//! name, so two runs over the same history produce identical pattern sets.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;

use crate::domain::customer::CustomerId;
use crate::domain::order::CustomerOrderItem;
use crate::domain::pattern::{CustomerPurchasePattern, SeasonalPattern};

/// Weight of the recency component in the preference score.
pub const RECENCY_WEIGHT: f64 = 0.4;
/// Weight of the frequency component in the preference score.
pub const FREQUENCY_WEIGHT: f64 = 0.6;
/// Recency points lost per elapsed decay period.
pub const RECENCY_DECAY_POINTS: f64 = 10.0;
/// Length of one recency decay period in days.
pub const RECENCY_DECAY_PERIOD_DAYS: f64 = 30.0;
/// Frequency points earned per purchase.
pub const FREQUENCY_POINTS_PER_PURCHASE: f64 = 10.0;
/// Upper bound of both the recency and frequency components.
pub const MAX_COMPONENT_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Maps a 0-indexed month (January = 0) to its season bucket.
    pub fn from_month0(month0: u32) -> Self {
        match month0 {
            2..=4 => Season::Spring,
            5..=7 => Season::Summer,
            8..=10 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    fn record(self, pattern: &mut SeasonalPattern) {
        match self {
            Season::Spring => pattern.spring += 1,
            Season::Summer => pattern.summer += 1,
            Season::Autumn => pattern.autumn += 1,
            Season::Winter => pattern.winter += 1,
        }
    }
}

/// Recency component: linear decay of 10 points per 30 days, floored at 0.
pub fn recency_score(days_since_last_purchase: f64) -> f64 {
    let days = days_since_last_purchase.max(0.0);
    (MAX_COMPONENT_SCORE - (days / RECENCY_DECAY_PERIOD_DAYS) * RECENCY_DECAY_POINTS).max(0.0)
}

/// Frequency component: 10 points per purchase, capped at 100.
pub fn frequency_score(purchase_frequency: u32) -> f64 {
    (purchase_frequency as f64 * FREQUENCY_POINTS_PER_PURCHASE).min(MAX_COMPONENT_SCORE)
}

/// Composite 0–100 affinity score. Frequency is weighted above recency so habitual categories
/// outrank one-off recent purchases.
pub fn preference_score(days_since_last_purchase: f64, purchase_frequency: u32) -> f64 {
    RECENCY_WEIGHT * recency_score(days_since_last_purchase)
        + FREQUENCY_WEIGHT * frequency_score(purchase_frequency)
}

/// Whole calendar days (UTC) from `earlier` to `later`. Constant for any `later` within one day,
/// so the recency component does not drift between runs on the same day.
pub fn elapsed_days(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later.date_naive() - earlier.date_naive()).num_days()
}

#[derive(Debug)]
struct CategoryAccumulator {
    purchase_frequency: u32,
    total_quantity: u32,
    total_amount: Decimal,
    first_purchase_date: DateTime<Utc>,
    last_purchase_date: DateTime<Utc>,
    seasonal_pattern: SeasonalPattern,
}

impl CategoryAccumulator {
    fn start(item: &CustomerOrderItem) -> Self {
        Self {
            purchase_frequency: 0,
            total_quantity: 0,
            total_amount: Decimal::ZERO,
            first_purchase_date: item.order_date,
            last_purchase_date: item.order_date,
            seasonal_pattern: SeasonalPattern::default(),
        }
    }

    fn add(&mut self, item: &CustomerOrderItem) {
        // Counts order items, not distinct orders: two lines of the same category in one order
        // contribute two purchases.
        self.purchase_frequency = self.purchase_frequency.saturating_add(1);
        self.total_quantity = self.total_quantity.saturating_add(item.quantity);
        self.total_amount += item.total_price;
        self.first_purchase_date = self.first_purchase_date.min(item.order_date);
        self.last_purchase_date = self.last_purchase_date.max(item.order_date);
        Season::from_month0(item.order_date.month0()).record(&mut self.seasonal_pattern);
    }

    fn finish(
        self,
        customer_id: &CustomerId,
        category: String,
        now: DateTime<Utc>,
    ) -> CustomerPurchasePattern {
        let days_since_last = elapsed_days(self.last_purchase_date, now) as f64;
        let average_quantity_per_order = if self.purchase_frequency == 0 {
            0.0
        } else {
            self.total_quantity as f64 / self.purchase_frequency as f64
        };

        CustomerPurchasePattern {
            customer_id: customer_id.clone(),
            product_category: category,
            purchase_frequency: self.purchase_frequency,
            total_quantity: self.total_quantity,
            total_amount: self.total_amount,
            average_quantity_per_order,
            first_purchase_date: self.first_purchase_date,
            last_purchase_date: self.last_purchase_date,
            preference_score: preference_score(days_since_last, self.purchase_frequency),
            seasonal_pattern: self.seasonal_pattern,
            updated_at: now,
        }
    }
}

/// Builds the full pattern set for `customer_id` from its order items.
///
/// Items belonging to other customers are ignored.
pub fn aggregate_patterns(
    customer_id: &CustomerId,
    items: &[CustomerOrderItem],
    now: DateTime<Utc>,
) -> Vec<CustomerPurchasePattern> {
    let mut by_category: BTreeMap<String, CategoryAccumulator> = BTreeMap::new();

    for item in items.iter().filter(|item| &item.customer_id == customer_id) {
        by_category
            .entry(item.product_category.clone())
            .or_insert_with(|| CategoryAccumulator::start(item))
            .add(item);
    }

    by_category
        .into_iter()
        .map(|(category, accumulator)| accumulator.finish(customer_id, category, now))
        .collect()
}

/// Keeps the previous `updated_at` for every category whose pattern is otherwise unchanged, so a
/// recompute over the same history stores an identical set.
pub fn carry_forward_timestamps(
    fresh: &mut [CustomerPurchasePattern],
    previous: &[CustomerPurchasePattern],
) {
    for pattern in fresh.iter_mut() {
        let unchanged = previous.iter().find(|old| {
            old.product_category == pattern.product_category
                && *old == &CustomerPurchasePattern { updated_at: old.updated_at, ..pattern.clone() }
        });
        if let Some(old) = unchanged {
            pattern.updated_at = old.updated_at;
        }
    }
}

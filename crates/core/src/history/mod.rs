//! Order history regrouping and frequency classification.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order::{CustomerOrderItem, OrderId};
use crate::domain::pattern::CustomerPurchasePattern;
use crate::domain::product::ProductId;

/// A category bought at least this often marks an order as chronic.
pub const CHRONIC_CATEGORY_FREQUENCY: u32 = 5;
/// An order touching at least this many previously-bought categories is chronic.
pub const CHRONIC_KNOWN_CATEGORY_COUNT: usize = 3;
pub const REGULAR_CATEGORY_FREQUENCY: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderFrequency {
    OneTime,
    Regular,
    Chronic,
}

impl OrderFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneTime => "one-time",
            Self::Regular => "regular",
            Self::Chronic => "chronic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_category: String,
    pub quantity: u32,
    pub total_price: Decimal,
    pub therapeutic_class: Option<String>,
}

impl From<&CustomerOrderItem> for OrderLine {
    fn from(item: &CustomerOrderItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            product_category: item.product_category.clone(),
            quantity: item.quantity,
            total_price: item.total_price,
            therapeutic_class: item.therapeutic_class.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHistory {
    pub order_id: OrderId,
    pub order_date: DateTime<Utc>,
    pub items: Vec<OrderLine>,
    pub total_amount: Decimal,
    pub frequency: OrderFrequency,
}

impl OrderHistory {
    /// Distinct categories in this order, sorted.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.items.iter().map(|line| line.product_category.as_str()).collect()
    }
}

/// Classifies an order by the customer's current patterns for the categories it touches.
///
/// With no stored patterns every order is `OneTime`.
pub fn classify_order<'a>(
    categories: impl IntoIterator<Item = &'a str>,
    patterns: &[CustomerPurchasePattern],
) -> OrderFrequency {
    let matching: Vec<&CustomerPurchasePattern> = categories
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter_map(|category| patterns.iter().find(|p| p.product_category == category))
        .collect();

    let habitual = matching.iter().any(|p| p.purchase_frequency >= CHRONIC_CATEGORY_FREQUENCY);
    if habitual || matching.len() >= CHRONIC_KNOWN_CATEGORY_COUNT {
        OrderFrequency::Chronic
    } else if matching.iter().any(|p| p.purchase_frequency >= REGULAR_CATEGORY_FREQUENCY) {
        OrderFrequency::Regular
    } else {
        OrderFrequency::OneTime
    }
}

/// Groups flat order items into orders, newest first.
pub fn analyze_order_history(
    items: &[CustomerOrderItem],
    patterns: &[CustomerPurchasePattern],
) -> Vec<OrderHistory> {
    let mut grouped: BTreeMap<&OrderId, Vec<&CustomerOrderItem>> = BTreeMap::new();
    for item in items {
        grouped.entry(&item.order_id).or_default().push(item);
    }

    let mut history: Vec<OrderHistory> = grouped
        .into_iter()
        .filter_map(|(order_id, lines)| {
            let order_date = lines.iter().map(|line| line.order_date).max()?;
            let total_amount = lines.iter().map(|line| line.total_price).sum();
            let frequency =
                classify_order(lines.iter().map(|line| line.product_category.as_str()), patterns);

            Some(OrderHistory {
                order_id: order_id.clone(),
                order_date,
                items: lines.into_iter().map(OrderLine::from).collect(),
                total_amount,
                frequency,
            })
        })
        .collect();

    history.sort_by(|a, b| {
        b.order_date.cmp(&a.order_date).then_with(|| a.order_id.cmp(&b.order_id))
    });
    history
}

//! Health insight generation.
//!
//! Three independent passes over the profile and order history. Their outputs are concatenated
//! and never deduplicated against each other.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clinical::ClinicalTables;
use crate::history::OrderHistory;
use crate::profile::CustomerProfile;

pub const HIGH_SEVERITY_ORDER_COUNT: u32 = 5;
pub const MEDIUM_SEVERITY_ORDER_COUNT: u32 = 3;
/// A therapeutic class bought at least this often is reported as regular use.
pub const REGULAR_USE_MIN_COUNT: u32 = 3;
pub const WELLNESS_MIN_ORDERS: u32 = 3;
pub const WELLNESS_INSIGHT_LABEL: &str = "Wellness-focused lifestyle";

const CONDITION_ACTIONS: &[&str] = &[
    "Maintain a regular medication schedule",
    "Monitor your symptoms and keep a health log",
    "Consult your healthcare provider about your treatment plan",
];

const WELLNESS_ACTIONS: &[&str] = &[
    "Keep up your preventive care routine",
    "Schedule regular health check-ups",
    "Review your supplement plan with a pharmacist",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    ChronicCondition,
    RegularMedication,
    Wellness,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthInsight {
    /// Condition, therapeutic class or topic the insight is about.
    pub condition: String,
    pub kind: InsightKind,
    pub severity: Severity,
    pub recommended_actions: Vec<String>,
    pub suggested_products: Vec<String>,
    pub last_related_purchase: Option<DateTime<Utc>>,
    pub frequency: u32,
}

#[derive(Debug, Clone, Default)]
pub struct InsightGenerator {
    tables: ClinicalTables,
}

impl InsightGenerator {
    pub fn new() -> Self {
        Self { tables: ClinicalTables::standard() }
    }

    pub fn with_tables(tables: ClinicalTables) -> Self {
        Self { tables }
    }

    /// `history` must be ordered newest first, as produced by
    /// [`crate::history::analyze_order_history`].
    pub fn generate(&self, profile: &CustomerProfile, history: &[OrderHistory]) -> Vec<HealthInsight> {
        let mut insights = chronic_condition_insights(profile, history, &self.tables);
        insights.extend(regular_medication_insights(history));
        insights.extend(wellness_insight(history, &self.tables));
        insights
    }
}

fn order_count_severity(count: u32) -> Severity {
    if count >= HIGH_SEVERITY_ORDER_COUNT {
        Severity::High
    } else if count >= MEDIUM_SEVERITY_ORDER_COUNT {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// One insight per chronic condition that has at least one order with a matching therapeutic
/// class.
pub fn chronic_condition_insights(
    profile: &CustomerProfile,
    history: &[OrderHistory],
    tables: &ClinicalTables,
) -> Vec<HealthInsight> {
    profile
        .chronic_conditions
        .iter()
        .filter_map(|condition| {
            let matching: Vec<&OrderHistory> = history
                .iter()
                .filter(|order| {
                    order.items.iter().any(|line| {
                        line.therapeutic_class
                            .as_deref()
                            .is_some_and(|class| tables.condition_matches_class(condition, class))
                    })
                })
                .collect();

            let latest = matching.first()?;
            let count = u32::try_from(matching.len()).unwrap_or(u32::MAX);

            Some(HealthInsight {
                condition: condition.clone(),
                kind: InsightKind::ChronicCondition,
                severity: order_count_severity(count),
                recommended_actions: to_owned_list(CONDITION_ACTIONS),
                suggested_products: latest.items.iter().map(|line| line.product_name.clone()).collect(),
                last_related_purchase: Some(latest.order_date),
                frequency: count,
            })
        })
        .collect()
}

#[derive(Debug, Default)]
struct ClassTally {
    count: u32,
    last_purchase: Option<DateTime<Utc>>,
    products: Vec<String>,
}

/// Therapeutic classes that appear on at least three order lines.
pub fn regular_medication_insights(history: &[OrderHistory]) -> Vec<HealthInsight> {
    let mut tallies: BTreeMap<&str, ClassTally> = BTreeMap::new();

    for order in history {
        for line in &order.items {
            let Some(class) = line.therapeutic_class.as_deref().map(str::trim) else {
                continue;
            };
            if class.is_empty() {
                continue;
            }

            let tally = tallies.entry(class).or_default();
            tally.count += 1;
            tally.last_purchase = tally.last_purchase.max(Some(order.order_date));
            if !tally.products.contains(&line.product_name) {
                tally.products.push(line.product_name.clone());
            }
        }
    }

    let mut regular: Vec<(&str, ClassTally)> =
        tallies.into_iter().filter(|(_, tally)| tally.count >= REGULAR_USE_MIN_COUNT).collect();
    regular.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));

    regular
        .into_iter()
        .map(|(class, tally)| HealthInsight {
            condition: class.to_string(),
            kind: InsightKind::RegularMedication,
            severity: if tally.count >= HIGH_SEVERITY_ORDER_COUNT {
                Severity::High
            } else {
                Severity::Medium
            },
            recommended_actions: vec![
                format!("You regularly use {class} medication; consider setting up automatic refills"),
                format!("Review your ongoing {class} treatment with your pharmacist"),
                "Check for interactions before starting new medications".to_string(),
            ],
            suggested_products: tally.products,
            last_related_purchase: tally.last_purchase,
            frequency: tally.count,
        })
        .collect()
}

/// A single low-severity insight once enough orders contain a wellness product.
pub fn wellness_insight(history: &[OrderHistory], tables: &ClinicalTables) -> Option<HealthInsight> {
    let wellness_orders: Vec<&OrderHistory> = history
        .iter()
        .filter(|order| order.items.iter().any(|line| tables.is_wellness(&line.product_category)))
        .collect();
    let count = u32::try_from(wellness_orders.len()).unwrap_or(u32::MAX);

    (count >= WELLNESS_MIN_ORDERS).then(|| HealthInsight {
        condition: WELLNESS_INSIGHT_LABEL.to_string(),
        kind: InsightKind::Wellness,
        severity: Severity::Low,
        recommended_actions: to_owned_list(WELLNESS_ACTIONS),
        suggested_products: Vec::new(),
        last_related_purchase: wellness_orders.iter().map(|order| order.order_date).max(),
        frequency: count,
    })
}

//! Types for the recommendation engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clinical::ClinicalTables;
use crate::domain::product::Product;
use crate::history::OrderHistory;
use crate::profile::CustomerProfile;

/// Which strategy produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationType {
    /// Matches the customer's preferred categories and spend
    Similar,
    /// Pairs with categories from recent orders
    Complementary,
    /// Targets a known health condition or age group
    HealthBased,
    /// Currently popular category
    Trending,
    /// Popular category that also received the cold-season boost
    Seasonal,
}

impl RecommendationType {
    /// Score at which confidence saturates at 1.0
    pub fn confidence_cap(self) -> f64 {
        match self {
            RecommendationType::Similar => 50.0,
            RecommendationType::HealthBased => 60.0,
            RecommendationType::Complementary => 40.0,
            RecommendationType::Trending | RecommendationType::Seasonal => 45.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecommendationType::Similar => "similar",
            RecommendationType::Complementary => "complementary",
            RecommendationType::HealthBased => "health-based",
            RecommendationType::Trending => "trending",
            RecommendationType::Seasonal => "seasonal",
        }
    }
}

/// A scored product with its justification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecommendation {
    /// Snapshot of the catalog entry at scoring time
    pub product: Product,
    /// Raw strategy score; an unbounded sum of points
    pub score: f64,
    /// Human-readable reasons, in the order they were earned
    pub reasons: Vec<String>,
    pub recommendation_type: RecommendationType,
    /// `min(score / cap, 1)`, always within [0, 1]
    pub confidence: f64,
}

impl ProductRecommendation {
    pub fn new(
        product: Product,
        score: f64,
        reasons: Vec<String>,
        recommendation_type: RecommendationType,
    ) -> Self {
        let confidence = confidence_for(score, recommendation_type);
        Self { product, score, reasons, recommendation_type, confidence }
    }

    /// Get display percentage
    pub fn display_confidence(&self) -> String {
        format!("{:.0}% match", self.confidence * 100.0)
    }
}

/// Confidence bounded to [0, 1] regardless of the raw score.
pub fn confidence_for(score: f64, recommendation_type: RecommendationType) -> f64 {
    if score.is_nan() || score <= 0.0 {
        return 0.0;
    }
    (score / recommendation_type.confidence_cap()).min(1.0)
}

/// Where the recommendations will be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationView {
    Widget,
    Page,
}

impl std::str::FromStr for RecommendationView {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "widget" => Ok(Self::Widget),
            "page" => Ok(Self::Page),
            other => Err(format!("unsupported recommendation view `{other}` (expected widget|page)")),
        }
    }
}

/// Inputs shared by every strategy
#[derive(Debug, Clone, Copy)]
pub struct StrategyInput<'a> {
    pub profile: &'a CustomerProfile,
    pub history: &'a [OrderHistory],
    pub catalog: &'a [Product],
    pub tables: &'a ClinicalTables,
    pub now: DateTime<Utc>,
}

impl<'a> StrategyInput<'a> {
    /// Catalog entries with stock on hand
    pub fn in_stock(&self) -> impl Iterator<Item = &'a Product> {
        self.catalog.iter().filter(|product| product.in_stock())
    }
}

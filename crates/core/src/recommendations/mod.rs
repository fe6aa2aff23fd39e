//! Personalized product recommendations
//!
//! Four independent, side-effect-free strategies score the in-stock catalog against a customer
//! profile and order history. A single combinator merges their candidates, keeping the best score
//! per product.

mod engine;
mod strategies;
mod types;

pub use engine::{merge_candidates, RecommendationEngine};
pub use strategies::{complementary, health_based, similar, trending, Strategy, STRATEGIES};
pub use types::*;

/// Points for a product in one of the customer's preferred categories.
pub const SIMILAR_PREFERRED_CATEGORY_POINTS: f64 = 30.0;
/// Points for a product priced within the customer's usual spend.
pub const SIMILAR_PRICE_FIT_POINTS: f64 = 20.0;
pub const SIMILAR_MIN_SCORE: f64 = 25.0;

pub const HEALTH_CLASS_MATCH_POINTS: f64 = 40.0;
pub const HEALTH_DESCRIPTION_MATCH_POINTS: f64 = 20.0;
pub const HEALTH_SENIOR_POINTS: f64 = 25.0;
pub const HEALTH_YOUNG_ADULT_VITAMIN_POINTS: f64 = 15.0;
pub const HEALTH_MIN_SCORE: f64 = 30.0;
pub const SENIOR_MIN_AGE: u32 = 60;
pub const YOUNG_ADULT_MAX_AGE: u32 = 30;

pub const COMPLEMENTARY_PAIR_POINTS: f64 = 35.0;
pub const COMPLEMENTARY_MIN_SCORE: f64 = 20.0;
/// Number of most recent orders whose categories feed the complementary strategy.
pub const COMPLEMENTARY_RECENT_ORDERS: usize = 5;

pub const TRENDING_POINTS: f64 = 25.0;
pub const SEASONAL_POINTS: f64 = 20.0;
pub const TRENDING_MIN_SCORE: f64 = 20.0;

/// Result count for the compact widget view.
pub const DEFAULT_WIDGET_TOP_N: usize = 3;
/// Result count for the full recommendations page.
pub const DEFAULT_PAGE_TOP_N: usize = 12;

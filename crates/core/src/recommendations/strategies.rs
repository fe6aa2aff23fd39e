//! The four scoring strategies.
//!
//! Each strategy is a pure function of [`StrategyInput`]; none of them observes another's output.

use std::collections::{BTreeSet, HashSet};

use chrono::Datelike;
use rust_decimal::Decimal;

use super::types::{ProductRecommendation, RecommendationType, StrategyInput};
use super::*;
use crate::clinical::{eq_ignore_case, SENIOR_HEALTH_CATEGORY, VITAMINS_CATEGORY};
use crate::domain::product::{Product, ProductId};

/// Signature shared by every strategy
pub type Strategy = fn(&StrategyInput<'_>) -> Vec<ProductRecommendation>;

/// Every strategy the engine runs, in merge order.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("similar", similar),
    ("health_based", health_based),
    ("complementary", complementary),
    ("trending", trending),
];

#[derive(Debug, Default)]
struct Tally {
    score: f64,
    reasons: Vec<String>,
}

impl Tally {
    fn add(&mut self, points: f64, reason: String) {
        self.score += points;
        self.reasons.push(reason);
    }

    fn finish(
        self,
        product: &Product,
        recommendation_type: RecommendationType,
        min_score: f64,
    ) -> Option<ProductRecommendation> {
        (self.score > min_score).then(|| {
            ProductRecommendation::new(product.clone(), self.score, self.reasons, recommendation_type)
        })
    }
}

/// Products in the customer's favourite categories at a familiar price. Skips anything the
/// customer has already bought.
pub fn similar(input: &StrategyInput<'_>) -> Vec<ProductRecommendation> {
    let purchased: HashSet<&ProductId> = input
        .history
        .iter()
        .flat_map(|order| order.items.iter().map(|line| &line.product_id))
        .collect();
    let average_order_value = input.profile.average_order_value;
    let price_ceiling = average_order_value * Decimal::new(15, 1);

    input
        .in_stock()
        .filter(|product| !purchased.contains(&product.id))
        .filter_map(|product| {
            let mut tally = Tally::default();

            if input.profile.prefers_category(&product.category) {
                tally.add(
                    SIMILAR_PREFERRED_CATEGORY_POINTS,
                    format!("You frequently buy {} products", product.category),
                );
            }

            if average_order_value > Decimal::ZERO && product.price <= price_ceiling {
                tally.add(SIMILAR_PRICE_FIT_POINTS, "Within your usual price range".to_string());
            }

            tally.finish(product, RecommendationType::Similar, SIMILAR_MIN_SCORE)
        })
        .collect()
}

/// Products whose therapeutic class or description addresses a known condition, plus age-group
/// boosts.
pub fn health_based(input: &StrategyInput<'_>) -> Vec<ProductRecommendation> {
    let conditions = input.profile.conditions();
    let age = input.profile.age;

    input
        .in_stock()
        .filter_map(|product| {
            let mut tally = Tally::default();
            let description = product.description.to_lowercase();

            for condition in &conditions {
                let class_match = product
                    .therapeutic_class
                    .as_deref()
                    .is_some_and(|class| input.tables.condition_matches_class(condition, class));
                if class_match {
                    tally.add(
                        HEALTH_CLASS_MATCH_POINTS,
                        format!("Recommended for managing {condition}"),
                    );
                }

                if description.contains(&condition.to_lowercase()) {
                    tally.add(
                        HEALTH_DESCRIPTION_MATCH_POINTS,
                        format!("Specifically formulated for {condition}"),
                    );
                }
            }

            match age {
                Some(age)
                    if age >= SENIOR_MIN_AGE
                        && eq_ignore_case(&product.category, SENIOR_HEALTH_CATEGORY) =>
                {
                    tally.add(HEALTH_SENIOR_POINTS, "Tailored for seniors' health needs".to_string());
                }
                Some(age)
                    if age <= YOUNG_ADULT_MAX_AGE
                        && eq_ignore_case(&product.category, VITAMINS_CATEGORY) =>
                {
                    tally.add(
                        HEALTH_YOUNG_ADULT_VITAMIN_POINTS,
                        "Supports an active lifestyle at your age".to_string(),
                    );
                }
                _ => {}
            }

            tally.finish(product, RecommendationType::HealthBased, HEALTH_MIN_SCORE)
        })
        .collect()
}

/// Products that pair with categories from the most recent orders.
pub fn complementary(input: &StrategyInput<'_>) -> Vec<ProductRecommendation> {
    // History is newest first. A category repeated across recent orders pairs once.
    let recent_categories: BTreeSet<&str> = input
        .history
        .iter()
        .take(COMPLEMENTARY_RECENT_ORDERS)
        .flat_map(|order| order.items.iter().map(|line| line.product_category.as_str()))
        .collect();

    if recent_categories.is_empty() {
        return Vec::new();
    }

    input
        .in_stock()
        .filter_map(|product| {
            let mut tally = Tally::default();

            for purchased in &recent_categories {
                let pairs = input
                    .tables
                    .complements_of(purchased)
                    .iter()
                    .any(|complement| eq_ignore_case(complement, &product.category));
                if pairs {
                    tally.add(
                        COMPLEMENTARY_PAIR_POINTS,
                        format!("Pairs well with your recent {purchased} purchase"),
                    );
                }
            }

            tally.finish(product, RecommendationType::Complementary, COMPLEMENTARY_MIN_SCORE)
        })
        .collect()
}

/// Popular categories, with an extra boost for cold-season categories from November to February.
pub fn trending(input: &StrategyInput<'_>) -> Vec<ProductRecommendation> {
    let seasonal_month = input.tables.is_seasonal_month(input.now.month());

    input
        .in_stock()
        .filter_map(|product| {
            let mut tally = Tally::default();
            let mut recommendation_type = RecommendationType::Trending;

            if input.tables.is_trending(&product.category) {
                tally.add(TRENDING_POINTS, format!("Trending in {}", product.category));
            }

            if seasonal_month && input.tables.is_seasonal(&product.category) {
                tally.add(SEASONAL_POINTS, "Seasonal essential for the colder months".to_string());
                recommendation_type = RecommendationType::Seasonal;
            }

            tally.finish(product, recommendation_type, TRENDING_MIN_SCORE)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::clinical::ClinicalTables;
    use crate::domain::customer::{CustomerId, CustomerRecord};
    use crate::domain::order::{CustomerOrderItem, OrderId, OrderStatus};
    use crate::history::{analyze_order_history, OrderHistory};
    use crate::profile::{build_profile, CustomerProfile};

    fn product(id: &str, category: &str, cents: i64) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: format!("Product {id}"),
            category: category.to_string(),
            price: Decimal::new(cents, 2),
            description: String::new(),
            therapeutic_class: None,
            active_ingredients: Vec::new(),
            stock_quantity: 10,
        }
    }

    fn order_item(order: &str, product_id: &str, category: &str, days_ago: i64) -> CustomerOrderItem {
        CustomerOrderItem {
            customer_id: CustomerId("cust-1".to_string()),
            order_id: OrderId(order.to_string()),
            product_id: ProductId(product_id.to_string()),
            product_name: format!("Product {product_id}"),
            product_category: category.to_string(),
            quantity: 1,
            unit_price: Decimal::new(2000, 2),
            total_price: Decimal::new(2000, 2),
            therapeutic_class: None,
            active_ingredients: Vec::new(),
            order_date: summer() - Duration::days(days_ago),
            order_status: OrderStatus::Delivered,
        }
    }

    fn summer() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).single().expect("valid timestamp")
    }

    fn winter() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 12, 5, 12, 0, 0).single().expect("valid timestamp")
    }

    fn profile_with(items: &[CustomerOrderItem], preferred: &[&str]) -> CustomerProfile {
        let mut profile = build_profile(
            CustomerRecord::new("cust-1", "Ada"),
            None,
            items,
            Vec::new(),
            NaiveDate::from_ymd_opt(2026, 7, 1).expect("valid date"),
        );
        profile.preferred_categories = preferred.iter().map(|c| c.to_string()).collect();
        profile
    }

    fn run(
        strategy: Strategy,
        profile: &CustomerProfile,
        history: &[OrderHistory],
        catalog: &[Product],
        now: DateTime<Utc>,
    ) -> Vec<ProductRecommendation> {
        let tables = ClinicalTables::standard();
        strategy(&StrategyInput { profile, history, catalog, tables: &tables, now })
    }

    #[test]
    fn similar_requires_category_and_price_fit_and_skips_owned_products() {
        let items = vec![order_item("o-1", "owned", "Vitamins", 3)];
        let history = analyze_order_history(&items, &[]);
        let profile = profile_with(&items, &["Vitamins"]);
        let catalog = vec![
            product("owned", "Vitamins", 1000),
            product("cheap-vit", "Vitamins", 2500),
            product("pricey-vit", "Vitamins", 9000),
            product("cheap-other", "Sleep Aid", 1000),
        ];

        let results = run(similar, &profile, &history, &catalog, summer());

        let ids: Vec<_> = results.iter().map(|r| r.product.id.0.as_str()).collect();
        assert_eq!(ids, vec!["cheap-vit", "pricey-vit"]);
        assert_eq!(results[0].score, 50.0);
        assert_eq!(results[0].confidence, 1.0);
        assert_eq!(results[1].score, 30.0);
        assert!((results[1].confidence - 0.6).abs() < 1e-9);
        assert!(results.iter().all(|r| r.recommendation_type == RecommendationType::Similar));
    }

    #[test]
    fn price_fit_alone_does_not_clear_similar_threshold() {
        let items = vec![order_item("o-1", "owned", "Vitamins", 3)];
        let history = analyze_order_history(&items, &[]);
        let profile = profile_with(&items, &[]);

        let results =
            run(similar, &profile, &history, &[product("p", "Sleep Aid", 100)], summer());

        assert!(results.is_empty());
    }

    #[test]
    fn health_based_matches_condition_class_table() {
        let mut profile = profile_with(&[], &[]);
        profile.chronic_conditions = vec!["diabetes".to_string()];
        let mut metformin = product("metformin", "Diabetes", 1500);
        metformin.therapeutic_class = Some("Antidiabetic".to_string());
        let mut strip = product("strips", "Diabetes", 1500);
        strip.description = "Test strips for diabetes monitoring".to_string();

        let results = run(health_based, &profile, &[], &[metformin, strip], summer());

        assert_eq!(results.len(), 1, "description match alone stays under the threshold");
        assert_eq!(results[0].product.id.0, "metformin");
        assert_eq!(results[0].score, 40.0);
        assert_eq!(results[0].reasons, vec!["Recommended for managing diabetes"]);
        assert!((results[0].confidence - 40.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn health_based_adds_age_group_boosts() {
        let mut senior = profile_with(&[], &[]);
        senior.age = Some(67);
        senior.health_conditions = vec!["arthritis".to_string()];
        let mut joint = product("joint", "Senior Health", 2000);
        joint.description = "Joint comfort for arthritis".to_string();

        let results = run(health_based, &senior, &[], &[joint.clone()], summer());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 45.0);

        let mut young = profile_with(&[], &[]);
        young.age = Some(24);
        let results = run(health_based, &young, &[], &[product("multi", "Vitamins", 900)], summer());
        assert!(results.is_empty(), "15 points alone do not clear the threshold");
    }

    #[test]
    fn complementary_uses_five_most_recent_orders() {
        let items = vec![
            order_item("o-1", "a", "Sleep Aid", 1),
            order_item("o-2", "b", "Sleep Aid", 2),
            order_item("o-3", "c", "Sleep Aid", 3),
            order_item("o-4", "d", "Sleep Aid", 4),
            order_item("o-5", "e", "Antibiotics", 5),
            order_item("o-6", "f", "Pain Relief", 6),
        ];
        let history = analyze_order_history(&items, &[]);
        let profile = profile_with(&items, &[]);
        let catalog = vec![
            product("probiotic", "Probiotics", 1000),
            product("digestive", "Digestive Health", 1000),
            product("sleep", "Sleep Aid", 1000),
        ];

        let results = run(complementary, &profile, &history, &catalog, summer());

        let ids: Vec<_> = results.iter().map(|r| r.product.id.0.as_str()).collect();
        assert_eq!(ids, vec!["probiotic", "digestive"], "pain relief order is the sixth");
        assert_eq!(results[1].score, 35.0);
        assert_eq!(results[1].reasons, vec!["Pairs well with your recent Antibiotics purchase"]);
    }

    #[test]
    fn complementary_counts_each_recent_category_once() {
        let items = vec![
            order_item("o-1", "a", "Blood Pressure", 1),
            order_item("o-2", "b", "Blood Pressure", 2),
            order_item("o-3", "c", "Diabetes", 3),
        ];
        let history = analyze_order_history(&items, &[]);
        let profile = profile_with(&items, &[]);
        let catalog = vec![product("kidney", "Kidney Health", 1000)];

        let results = run(complementary, &profile, &history, &catalog, summer());

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 70.0, "one pair each from Blood Pressure and Diabetes");
        assert_eq!(results[0].reasons.len(), 2);
    }

    #[test]
    fn trending_applies_seasonal_boost_in_winter_only() {
        let profile = profile_with(&[], &[]);
        let catalog = vec![
            product("immune", "Immune Support", 1000),
            product("flu", "Cold & Flu", 1000),
            product("mind", "Mental Health", 1000),
        ];

        let summer_results = run(trending, &profile, &[], &catalog, summer());
        let ids: Vec<_> = summer_results.iter().map(|r| r.product.id.0.as_str()).collect();
        assert_eq!(ids, vec!["immune", "mind"]);
        assert!(summer_results.iter().all(|r| r.recommendation_type == RecommendationType::Trending));

        let winter_results = run(trending, &profile, &[], &catalog, winter());
        assert_eq!(winter_results.len(), 2, "cold & flu alone scores exactly 20");
        assert_eq!(winter_results[0].score, 45.0);
        assert_eq!(winter_results[0].recommendation_type, RecommendationType::Seasonal);
        assert_eq!(winter_results[0].confidence, 1.0);
    }

    #[test]
    fn out_of_stock_products_are_never_scored() {
        let profile = profile_with(&[], &[]);
        let mut immune = product("immune", "Immune Support", 1000);
        immune.stock_quantity = 0;

        for (_, strategy) in STRATEGIES {
            assert!(run(*strategy, &profile, &[], &[immune.clone()], winter()).is_empty());
        }
    }
}

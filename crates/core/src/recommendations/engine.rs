//! Recommendation engine: runs every strategy and merges the candidates.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::strategies::STRATEGIES;
use super::types::{ProductRecommendation, StrategyInput};
use crate::clinical::ClinicalTables;
use crate::domain::product::{Product, ProductId};
use crate::history::OrderHistory;
use crate::profile::CustomerProfile;

/// The main recommendation engine
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    tables: ClinicalTables,
}

impl RecommendationEngine {
    /// Create an engine over the standard clinical tables
    pub fn new() -> Self {
        Self { tables: ClinicalTables::standard() }
    }

    /// Create with custom condition and category tables
    pub fn with_tables(tables: ClinicalTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &ClinicalTables {
        &self.tables
    }

    /// Run all strategies and return the best `top_n` products.
    pub fn recommend(
        &self,
        profile: &CustomerProfile,
        history: &[OrderHistory],
        catalog: &[Product],
        now: DateTime<Utc>,
        top_n: usize,
    ) -> Vec<ProductRecommendation> {
        let input = StrategyInput { profile, history, catalog, tables: &self.tables, now };

        let candidates = STRATEGIES.iter().flat_map(|(_, strategy)| strategy(&input));

        merge_candidates(candidates, top_n)
    }
}

/// Deduplicates by product id keeping only the highest-scoring occurrence (scores are never
/// summed across strategies), then sorts by score descending and truncates.
///
/// On equal scores the earlier candidate wins, and ties in the final ordering fall back to the
/// product id.
pub fn merge_candidates(
    candidates: impl IntoIterator<Item = ProductRecommendation>,
    top_n: usize,
) -> Vec<ProductRecommendation> {
    let mut best: HashMap<ProductId, ProductRecommendation> = HashMap::new();

    for candidate in candidates {
        match best.get(&candidate.product.id) {
            Some(existing) if existing.score >= candidate.score => {}
            _ => {
                best.insert(candidate.product.id.clone(), candidate);
            }
        }
    }

    let mut merged: Vec<ProductRecommendation> = best.into_values().collect();
    merged.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.product.id.cmp(&b.product.id))
    });
    merged.truncate(top_n);
    merged
}

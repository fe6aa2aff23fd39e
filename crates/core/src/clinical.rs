//! Static clinical configuration shared by the recommendation and insight passes.
//!
//! The tables live in one value so tests and deployments can swap them without touching the
//! scoring code. [`ClinicalTables::standard`] is the catalogue the pharmacy ships with.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct ConditionSeed {
    condition: &'static str,
    classes: &'static [&'static str],
}

const CONDITION_CLASS_SEEDS: &[ConditionSeed] = &[
    ConditionSeed { condition: "diabetes", classes: &["Antidiabetic", "Insulin", "Blood Sugar"] },
    ConditionSeed {
        condition: "hypertension",
        classes: &["Antihypertensive", "ACE Inhibitor", "Beta Blocker"],
    },
    ConditionSeed {
        condition: "arthritis",
        classes: &["Anti-inflammatory", "Pain Relief", "NSAID"],
    },
    ConditionSeed {
        condition: "depression",
        classes: &["Antidepressant", "Mental Health", "Mood Stabilizer"],
    },
    ConditionSeed { condition: "anxiety", classes: &["Anxiolytic", "Mental Health", "Sedative"] },
    ConditionSeed {
        condition: "asthma",
        classes: &["Bronchodilator", "Respiratory", "Anti-inflammatory"],
    },
];

#[derive(Debug, Clone, Copy)]
struct PairSeed {
    purchased: &'static str,
    complements: &'static [&'static str],
}

const COMPLEMENTARY_SEEDS: &[PairSeed] = &[
    PairSeed { purchased: "Pain Relief", complements: &["Digestive Health", "Sleep Aid"] },
    PairSeed { purchased: "Antibiotics", complements: &["Probiotics", "Digestive Health"] },
    PairSeed { purchased: "Blood Pressure", complements: &["Heart Health", "Kidney Health"] },
    PairSeed { purchased: "Diabetes", complements: &["Heart Health", "Kidney Health", "Eye Care"] },
    PairSeed { purchased: "Vitamins", complements: &["Minerals", "Digestive Health"] },
    PairSeed { purchased: "Skin Care", complements: &["Vitamins", "Anti-inflammatory"] },
];

const TRENDING_CATEGORIES: &[&str] =
    &["Vitamins", "Immune Support", "Mental Health", "Digestive Health"];
const SEASONAL_CATEGORIES: &[&str] = &["Immune Support", "Vitamins", "Cold & Flu"];
const WELLNESS_CATEGORIES: &[&str] = &["Vitamins", "Supplements", "Immune Support"];

pub const SENIOR_HEALTH_CATEGORY: &str = "Senior Health";
pub const VITAMINS_CATEGORY: &str = "Vitamins";

/// Condition, category and season lookup tables.
///
/// Keys are stored lowercased; every lookup is case-insensitive.
#[derive(Debug, Clone)]
pub struct ClinicalTables {
    condition_classes: HashMap<String, Vec<String>>,
    complementary: HashMap<String, Vec<String>>,
    trending: Vec<String>,
    seasonal: Vec<String>,
    wellness: Vec<String>,
    /// 1-based calendar months in which the seasonal boost applies.
    seasonal_months: Vec<u32>,
}

impl ClinicalTables {
    pub fn standard() -> Self {
        let condition_classes = CONDITION_CLASS_SEEDS
            .iter()
            .map(|seed| {
                (normalize(seed.condition), seed.classes.iter().map(|c| c.to_string()).collect())
            })
            .collect();
        let complementary = COMPLEMENTARY_SEEDS
            .iter()
            .map(|seed| {
                (normalize(seed.purchased), seed.complements.iter().map(|c| c.to_string()).collect())
            })
            .collect();

        Self {
            condition_classes,
            complementary,
            trending: owned(TRENDING_CATEGORIES),
            seasonal: owned(SEASONAL_CATEGORIES),
            wellness: owned(WELLNESS_CATEGORIES),
            seasonal_months: vec![11, 12, 1, 2],
        }
    }

    pub fn with_condition(mut self, condition: &str, classes: &[&str]) -> Self {
        self.condition_classes.insert(normalize(condition), owned(classes));
        self
    }

    pub fn with_complement(mut self, purchased: &str, complements: &[&str]) -> Self {
        self.complementary.insert(normalize(purchased), owned(complements));
        self
    }

    pub fn classes_for_condition(&self, condition: &str) -> &[String] {
        self.condition_classes.get(&normalize(condition)).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when `therapeutic_class` belongs to the class list mapped from `condition`.
    pub fn condition_matches_class(&self, condition: &str, therapeutic_class: &str) -> bool {
        let class = normalize(therapeutic_class);
        self.classes_for_condition(condition).iter().any(|candidate| normalize(candidate) == class)
    }

    pub fn complements_of(&self, purchased_category: &str) -> &[String] {
        self.complementary.get(&normalize(purchased_category)).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_trending(&self, category: &str) -> bool {
        contains_ignore_case(&self.trending, category)
    }

    pub fn is_seasonal(&self, category: &str) -> bool {
        contains_ignore_case(&self.seasonal, category)
    }

    pub fn is_wellness(&self, category: &str) -> bool {
        contains_ignore_case(&self.wellness, category)
    }

    pub fn is_seasonal_month(&self, month: u32) -> bool {
        self.seasonal_months.contains(&month)
    }
}

impl Default for ClinicalTables {
    fn default() -> Self {
        Self::standard()
    }
}

pub(crate) fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

fn contains_ignore_case(values: &[String], needle: &str) -> bool {
    values.iter().any(|value| eq_ignore_case(value, needle))
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

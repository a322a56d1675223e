//! Food Restriction Resolver
//!
//! Turns conditions into prohibited, limited and warning food lists.
//! Limited foods carry their per-meal gram ceiling both in the structured
//! `per_meal_limit_g` field and at the end of the reason text
//! ("Limit to <50g per meal"); [`parse_per_meal_ceiling`] reads the latter.
//!
//! Pantry items are matched on whole words against each restriction's
//! `match_keys`, with plurals folded, so "baby_spinach" hits Spinach and
//! "to" hits nothing.

use crate::ckd::renal_restriction_applies;
use crate::priority::ClinicalPriority;
use crate::reference::{
    high_potassium_food, FoodWarningEntry, HighPotassiumFood, GOITROGENIC_FOODS,
    HTN_POTATO_WARNING, RENAL_RESTRICTED_FOODS,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// How strictly a food is restricted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictionSeverity {
    /// Must not be eaten
    Prohibited,
    /// Small portions only
    Limited,
    /// Allowed with a caveat
    Warning,
}

/// A single food restriction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRestriction {
    pub food_name: String,
    pub severity: RestrictionSeverity,
    pub reason: String,
    pub priority: ClinicalPriority,
    #[serde(default)]
    pub alternative_foods: Vec<String>,
    /// Required gap from a medication dose
    #[serde(default)]
    pub temporal_restriction: Option<String>,
    /// Per-meal gram ceiling for limited foods
    #[serde(default)]
    pub per_meal_limit_g: Option<f64>,
    /// Condition a consumer must confirm before enforcing this restriction
    #[serde(default)]
    pub conditional_on: Option<String>,
    /// Food words that select this restriction; empty in older exports
    #[serde(default)]
    pub match_keys: Vec<String>,
}

impl FoodRestriction {
    fn from_catalog(food: &HighPotassiumFood, priority: ClinicalPriority) -> Self {
        FoodRestriction {
            food_name: food.display_name.to_string(),
            severity: food.severity,
            reason: food.reason(),
            priority,
            alternative_foods: food.alternatives.iter().map(|s| s.to_string()).collect(),
            temporal_restriction: None,
            per_meal_limit_g: food.per_meal_limit_g.map(f64::from),
            conditional_on: None,
            match_keys: food.match_keys.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn from_warning(entry: &FoodWarningEntry) -> Self {
        FoodRestriction {
            food_name: entry.display_name.to_string(),
            severity: RestrictionSeverity::Warning,
            reason: entry.reason.to_string(),
            priority: entry.priority,
            alternative_foods: entry.alternatives.iter().map(|s| s.to_string()).collect(),
            temporal_restriction: entry.temporal_restriction.map(str::to_string),
            per_meal_limit_g: None,
            conditional_on: entry.conditional_on.map(str::to_string),
            match_keys: entry.match_keys.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Per-meal ceiling, preferring the structured field over the reason text
    pub fn allowed_per_meal_g(&self) -> Option<f64> {
        self.per_meal_limit_g.or_else(|| parse_per_meal_ceiling(&self.reason))
    }

    /// How specifically `item` names this food, in matched words.
    ///
    /// A key matches when its words appear in order inside the item
    /// ("potato chips" contains "potato"), or when the item is a trailing run
    /// of the key's words ("potato" for "sweet potato"). Without `match_keys`
    /// the display name's comma-separated heads serve as keys.
    pub fn match_score(&self, item: &str) -> Option<usize> {
        let item = food_tokens(item);
        if item.is_empty() {
            return None;
        }

        let score = |key: &str| {
            let key = food_tokens(key);
            if contains_run(&item, &key) {
                Some(key.len())
            } else if key.ends_with(&item) {
                Some(item.len())
            } else {
                None
            }
        };

        if self.match_keys.is_empty() {
            let head = self.food_name.split('(').next().unwrap_or_default();
            head.split(',').filter_map(score).max()
        } else {
            self.match_keys.iter().map(String::as_str).filter_map(score).max()
        }
    }

    /// Whether `item` names this food
    pub fn matches(&self, item: &str) -> bool {
        self.match_score(item).is_some()
    }
}

/// Most specific restriction naming `item`; earlier entries win ties
pub fn best_match<'a>(foods: &'a [FoodRestriction], item: &str) -> Option<&'a FoodRestriction> {
    foods
        .iter()
        .rev()
        .filter_map(|food| food.match_score(item).map(|score| (score, food)))
        .max_by_key(|(score, _)| *score)
        .map(|(_, food)| food)
}

/// Lower-case, trimmed, underscores as spaces
pub fn normalize_food_name(name: &str) -> String {
    name.trim().replace('_', " ").to_lowercase()
}

/// Lower-case singular words of a food name
fn food_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| singular(&word.to_lowercase()))
        .collect()
}

fn singular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("oes") {
        format!("{}o", stem)
    } else if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

fn ceiling_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<(\d+(?:\.\d+)?)g").ok()).as_ref()
}

/// Extract the gram ceiling from reason text such as "Limit to <50g per meal"
pub fn parse_per_meal_ceiling(reason: &str) -> Option<f64> {
    ceiling_pattern()?
        .captures(reason)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Restriction lists split by severity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoodRestrictions {
    pub prohibited: Vec<FoodRestriction>,
    pub limited: Vec<FoodRestriction>,
    pub warnings: Vec<FoodRestriction>,
}

impl FoodRestrictions {
    fn push(&mut self, restriction: FoodRestriction) {
        match restriction.severity {
            RestrictionSeverity::Prohibited => self.prohibited.push(restriction),
            RestrictionSeverity::Limited => self.limited.push(restriction),
            RestrictionSeverity::Warning => self.warnings.push(restriction),
        }
    }

    pub fn len(&self) -> usize {
        self.prohibited.len() + self.limited.len() + self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve food restrictions from conditions.
///
/// CKD with eGFR < 60 prohibits or limits high-potassium foods; hypertension
/// without that renal branch only warns about potato preparation. The two
/// branches are exclusive. Hypothyroidism adds soy and cruciferous warnings.
pub fn resolve_food_restrictions(
    has_htn: bool,
    has_ckd: bool,
    egfr: Option<f64>,
    has_hypothyroidism: bool,
) -> FoodRestrictions {
    let mut restrictions = FoodRestrictions::default();

    if renal_restriction_applies(has_ckd, egfr) {
        RENAL_RESTRICTED_FOODS
            .iter()
            .filter_map(|key| high_potassium_food(key))
            .map(|food| FoodRestriction::from_catalog(food, ClinicalPriority::CriticalRenal))
            .for_each(|restriction| restrictions.push(restriction));
    } else if has_htn {
        restrictions.push(FoodRestriction::from_warning(&HTN_POTATO_WARNING));
    }

    if has_hypothyroidism {
        GOITROGENIC_FOODS
            .iter()
            .map(FoodRestriction::from_warning)
            .for_each(|restriction| restrictions.push(restriction));
    }

    restrictions
}

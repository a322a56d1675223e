//! Protein Requirements
//!
//! KDOQI g/kg/day ranges scaled by body weight.

use crate::reference::{
    ProteinRange, ADVANCED_CKD_EGFR, DEFAULT_WEIGHT_NOTE, MEALS_PER_DAY, PROTEIN_ADVANCED_CKD,
    PROTEIN_CKD_DIABETES, PROTEIN_STANDARD, REFERENCE_WEIGHT_KG, RENAL_RESTRICTION_EGFR,
};
use serde::{Deserialize, Serialize};

/// Protein requirements derived from weight and conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProteinCalculation {
    pub weight_kg: f64,
    /// True when the reference weight replaced a missing measurement
    pub weight_was_defaulted: bool,
    /// Midpoint of the selected g/kg/day range
    pub target_grams_per_kg: f64,
    pub daily_protein_min_g: f64,
    pub daily_protein_max_g: f64,
    pub per_meal_protein_g: f64,
    pub rationale: String,
}

/// Round to one decimal place
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn select_range(has_ckd: bool, has_diabetes: bool, egfr: Option<f64>) -> &'static ProteinRange {
    match egfr {
        Some(value) if has_ckd && has_diabetes && value < RENAL_RESTRICTION_EGFR => &PROTEIN_CKD_DIABETES,
        Some(value) if has_ckd && value < ADVANCED_CKD_EGFR => &PROTEIN_ADVANCED_CKD,
        _ => &PROTEIN_STANDARD,
    }
}

/// Calculate daily and per-meal protein targets.
///
/// Missing weight falls back to 70 kg and sets `weight_was_defaulted`.
pub fn calculate_protein_requirements(
    weight_kg: Option<f64>,
    has_ckd: bool,
    has_diabetes: bool,
    egfr: Option<f64>,
) -> ProteinCalculation {
    let (weight, defaulted) = match weight_kg {
        Some(weight) => (weight, false),
        None => (REFERENCE_WEIGHT_KG, true),
    };
    let range = select_range(has_ckd, has_diabetes, egfr);

    let daily_min = weight * range.min_g_per_kg;
    let daily_max = weight * range.max_g_per_kg;
    let per_meal = (daily_min + daily_max) / 2.0 / MEALS_PER_DAY;

    let mut rationale = range.rationale.to_string();
    if defaulted {
        rationale.push_str(DEFAULT_WEIGHT_NOTE);
    }

    ProteinCalculation {
        weight_kg: weight,
        weight_was_defaulted: defaulted,
        target_grams_per_kg: (range.min_g_per_kg + range.max_g_per_kg) / 2.0,
        daily_protein_min_g: round1(daily_min),
        daily_protein_max_g: round1(daily_max),
        per_meal_protein_g: round1(per_meal),
        rationale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ckd_with_diabetes() {
        let protein = calculate_protein_requirements(Some(80.0), true, true, Some(50.0));
        assert_eq!(protein.daily_protein_min_g, 48.0);
        assert_eq!(protein.daily_protein_max_g, 64.0);
        assert_eq!(protein.per_meal_protein_g, 18.7);
        assert!((protein.target_grams_per_kg - 0.7).abs() < 1e-9);
        assert!(!protein.weight_was_defaulted);
    }

    #[test]
    fn test_advanced_ckd_without_diabetes() {
        let protein = calculate_protein_requirements(Some(60.0), true, false, Some(40.0));
        assert_eq!(protein.daily_protein_min_g, 36.0);
        assert_eq!(protein.daily_protein_max_g, 45.0);
        assert_eq!(protein.per_meal_protein_g, 13.5);
        assert!(protein.rationale.starts_with("Advanced CKD"));
    }

    #[test]
    fn test_ckd_stage_3a_without_diabetes_is_standard() {
        let protein = calculate_protein_requirements(Some(60.0), true, false, Some(50.0));
        assert_eq!(protein.daily_protein_min_g, 48.0);
        assert_eq!(protein.daily_protein_max_g, 60.0);
    }

    #[test]
    fn test_default_weight_is_flagged() {
        let protein = calculate_protein_requirements(None, false, false, None);
        assert_eq!(protein.weight_kg, 70.0);
        assert!(protein.weight_was_defaulted);
        assert_eq!(protein.daily_protein_min_g, 56.0);
        assert_eq!(protein.daily_protein_max_g, 70.0);
        assert_eq!(protein.per_meal_protein_g, 21.0);
        assert!(protein.rationale.ends_with(DEFAULT_WEIGHT_NOTE));
    }

    #[test]
    fn test_unknown_egfr_uses_standard_range() {
        let protein = calculate_protein_requirements(Some(70.0), true, true, None);
        assert!(protein.rationale.starts_with("Standard protein intake"));
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(18.666), 18.7);
        assert_eq!(round1(48.00000000000001), 48.0);
    }
}

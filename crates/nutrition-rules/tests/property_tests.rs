//! Property-Based Tests for the Rules Engine
//!
//! These tests verify invariants that must hold for every profile:
//! - Renal safety dominates potassium whenever CKD restriction applies
//! - Exactly one potassium conflict record when HTN meets qualifying CKD
//! - Elevated serum potassium tightens the cap to 1500 mg
//! - Per-meal protein follows the daily range on every branch
//! - CKD staging is monotone in eGFR
//!
//! Uses proptest for randomized property testing with shrinking.

use nutrition_rules::{
    classify_ckd_stage, ClinicalPriority, Condition, PatientProfile, ResolutionRecord, RulesEngine,
};
use proptest::prelude::*;

fn profile_strategy() -> impl Strategy<Value = PatientProfile> {
    (
        any::<[bool; 5]>(),
        proptest::option::of(0.0..130.0f64),
        proptest::option::of(2.5..7.0f64),
        proptest::option::of(40.0..150.0f64),
        proptest::option::of(4.0..14.0f64),
    )
        .prop_map(|(flags, egfr, potassium, weight, hba1c)| {
            let mut profile = PatientProfile::new("prop");
            for (condition, present) in Condition::ALL.into_iter().zip(flags) {
                profile = profile.with_condition(condition, present);
            }
            if let Some(egfr) = egfr {
                profile = profile.with_egfr(egfr);
            }
            if let Some(potassium) = potassium {
                profile = profile.with_potassium(potassium);
            }
            if let Some(weight) = weight {
                profile = profile.with_weight_kg(weight);
            }
            if let Some(hba1c) = hba1c {
                profile = profile.with_hba1c(hba1c);
            }
            profile
        })
}

fn renal_applies(profile: &PatientProfile) -> bool {
    profile.has(Condition::ChronicKidneyDisease) && profile.egfr().map_or(false, |e| e < 60.0)
}

proptest! {
    #[test]
    fn prop_renal_branch_caps_potassium(profile in profile_strategy()) {
        let constraint = RulesEngine::new().generate_clinical_constraints(&profile).unwrap();
        if renal_applies(&profile) {
            let max = constraint.potassium().daily_max;
            prop_assert!(max.map_or(false, |m| m <= 2000.0));
            prop_assert_eq!(constraint.potassium().priority, ClinicalPriority::CriticalRenal);
            prop_assert_eq!(constraint.prohibited_foods().len(), 3);
        } else {
            prop_assert!(constraint.prohibited_foods().is_empty());
        }
    }

    #[test]
    fn prop_one_conflict_record_when_htn_meets_ckd(profile in profile_strategy()) {
        let constraint = RulesEngine::new().generate_clinical_constraints(&profile).unwrap();
        let conflicts = constraint
            .conflict_resolutions()
            .iter()
            .filter(|r| matches!(r, ResolutionRecord::Conflict(_)))
            .count();
        let expected = usize::from(renal_applies(&profile) && profile.has(Condition::Hypertension));
        prop_assert_eq!(conflicts, expected);
        prop_assert_eq!(constraint.potassium().override_reason.is_some(), expected == 1);
    }

    #[test]
    fn prop_elevated_potassium_tightens_cap(profile in profile_strategy()) {
        let constraint = RulesEngine::new().generate_clinical_constraints(&profile).unwrap();
        let elevated = profile.serum_potassium().map_or(false, |k| k > 5.0);
        if renal_applies(&profile) && elevated {
            prop_assert_eq!(constraint.potassium().daily_max, Some(1500.0));
        }
    }

    #[test]
    fn prop_per_meal_protein_formula(profile in profile_strategy()) {
        let constraint = RulesEngine::new().generate_clinical_constraints(&profile).unwrap();
        let protein = constraint.protein();
        let unrounded = protein.weight_kg * protein.target_grams_per_kg / 3.0;
        prop_assert!((protein.per_meal_protein_g - unrounded).abs() <= 0.05 + 1e-9);
        prop_assert!(protein.daily_protein_min_g <= protein.daily_protein_max_g);
        prop_assert_eq!(protein.weight_was_defaulted, profile.weight_kg().is_none());
    }

    #[test]
    fn prop_staging_is_monotone(a in 0.0..150.0f64, b in 0.0..150.0f64) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let (_, low_stage) = classify_ckd_stage(Some(low));
        let (_, high_stage) = classify_ckd_stage(Some(high));
        prop_assert!(low_stage >= high_stage);
    }

    #[test]
    fn prop_generation_is_idempotent(profile in profile_strategy()) {
        let engine = RulesEngine::new();
        let first = engine.generate_clinical_constraints(&profile).unwrap();
        let second = engine.generate_clinical_constraints(&profile).unwrap();
        prop_assert!(first.content_eq(&second));
    }
}

#[test]
fn test_staging_changes_only_at_breakpoints() {
    let breakpoints = [90.0, 60.0, 45.0, 30.0, 15.0];
    let mut previous = classify_ckd_stage(Some(130.0)).1;
    let mut changes = Vec::new();
    let mut egfr = 130.0;
    while egfr >= 0.0 {
        let stage = classify_ckd_stage(Some(egfr)).1;
        if stage != previous {
            changes.push(egfr + 0.5);
            previous = stage;
        }
        egfr -= 0.5;
    }
    assert_eq!(changes.len(), breakpoints.len());
    for (change, breakpoint) in changes.iter().zip(breakpoints) {
        assert!((change - breakpoint).abs() < 1e-9, "stage changed at {}", change);
    }
    assert_eq!(classify_ckd_stage(None).0, "unknown");
}

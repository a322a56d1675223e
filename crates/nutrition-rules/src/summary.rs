//! Human-Readable Summary
//!
//! Plain-text rendering of a [`ClinicalConstraint`] for clinicians and logs.
//! Sections without content are omitted.

use crate::constraint::ClinicalConstraint;
use crate::foods::FoodRestriction;
use crate::nutrients::{NutrientLimit, ResolutionRecord};
use std::fmt::{self, Write};

const RULE_WIDTH: usize = 80;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn section(out: &mut String, title: &str) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "{}", rule())?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", rule())
}

fn write_limit(out: &mut String, name: &str, limit: &NutrientLimit) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "{}:", name)?;
    if let Some(max) = limit.daily_max {
        writeln!(out, "  Daily maximum: {} {}", max, limit.unit)?;
    }
    if let Some(min) = limit.daily_min {
        writeln!(out, "  Daily minimum: {} {}", min, limit.unit)?;
    }
    if let Some(max) = limit.per_meal_max {
        writeln!(out, "  Per meal maximum: {} {}", max, limit.unit)?;
    }
    writeln!(out, "  Priority: {}", limit.priority)?;
    writeln!(out, "  Rationale: {}", limit.rationale)?;
    if let Some(reason) = &limit.override_reason {
        writeln!(out, "  Override: {}", reason)?;
    }
    Ok(())
}

fn write_record(out: &mut String, record: &ResolutionRecord) -> fmt::Result {
    match record {
        ResolutionRecord::Conflict(conflict) => {
            writeln!(out)?;
            writeln!(out, "Conflict: {}", conflict.conflict)?;
            writeln!(out, "  {} recommendation: {}", conflict.displaced.condition, conflict.displaced.guidance)?;
            writeln!(out, "  {} recommendation: {}", conflict.applied.condition, conflict.applied.guidance)?;
            writeln!(out, "  Resolution: {}", conflict.resolution)?;
            writeln!(out, "  Rationale: {}", conflict.rationale)?;
            if let Some(alternative) = &conflict.alternative_management {
                writeln!(out, "  Alternative management: {}", alternative)?;
            }
        }
        ResolutionRecord::Alert(alert) => {
            writeln!(out)?;
            writeln!(out, "Alert: {} ({})", alert.alert, alert.value)?;
            writeln!(out, "  Action: {}", alert.action)?;
            writeln!(out, "  Urgency: {:?}", alert.urgency)?;
            writeln!(out, "  Risk: {}", alert.risk)?;
        }
    }
    Ok(())
}

fn write_foods(out: &mut String, heading: &str, foods: &[FoodRestriction]) -> fmt::Result {
    if foods.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "{}:", heading)?;
    for food in foods {
        writeln!(out, "  * {}", food.food_name)?;
        writeln!(out, "    Reason: {}", food.reason)?;
        if let Some(timing) = &food.temporal_restriction {
            writeln!(out, "    Timing: {}", timing)?;
        }
        if let Some(condition) = &food.conditional_on {
            writeln!(out, "    Applies only with: {}", condition)?;
        }
        if !food.alternative_foods.is_empty() {
            writeln!(out, "    Alternatives: {}", food.alternative_foods.join(", "))?;
        }
    }
    Ok(())
}

fn write_summary(out: &mut String, constraint: &ClinicalConstraint) -> fmt::Result {
    writeln!(out, "{}", rule())?;
    writeln!(out, "CLINICAL NUTRITION CONSTRAINTS SUMMARY")?;
    writeln!(out, "{}", rule())?;
    writeln!(out)?;
    writeln!(out, "Patient ID: {}", constraint.user_id())?;
    writeln!(out, "Generated: {}", constraint.generation_timestamp().to_rfc3339())?;

    if let (Some(stage), Some(egfr)) = (constraint.ckd_stage(), constraint.egfr()) {
        writeln!(out)?;
        writeln!(out, "CKD Stage: {} (eGFR: {:.1} mL/min/1.73m²)", stage, egfr)?;
    }

    if !constraint.safety_notes().is_empty() {
        section(out, "SAFETY ALERTS")?;
        for note in constraint.safety_notes() {
            writeln!(out, "  * {}", note)?;
        }
    }

    if !constraint.conflict_resolutions().is_empty() {
        section(out, "CONFLICT RESOLUTIONS APPLIED")?;
        for record in constraint.conflict_resolutions() {
            write_record(out, record)?;
        }
    }

    section(out, "MACRONUTRIENT TARGETS")?;
    let protein = constraint.protein();
    writeln!(out)?;
    if protein.weight_was_defaulted {
        writeln!(out, "Protein (based on {}kg reference weight):", protein.weight_kg)?;
    } else {
        writeln!(out, "Protein (based on {}kg body weight):", protein.weight_kg)?;
    }
    writeln!(out, "  Daily target: {}-{}g", protein.daily_protein_min_g, protein.daily_protein_max_g)?;
    writeln!(out, "  Per meal: ~{}g", protein.per_meal_protein_g)?;
    writeln!(out, "  Rationale: {}", protein.rationale)?;

    let carbohydrates = constraint.carbohydrates();
    writeln!(out)?;
    writeln!(out, "Carbohydrates:")?;
    if let Some(max) = carbohydrates.per_meal_max {
        writeln!(out, "  Per meal: ≤{}{}", max, carbohydrates.unit)?;
    }
    writeln!(out, "  Rationale: {}", carbohydrates.rationale)?;

    section(out, "MICRONUTRIENT LIMITS")?;
    write_limit(out, "Sodium", constraint.sodium())?;
    write_limit(out, "Potassium", constraint.potassium())?;
    write_limit(out, "Phosphorus", constraint.phosphorus())?;

    section(out, "FOOD RESTRICTIONS")?;
    write_foods(out, "PROHIBITED FOODS", constraint.prohibited_foods())?;
    write_foods(out, "LIMITED FOODS", constraint.limited_foods())?;
    write_foods(out, "FOODS WITH WARNINGS", constraint.warning_foods())?;

    if !constraint.temporal_warnings().is_empty() {
        section(out, "MEDICATION-FOOD INTERACTIONS")?;
        for warning in constraint.temporal_warnings() {
            writeln!(out)?;
            writeln!(out, "  Medication: {}", warning.medication)?;
            writeln!(out, "  Food: {}", warning.food_interaction)?;
            writeln!(out, "  Timing: {}", warning.timing)?;
            writeln!(out, "  Reason: {}", warning.reason)?;
        }
    }

    writeln!(out)?;
    write!(out, "{}", rule())
}

/// Render the full text summary of a constraint
pub fn render_summary(constraint: &ClinicalConstraint) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_summary(&mut out, constraint);
    out
}

impl fmt::Display for ClinicalConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_summary(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Condition, PatientProfile};
    use crate::RulesEngine;

    fn render(profile: &PatientProfile) -> String {
        let constraint = RulesEngine::new().generate_clinical_constraints(profile).unwrap();
        render_summary(&constraint)
    }

    #[test]
    fn test_minimal_summary_sections() {
        let text = render(&PatientProfile::new("p-min"));
        assert!(text.starts_with(&rule()));
        assert!(text.contains("Patient ID: p-min"));
        assert!(text.contains("MACRONUTRIENT TARGETS"));
        assert!(text.contains("MICRONUTRIENT LIMITS"));
        assert!(text.contains("70kg reference weight"));
        assert!(!text.contains("CKD Stage:"));
        assert!(!text.contains("SAFETY ALERTS"));
        assert!(!text.contains("CONFLICT RESOLUTIONS"));
        assert!(!text.contains("MEDICATION-FOOD INTERACTIONS"));
    }

    #[test]
    fn test_conflict_and_override_rendered() {
        let profile = PatientProfile::new("p-conflict")
            .with_condition(Condition::Hypertension, true)
            .with_condition(Condition::ChronicKidneyDisease, true)
            .with_egfr(40.0)
            .with_potassium(5.2)
            .with_weight_kg(75.0);
        let text = render(&profile);
        assert!(text.contains("CKD Stage: Stage 3b (Moderate-Severe) (eGFR: 40.0 mL/min/1.73m²)"));
        assert!(text.contains("Conflict: HTN vs CKD Potassium Requirements"));
        assert!(text.contains("Alert: Elevated Serum Potassium (5.2 mEq/L)"));
        assert!(text.contains("  Override: "));
        assert!(text.contains("Daily maximum: 1500 mg"));
        assert!(text.contains("PROHIBITED FOODS:"));
        assert!(text.contains("Alternatives: cauliflower, turnips, radishes"));
        assert!(text.contains("75kg body weight"));
    }

    #[test]
    fn test_hypothyroidism_sections() {
        let profile = PatientProfile::new("p-thyroid").with_condition(Condition::Hypothyroidism, true);
        let text = render(&profile);
        assert!(text.contains("FOODS WITH WARNINGS:"));
        assert!(text.contains("Timing: Consume ≥4 hours after levothyroxine dose"));
        assert!(text.contains("Applies only with: confirmed iodine deficiency"));
        assert!(text.contains("Medication: Levothyroxine"));
    }

    #[test]
    fn test_display_matches_render() {
        let constraint = RulesEngine::new()
            .generate_clinical_constraints(&PatientProfile::new("p-display"))
            .unwrap();
        assert_eq!(constraint.to_string(), render_summary(&constraint));
    }
}

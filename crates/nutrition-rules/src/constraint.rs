//! Constraint Assembly
//!
//! Orchestrates the classifier and resolvers into one immutable
//! [`ClinicalConstraint`] per patient.

use crate::ckd::classify_ckd_stage;
use crate::foods::{resolve_food_restrictions, FoodRestriction};
use crate::nutrients::{
    resolve_carbohydrates, resolve_phosphorus, resolve_potassium, resolve_sodium, NutrientLimit,
    ResolutionRecord, Urgency,
};
use crate::profile::{Condition, MedicalConditions, PatientProfile};
use crate::protein::{calculate_protein_requirements, ProteinCalculation};
use crate::reference::{
    CRITICAL_POTASSIUM_MEQ_L, LEVOTHYROXINE_SOY, POOR_GLYCEMIC_HBA1C, SEVERE_CKD_EGFR,
};
use crate::RulesError;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Medication-food timing warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalWarning {
    pub medication: String,
    pub food_interaction: String,
    pub timing: String,
    pub severity: Urgency,
    pub reason: String,
}

/// Complete clinical constraints for meal generation.
///
/// Built once per call and never mutated; fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalConstraint {
    user_id: String,
    generation_timestamp: DateTime<Utc>,

    medical_conditions: MedicalConditions,
    ckd_stage: Option<String>,
    egfr: Option<f64>,
    current_potassium: Option<f64>,

    protein: ProteinCalculation,

    sodium: NutrientLimit,
    potassium: NutrientLimit,
    phosphorus: NutrientLimit,
    carbohydrates: NutrientLimit,

    prohibited_foods: Vec<FoodRestriction>,
    limited_foods: Vec<FoodRestriction>,
    warning_foods: Vec<FoodRestriction>,

    temporal_warnings: Vec<TemporalWarning>,
    conflict_resolutions: Vec<ResolutionRecord>,
    safety_notes: Vec<String>,
}

impl ClinicalConstraint {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn generation_timestamp(&self) -> DateTime<Utc> {
        self.generation_timestamp
    }

    pub fn medical_conditions(&self) -> &MedicalConditions {
        &self.medical_conditions
    }

    /// CKD stage label, `None` when eGFR is unknown
    pub fn ckd_stage(&self) -> Option<&str> {
        self.ckd_stage.as_deref()
    }

    pub fn egfr(&self) -> Option<f64> {
        self.egfr
    }

    pub fn current_potassium(&self) -> Option<f64> {
        self.current_potassium
    }

    pub fn protein(&self) -> &ProteinCalculation {
        &self.protein
    }

    pub fn sodium(&self) -> &NutrientLimit {
        &self.sodium
    }

    pub fn potassium(&self) -> &NutrientLimit {
        &self.potassium
    }

    pub fn phosphorus(&self) -> &NutrientLimit {
        &self.phosphorus
    }

    pub fn carbohydrates(&self) -> &NutrientLimit {
        &self.carbohydrates
    }

    pub fn prohibited_foods(&self) -> &[FoodRestriction] {
        &self.prohibited_foods
    }

    pub fn limited_foods(&self) -> &[FoodRestriction] {
        &self.limited_foods
    }

    pub fn warning_foods(&self) -> &[FoodRestriction] {
        &self.warning_foods
    }

    pub fn temporal_warnings(&self) -> &[TemporalWarning] {
        &self.temporal_warnings
    }

    pub fn conflict_resolutions(&self) -> &[ResolutionRecord] {
        &self.conflict_resolutions
    }

    pub fn safety_notes(&self) -> &[String] {
        &self.safety_notes
    }

    /// Same content with a different timestamp, for comparing two runs
    pub fn content_eq(&self, other: &ClinicalConstraint) -> bool {
        let mut aligned = other.clone();
        aligned.generation_timestamp = self.generation_timestamp;
        *self == aligned
    }

    pub fn to_json_pretty(&self) -> Result<String, RulesError> {
        serde_json::to_string_pretty(self).map_err(RulesError::Export)
    }

    /// Write the constraint as pretty JSON
    pub fn export_json(&self, output_path: impl AsRef<Path>) -> Result<(), RulesError> {
        let output_path = output_path.as_ref();
        fs::write(output_path, self.to_json_pretty()?)?;
        info!("Clinical constraint exported to {}", output_path.display());
        Ok(())
    }

    /// Reload a previously exported constraint
    pub fn from_json_str(json: &str) -> Result<Self, RulesError> {
        serde_json::from_str(json).map_err(RulesError::Export)
    }
}

/// Hierarchical clinical rules engine.
///
/// Holds no state: reference tables are compiled-in constants, so one engine
/// can serve any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RulesEngine;

impl RulesEngine {
    pub fn new() -> Self {
        RulesEngine
    }

    /// Generate clinical constraints stamped with the current time
    pub fn generate_clinical_constraints(&self, profile: &PatientProfile) -> Result<ClinicalConstraint, RulesError> {
        self.generate_clinical_constraints_at(profile, Utc::now())
    }

    /// Generate clinical constraints with an explicit generation timestamp
    pub fn generate_clinical_constraints_at(
        &self,
        profile: &PatientProfile,
        generated_at: DateTime<Utc>,
    ) -> Result<ClinicalConstraint, RulesError> {
        profile.validate()?;
        info!("Generating clinical constraints for {}", profile.user_id);

        let has_htn = profile.has(Condition::Hypertension);
        let has_ckd = profile.has(Condition::ChronicKidneyDisease);
        let has_diabetes = profile.has(Condition::Type2Diabetes);
        let has_hypothyroidism = profile.has(Condition::Hypothyroidism);
        let egfr = profile.egfr();
        let current_potassium = profile.serum_potassium();

        let (stage_label, _) = classify_ckd_stage(egfr);

        let potassium = resolve_potassium(has_htn, has_ckd, egfr, current_potassium);
        let protein = calculate_protein_requirements(profile.weight_kg(), has_ckd, has_diabetes, egfr);
        let sodium = resolve_sodium(has_htn, has_ckd, egfr);
        let phosphorus = resolve_phosphorus(has_ckd, egfr);
        let carbohydrates = resolve_carbohydrates(has_diabetes);
        let foods = resolve_food_restrictions(has_htn, has_ckd, egfr, has_hypothyroidism);

        let temporal_warnings = temporal_warnings(has_hypothyroidism);
        let safety_notes = safety_notes(egfr, current_potassium, has_diabetes, profile.hba1c());
        for note in &safety_notes {
            warn!("{}: {}", profile.user_id, note);
        }

        let constraint = ClinicalConstraint {
            user_id: profile.user_id.clone(),
            generation_timestamp: generated_at,
            medical_conditions: profile.medical_conditions.clone(),
            ckd_stage: egfr.map(|_| stage_label.to_string()),
            egfr,
            current_potassium,
            protein,
            sodium,
            potassium: potassium.limit,
            phosphorus,
            carbohydrates,
            prohibited_foods: foods.prohibited,
            limited_foods: foods.limited,
            warning_foods: foods.warnings,
            temporal_warnings,
            conflict_resolutions: potassium.records,
            safety_notes,
        };

        info!(
            "Clinical constraints generated for {}: {} prohibited foods, {} conflict records",
            constraint.user_id,
            constraint.prohibited_foods.len(),
            constraint.conflict_resolutions.len()
        );
        Ok(constraint)
    }

    /// Parse a JSON profile document and generate its constraints
    pub fn generate_from_json(&self, json: &str) -> Result<ClinicalConstraint, RulesError> {
        let profile = PatientProfile::from_json_str(json)?;
        self.generate_clinical_constraints(&profile)
    }
}

fn temporal_warnings(has_hypothyroidism: bool) -> Vec<TemporalWarning> {
    if !has_hypothyroidism {
        return Vec::new();
    }
    vec![TemporalWarning {
        medication: LEVOTHYROXINE_SOY.medication.to_string(),
        food_interaction: LEVOTHYROXINE_SOY.food.to_string(),
        timing: LEVOTHYROXINE_SOY.timing.to_string(),
        severity: Urgency::Medium,
        reason: LEVOTHYROXINE_SOY.reason.to_string(),
    }]
}

fn safety_notes(
    egfr: Option<f64>,
    current_potassium: Option<f64>,
    has_diabetes: bool,
    hba1c: Option<f64>,
) -> Vec<String> {
    let mut notes = Vec::new();

    if egfr.map_or(false, |value| value < SEVERE_CKD_EGFR) {
        notes.push(
            "CRITICAL: Advanced CKD (Stage 4-5). Strict dietary compliance essential. \
             Monitor K+, phosphorus, and fluid status closely."
                .to_string(),
        );
    }

    if let Some(potassium) = current_potassium.filter(|k| *k > CRITICAL_POTASSIUM_MEQ_L) {
        notes.push(format!(
            "ALERT: Elevated serum potassium ({:.1} mEq/L). Risk of cardiac arrhythmia. \
             Immediate potassium restriction required.",
            potassium
        ));
    }

    if let Some(hba1c) = hba1c.filter(|value| has_diabetes && *value > POOR_GLYCEMIC_HBA1C) {
        notes.push(format!(
            "ALERT: Poor glycemic control (HbA1c {:.1}%). Strict carbohydrate management \
             and meal timing critical.",
            hba1c
        ));
    }

    notes
}

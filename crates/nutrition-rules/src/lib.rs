//! Nutrition Rules - Hierarchical Clinical Rules Engine
//!
//! Resolves conflicting clinical nutrition guidelines into one consistent set
//! of per-patient dietary constraints.
//!
//! # Features
//!
//! - CKD staging from eGFR (KDIGO breakpoints)
//! - Priority-ordered potassium conflict resolution with an audit trail
//! - Sodium, phosphorus, carbohydrate limits and KDOQI protein targets
//! - Prohibited, limited and warning food lists with alternatives
//! - Medication-food timing warnings and safety alerts
//! - Cohort processing, optionally parallel (`parallel` feature)
//!
//! # Example
//!
//! ```rust
//! use nutrition_rules::{Condition, PatientProfile, RulesEngine};
//!
//! let profile = PatientProfile::new("patient-001")
//!     .with_condition(Condition::Hypertension, true)
//!     .with_condition(Condition::ChronicKidneyDisease, true)
//!     .with_egfr(40.0)
//!     .with_potassium(5.2);
//!
//! let constraint = RulesEngine::new().generate_clinical_constraints(&profile).unwrap();
//! assert_eq!(constraint.potassium().daily_max, Some(1500.0));
//! assert_eq!(constraint.ckd_stage(), Some("Stage 3b (Moderate-Severe)"));
//! ```

pub mod priority;
pub mod reference;
pub mod ckd;
pub mod profile;
pub mod nutrients;
pub mod protein;
pub mod foods;
pub mod constraint;
pub mod summary;
pub mod compliance;
pub mod batch;

// Re-export commonly used types for convenience
pub use batch::{export_cohort, parse_cohort, CohortConfig, CohortExport, CohortProcessor, CohortResult};
pub use ckd::{classify_ckd_stage, CkdStage};
pub use compliance::{FoodCheck, FoodStatus, MealCompliance, MealNutrients, Severity};
pub use constraint::{ClinicalConstraint, RulesEngine, TemporalWarning};
pub use foods::{FoodRestriction, RestrictionSeverity};
pub use nutrients::{
    ConflictResolution, Nutrient, NutrientLimit, ResolutionAlert, ResolutionRecord, Urgency,
};
pub use priority::ClinicalPriority;
pub use profile::{Condition, MedicalConditions, PatientProfile};
pub use protein::ProteinCalculation;
pub use summary::render_summary;

use thiserror::Error;

/// Errors that can occur while building or exporting constraints
#[derive(Debug, Error)]
pub enum RulesError {
    /// A required identity field is absent, null or blank
    #[error("profile is missing required field `{field}`")]
    MissingIdentity { field: &'static str },

    /// The profile document is not valid JSON or has wrongly typed fields
    #[error("malformed patient profile: {0}")]
    MalformedProfile(#[source] serde_json::Error),

    /// A numeric value is negative or not finite
    #[error("invalid value {value} for `{field}`")]
    InvalidLabValue { field: &'static str, value: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Constraint (de)serialization failed
    #[error("constraint export failed: {0}")]
    Export(#[source] serde_json::Error),
}

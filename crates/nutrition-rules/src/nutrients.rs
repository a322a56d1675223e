//! Per-Nutrient Resolvers
//!
//! Potassium, sodium, phosphorus and carbohydrate limits. Only potassium
//! produces conflict-resolution records: sodium's HTN+CKD case picks the
//! stricter of two equal numbers rather than overriding anything.

use crate::ckd::{classify_ckd_stage, renal_restriction_applies};
use crate::priority::ClinicalPriority;
use crate::reference::{
    LimitEntry, CARBOHYDRATES_DIABETES, CARBOHYDRATES_GENERAL, ELEVATED_POTASSIUM_MEQ_L,
    PHOSPHORUS_CKD_MODERATE, PHOSPHORUS_CKD_SEVERE, PHOSPHORUS_GENERAL, POTASSIUM_CKD,
    POTASSIUM_ELEVATED_SERUM_DAILY_MAX, POTASSIUM_GENERAL, POTASSIUM_HTN, SEVERE_CKD_EGFR,
    SODIUM_CKD, SODIUM_GENERAL, SODIUM_HTN, SODIUM_HTN_CKD,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Nutrients the engine constrains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Potassium,
    Sodium,
    Phosphorus,
    Protein,
    Carbohydrates,
}

impl Nutrient {
    pub fn display_name(&self) -> &'static str {
        match self {
            Nutrient::Potassium => "Potassium",
            Nutrient::Sodium => "Sodium",
            Nutrient::Phosphorus => "Phosphorus",
            Nutrient::Protein => "Protein",
            Nutrient::Carbohydrates => "Carbohydrates",
        }
    }
}

/// A nutrient limit with its owning priority and rationale.
///
/// Any bound may be unset; an unset bound means "no limit of that kind".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientLimit {
    pub daily_max: Option<f64>,
    pub daily_min: Option<f64>,
    pub per_meal_max: Option<f64>,
    pub per_meal_min: Option<f64>,
    pub unit: String,
    pub priority: ClinicalPriority,
    pub rationale: String,
    /// Set only when a lower-priority recommendation was displaced
    pub override_reason: Option<String>,
}

impl NutrientLimit {
    /// Whether any bound is set
    pub fn is_bounded(&self) -> bool {
        self.daily_max.is_some()
            || self.daily_min.is_some()
            || self.per_meal_max.is_some()
            || self.per_meal_min.is_some()
    }
}

/// One side of a guideline conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Condition driving the recommendation (e.g. "HTN", "CKD")
    pub condition: String,
    pub priority: ClinicalPriority,
    pub guidance: String,
}

/// Audit record for a resolved guideline conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub nutrient: Nutrient,
    pub conflict: String,
    pub applied: Recommendation,
    pub displaced: Recommendation,
    pub resolution: String,
    pub rationale: String,
    pub alternative_management: Option<String>,
}

/// Alert urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

/// High-urgency alert raised while resolving a nutrient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionAlert {
    pub nutrient: Nutrient,
    pub alert: String,
    pub value: String,
    pub action: String,
    pub urgency: Urgency,
    pub risk: String,
}

/// Entry in the constraint's `conflict_resolutions` audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionRecord {
    Conflict(ConflictResolution),
    Alert(ResolutionAlert),
}

impl ResolutionRecord {
    pub fn nutrient(&self) -> Nutrient {
        match self {
            ResolutionRecord::Conflict(conflict) => conflict.nutrient,
            ResolutionRecord::Alert(alert) => alert.nutrient,
        }
    }

    pub fn as_conflict(&self) -> Option<&ConflictResolution> {
        match self {
            ResolutionRecord::Conflict(conflict) => Some(conflict),
            ResolutionRecord::Alert(_) => None,
        }
    }

    pub fn as_alert(&self) -> Option<&ResolutionAlert> {
        match self {
            ResolutionRecord::Alert(alert) => Some(alert),
            ResolutionRecord::Conflict(_) => None,
        }
    }
}

/// Potassium limit plus the audit records produced while resolving it
#[derive(Debug, Clone, PartialEq)]
pub struct PotassiumResolution {
    pub limit: NutrientLimit,
    pub records: Vec<ResolutionRecord>,
}

struct Candidate {
    condition: &'static str,
    guidance: &'static str,
    limit: NutrientLimit,
}

impl Candidate {
    fn recommendation(&self) -> Recommendation {
        Recommendation {
            condition: self.condition.to_string(),
            priority: self.limit.priority,
            guidance: self.guidance.to_string(),
        }
    }
}

const HTN_POTASSIUM_GUIDANCE: &str = "High potassium (≥4700 mg/day) for blood pressure control";
const CKD_POTASSIUM_GUIDANCE: &str = "Low potassium (≤2000 mg/day) to prevent hyperkalemia";
const POTASSIUM_CONFLICT_RATIONALE: &str =
    "Hyperkalemia is acutely life-threatening in CKD (cardiac arrest risk). Hypertension risk is longer-term and manageable by other means.";
const HTN_ALTERNATIVE_MANAGEMENT: &str =
    "Use DASH diet principles with low-potassium food substitutions; control blood pressure with sodium restriction and antihypertensive medication";

/// Resolve the renal vs. hypertension potassium conflict.
///
/// CKD with a known eGFR below 60 caps potassium at 2000 mg/day and always
/// displaces the DASH high-potassium target. Serum potassium above
/// 5.0 mEq/L tightens the cap to 1500 mg/day and adds a separate alert.
pub fn resolve_potassium(
    has_htn: bool,
    has_ckd: bool,
    egfr: Option<f64>,
    serum_potassium: Option<f64>,
) -> PotassiumResolution {
    let mut records = Vec::new();

    if !renal_restriction_applies(has_ckd, egfr) {
        let limit = if has_htn {
            debug!("potassium: hypertension DASH target applied");
            POTASSIUM_HTN.to_limit()
        } else {
            debug!("potassium: general population limit applied");
            POTASSIUM_GENERAL.to_limit()
        };
        return PotassiumResolution { limit, records };
    }

    let (stage_label, _) = classify_ckd_stage(egfr);
    let mut renal_limit = POTASSIUM_CKD.to_limit();
    renal_limit.rationale = format!("CKD {}: {}", stage_label, POTASSIUM_CKD.rationale);
    let renal = Candidate {
        condition: "CKD",
        guidance: CKD_POTASSIUM_GUIDANCE,
        limit: renal_limit,
    };

    let mut limit = if has_htn {
        let cardiac = Candidate {
            condition: "HTN",
            guidance: HTN_POTASSIUM_GUIDANCE,
            limit: POTASSIUM_HTN.to_limit(),
        };
        let ((applied_priority, applied), (displaced_priority, displaced)) = ClinicalPriority::arbitrate(
            (renal.limit.priority, renal),
            (cardiac.limit.priority, cardiac),
        );
        debug!(
            "potassium: {} (priority {}) displaces {} (priority {})",
            applied.condition,
            applied_priority.rank(),
            displaced.condition,
            displaced_priority.rank()
        );

        records.push(ResolutionRecord::Conflict(ConflictResolution {
            nutrient: Nutrient::Potassium,
            conflict: format!("{} vs {} Potassium Requirements", displaced.condition, applied.condition),
            applied: applied.recommendation(),
            displaced: displaced.recommendation(),
            resolution: format!(
                "{} restriction applied (Priority {}: {} beats Priority {}: {})",
                applied.condition,
                applied_priority.rank(),
                applied_priority.domain(),
                displaced_priority.rank(),
                displaced_priority.domain()
            ),
            rationale: POTASSIUM_CONFLICT_RATIONALE.to_string(),
            alternative_management: Some(HTN_ALTERNATIVE_MANAGEMENT.to_string()),
        }));

        let mut limit = applied.limit;
        limit.override_reason = Some(format!(
            "{} overrides {} potassium recommendation",
            applied_priority.domain(),
            displaced.condition
        ));
        limit
    } else {
        renal.limit
    };

    if let Some(potassium) = serum_potassium.filter(|k| *k > ELEVATED_POTASSIUM_MEQ_L) {
        debug!("potassium: serum K+ {:.1} mEq/L tightens daily cap", potassium);
        limit.daily_max = Some(POTASSIUM_ELEVATED_SERUM_DAILY_MAX);
        limit.rationale.push_str(&format!(" (Current K+: {:.1} mEq/L - Elevated)", potassium));
        records.push(ResolutionRecord::Alert(ResolutionAlert {
            nutrient: Nutrient::Potassium,
            alert: "Elevated Serum Potassium".to_string(),
            value: format!("{:.1} mEq/L", potassium),
            action: format!("Reduced potassium limit to {} mg/day", POTASSIUM_ELEVATED_SERUM_DAILY_MAX),
            urgency: Urgency::High,
            risk: "Risk of cardiac arrhythmia".to_string(),
        }));
    }

    PotassiumResolution { limit, records }
}

/// Sodium limit. HTN+CKD coincides numerically with HTN alone.
pub fn resolve_sodium(has_htn: bool, has_ckd: bool, egfr: Option<f64>) -> NutrientLimit {
    let entry: &LimitEntry = if has_htn && renal_restriction_applies(has_ckd, egfr) {
        &SODIUM_HTN_CKD
    } else if has_htn {
        &SODIUM_HTN
    } else if has_ckd {
        &SODIUM_CKD
    } else {
        &SODIUM_GENERAL
    };
    entry.to_limit()
}

/// Phosphorus limit, tightening with CKD severity
pub fn resolve_phosphorus(has_ckd: bool, egfr: Option<f64>) -> NutrientLimit {
    let entry = match egfr {
        Some(value) if has_ckd && value < SEVERE_CKD_EGFR => &PHOSPHORUS_CKD_SEVERE,
        _ if renal_restriction_applies(has_ckd, egfr) => &PHOSPHORUS_CKD_MODERATE,
        _ => &PHOSPHORUS_GENERAL,
    };
    entry.to_limit()
}

/// Flat 60 g per-meal carbohydrate ceiling; priority reflects diabetes status
pub fn resolve_carbohydrates(has_diabetes: bool) -> NutrientLimit {
    if has_diabetes {
        CARBOHYDRATES_DIABETES.to_limit()
    } else {
        CARBOHYDRATES_GENERAL.to_limit()
    }
}

//! Clinical Reference Tables
//!
//! Guideline constants (KDIGO staging, KDOQI/DASH/AHA/ADA/DRI nutrient limits)
//! and the food catalogs the resolvers draw from. Everything here is `const`
//! and shared by every engine call.

use crate::ckd::CkdStage;
use crate::foods::RestrictionSeverity;
use crate::nutrients::NutrientLimit;
use crate::priority::ClinicalPriority;

// ============================================================================
// Thresholds
// ============================================================================

/// eGFR below which renal nutrient restrictions apply (CKD stage 3-5)
pub const RENAL_RESTRICTION_EGFR: f64 = 60.0;

/// eGFR below which protein is restricted without diabetes (stage 3b-5)
pub const ADVANCED_CKD_EGFR: f64 = 45.0;

/// eGFR below which CKD is severe (stage 4-5)
pub const SEVERE_CKD_EGFR: f64 = 30.0;

/// Serum potassium (mEq/L) that tightens the renal potassium cap
pub const ELEVATED_POTASSIUM_MEQ_L: f64 = 5.0;

/// Serum potassium (mEq/L) that raises an arrhythmia safety note
pub const CRITICAL_POTASSIUM_MEQ_L: f64 = 5.5;

/// HbA1c (%) above which glycemic control is considered poor
pub const POOR_GLYCEMIC_HBA1C: f64 = 9.0;

/// Weight used when the profile carries none
pub const REFERENCE_WEIGHT_KG: f64 = 70.0;

/// Meals per day used to split daily targets
pub const MEALS_PER_DAY: f64 = 3.0;

// ============================================================================
// CKD Staging (KDIGO)
// ============================================================================

/// Lower eGFR bound for a CKD stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageThreshold {
    /// Inclusive lower bound (mL/min/1.73m²)
    pub egfr_min: f64,
    pub stage: CkdStage,
    pub label: &'static str,
}

/// Staging breakpoints, ordered from best to worst kidney function
pub const CKD_STAGE_THRESHOLDS: [StageThreshold; 6] = [
    StageThreshold { egfr_min: 90.0, stage: CkdStage::Normal, label: "Stage 1-2 (Mild or Normal)" },
    StageThreshold { egfr_min: 60.0, stage: CkdStage::Stage2, label: "Stage 2 (Mild)" },
    StageThreshold { egfr_min: 45.0, stage: CkdStage::Stage3a, label: "Stage 3a (Moderate)" },
    StageThreshold { egfr_min: 30.0, stage: CkdStage::Stage3b, label: "Stage 3b (Moderate-Severe)" },
    StageThreshold { egfr_min: 15.0, stage: CkdStage::Stage4, label: "Stage 4 (Severe)" },
    StageThreshold { egfr_min: f64::NEG_INFINITY, stage: CkdStage::Stage5, label: "Stage 5 (Kidney Failure)" },
];

// ============================================================================
// Nutrient Limits
// ============================================================================

/// A guideline limit as stored in the reference tables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitEntry {
    pub daily_max: Option<f64>,
    pub daily_min: Option<f64>,
    pub per_meal_max: Option<f64>,
    pub unit: &'static str,
    pub priority: ClinicalPriority,
    pub rationale: &'static str,
}

impl LimitEntry {
    /// Materialize the entry as an owned limit
    pub fn to_limit(&self) -> NutrientLimit {
        NutrientLimit {
            daily_max: self.daily_max,
            daily_min: self.daily_min,
            per_meal_max: self.per_meal_max,
            per_meal_min: None,
            unit: self.unit.to_string(),
            priority: self.priority,
            rationale: self.rationale.to_string(),
            override_reason: None,
        }
    }
}

/// DRI general population potassium
pub const POTASSIUM_GENERAL: LimitEntry = LimitEntry {
    daily_max: Some(4700.0),
    daily_min: Some(2000.0),
    per_meal_max: Some(1500.0),
    unit: "mg",
    priority: ClinicalPriority::GeneralHealth,
    rationale: "General population recommendation",
};

/// DASH potassium target for hypertension
pub const POTASSIUM_HTN: LimitEntry = LimitEntry {
    daily_max: None,
    daily_min: Some(4700.0),
    per_meal_max: None,
    unit: "mg",
    priority: ClinicalPriority::CriticalCardiac,
    rationale: "HTN: DASH diet recommends high potassium for blood pressure control",
};

/// KDOQI potassium cap for CKD stage 3-5. Rationale is built per stage.
pub const POTASSIUM_CKD: LimitEntry = LimitEntry {
    daily_max: Some(2000.0),
    daily_min: None,
    per_meal_max: Some(650.0),
    unit: "mg",
    priority: ClinicalPriority::CriticalRenal,
    rationale: "Strict potassium restriction to prevent hyperkalemia",
};

/// Daily potassium cap once serum potassium is elevated
pub const POTASSIUM_ELEVATED_SERUM_DAILY_MAX: f64 = 1500.0;

pub const SODIUM_HTN_CKD: LimitEntry = LimitEntry {
    daily_max: Some(1500.0),
    daily_min: None,
    per_meal_max: Some(500.0),
    unit: "mg",
    priority: ClinicalPriority::CriticalCardiac,
    rationale: "HTN + CKD: Strict sodium restriction (AHA/KDOQI)",
};

pub const SODIUM_HTN: LimitEntry = LimitEntry {
    daily_max: Some(1500.0),
    daily_min: None,
    per_meal_max: Some(500.0),
    unit: "mg",
    priority: ClinicalPriority::CriticalCardiac,
    rationale: "HTN: Sodium restriction for blood pressure control (AHA)",
};

pub const SODIUM_CKD: LimitEntry = LimitEntry {
    daily_max: Some(2000.0),
    daily_min: None,
    per_meal_max: Some(650.0),
    unit: "mg",
    priority: ClinicalPriority::CriticalRenal,
    rationale: "CKD: Moderate sodium restriction (KDOQI)",
};

pub const SODIUM_GENERAL: LimitEntry = LimitEntry {
    daily_max: Some(2300.0),
    daily_min: None,
    per_meal_max: Some(750.0),
    unit: "mg",
    priority: ClinicalPriority::GeneralHealth,
    rationale: "General population recommendation (DRI)",
};

pub const PHOSPHORUS_CKD_SEVERE: LimitEntry = LimitEntry {
    daily_max: Some(800.0),
    daily_min: None,
    per_meal_max: Some(265.0),
    unit: "mg",
    priority: ClinicalPriority::CriticalRenal,
    rationale: "CKD Stage 4-5: Strict phosphorus restriction to prevent bone disease",
};

pub const PHOSPHORUS_CKD_MODERATE: LimitEntry = LimitEntry {
    daily_max: Some(1000.0),
    daily_min: None,
    per_meal_max: Some(330.0),
    unit: "mg",
    priority: ClinicalPriority::CriticalRenal,
    rationale: "CKD Stage 3: Moderate phosphorus restriction",
};

pub const PHOSPHORUS_GENERAL: LimitEntry = LimitEntry {
    daily_max: Some(1250.0),
    daily_min: None,
    per_meal_max: Some(415.0),
    unit: "mg",
    priority: ClinicalPriority::GeneralHealth,
    rationale: "General population recommendation",
};

/// ADA per-meal carbohydrate ceiling for diabetes
pub const CARBOHYDRATES_DIABETES: LimitEntry = LimitEntry {
    daily_max: None,
    daily_min: None,
    per_meal_max: Some(60.0),
    unit: "g",
    priority: ClinicalPriority::HighMetabolic,
    rationale: "Diabetes: Distribute carbs evenly across meals, prefer low GI (ADA)",
};

/// Same ceiling without a diabetes diagnosis
pub const CARBOHYDRATES_GENERAL: LimitEntry = LimitEntry {
    daily_max: None,
    daily_min: None,
    per_meal_max: Some(60.0),
    unit: "g",
    priority: ClinicalPriority::GeneralHealth,
    rationale: "General guidance: Distribute carbs evenly across meals",
};

// ============================================================================
// Protein Targets (KDOQI)
// ============================================================================

/// Protein intake range in g/kg/day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProteinRange {
    pub min_g_per_kg: f64,
    pub max_g_per_kg: f64,
    pub rationale: &'static str,
}

pub const PROTEIN_CKD_DIABETES: ProteinRange = ProteinRange {
    min_g_per_kg: 0.6,
    max_g_per_kg: 0.8,
    rationale: "CKD with Diabetes: Moderate protein restriction (0.6-0.8 g/kg/day) to slow CKD progression while maintaining adequate nutrition",
};

pub const PROTEIN_ADVANCED_CKD: ProteinRange = ProteinRange {
    min_g_per_kg: 0.6,
    max_g_per_kg: 0.75,
    rationale: "Advanced CKD (Stage 3b-5): Protein restriction (0.6-0.75 g/kg/day) to reduce uremic toxins",
};

pub const PROTEIN_STANDARD: ProteinRange = ProteinRange {
    min_g_per_kg: 0.8,
    max_g_per_kg: 1.0,
    rationale: "Standard protein intake (0.8-1.0 g/kg/day)",
};

/// Appended to the protein rationale when the reference weight was used
pub const DEFAULT_WEIGHT_NOTE: &str = " (using reference weight - actual weight unavailable)";

// ============================================================================
// Food Catalogs
// ============================================================================

/// High-potassium food restricted under CKD
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighPotassiumFood {
    pub key: &'static str,
    pub display_name: &'static str,
    /// Singular food words that select this entry in pantry checks
    pub match_keys: &'static [&'static str],
    pub potassium_mg_per_100g: u32,
    /// How the potassium content is described in the reason
    pub descriptor: &'static str,
    pub severity: RestrictionSeverity,
    /// Per-meal ceiling for limited foods
    pub per_meal_limit_g: Option<u32>,
    /// Extra sentence appended to the reason
    pub note: Option<&'static str>,
    pub alternatives: &'static [&'static str],
}

impl HighPotassiumFood {
    /// Reason text. Limited foods end with "Limit to <NNg per meal".
    pub fn reason(&self) -> String {
        let mut reason = format!("{} ({} mg/100g)", self.descriptor, self.potassium_mg_per_100g);
        if let Some(note) = self.note {
            reason.push_str(". ");
            reason.push_str(note);
        }
        if let Some(grams) = self.per_meal_limit_g {
            reason.push_str(&format!(". Limit to <{}g per meal", grams));
        }
        reason
    }
}

pub const HIGH_POTASSIUM_FOODS: &[HighPotassiumFood] = &[
    HighPotassiumFood {
        key: "potatoes",
        display_name: "Potatoes (all varieties)",
        match_keys: &["potato"],
        potassium_mg_per_100g: 425,
        descriptor: "High potassium content",
        severity: RestrictionSeverity::Prohibited,
        per_meal_limit_g: None,
        note: Some("CKD Stage 3-5 requires K+ restriction."),
        alternatives: &["cauliflower", "turnips", "radishes"],
    },
    HighPotassiumFood {
        key: "sweet_potatoes",
        display_name: "Sweet Potatoes",
        match_keys: &["sweet potato", "yam"],
        potassium_mg_per_100g: 475,
        descriptor: "Very high potassium",
        severity: RestrictionSeverity::Prohibited,
        per_meal_limit_g: None,
        note: None,
        alternatives: &["butternut_squash", "carrots"],
    },
    HighPotassiumFood {
        key: "bananas",
        display_name: "Bananas",
        match_keys: &["banana"],
        potassium_mg_per_100g: 358,
        descriptor: "High potassium",
        severity: RestrictionSeverity::Prohibited,
        per_meal_limit_g: None,
        note: None,
        alternatives: &["berries", "apples", "grapes"],
    },
    HighPotassiumFood {
        key: "oranges",
        display_name: "Oranges",
        match_keys: &["orange"],
        potassium_mg_per_100g: 181,
        descriptor: "Moderate potassium",
        severity: RestrictionSeverity::Limited,
        per_meal_limit_g: None,
        note: None,
        alternatives: &["lemons", "limes"],
    },
    HighPotassiumFood {
        key: "tomatoes",
        display_name: "Tomatoes",
        match_keys: &["tomato"],
        potassium_mg_per_100g: 237,
        descriptor: "Moderate potassium",
        severity: RestrictionSeverity::Limited,
        per_meal_limit_g: Some(50),
        note: None,
        alternatives: &["cucumber", "bell_peppers"],
    },
    HighPotassiumFood {
        key: "spinach",
        display_name: "Spinach",
        match_keys: &["spinach"],
        potassium_mg_per_100g: 558,
        descriptor: "Very high potassium",
        severity: RestrictionSeverity::Limited,
        per_meal_limit_g: Some(30),
        note: None,
        alternatives: &["lettuce", "bok_choy"],
    },
];

/// Catalog keys restricted under CKD stage 3-5, in emission order
pub const RENAL_RESTRICTED_FOODS: &[&str] = &["potatoes", "sweet_potatoes", "bananas", "tomatoes", "spinach"];

/// Look up a catalog entry by key
pub fn high_potassium_food(key: &str) -> Option<&'static HighPotassiumFood> {
    HIGH_POTASSIUM_FOODS.iter().find(|food| food.key == key)
}

/// Potato caveat for hypertension without qualifying CKD
pub const HTN_POTATO_WARNING: FoodWarningEntry = FoodWarningEntry {
    display_name: "Potatoes (especially fried/processed)",
    match_keys: &["potato", "fries"],
    reason: "Often prepared with high sodium. Prefer baked/steamed without salt.",
    priority: ClinicalPriority::CriticalCardiac,
    alternatives: &["sweet_potatoes_baked", "cauliflower_mash"],
    temporal_restriction: None,
    conditional_on: None,
};

/// Warning-level food entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodWarningEntry {
    pub display_name: &'static str,
    pub match_keys: &'static [&'static str],
    pub reason: &'static str,
    pub priority: ClinicalPriority,
    pub alternatives: &'static [&'static str],
    pub temporal_restriction: Option<&'static str>,
    /// Condition the consumer must confirm before enforcing the warning
    pub conditional_on: Option<&'static str>,
}

/// Goitrogenic and absorption-interfering foods for hypothyroidism
pub const GOITROGENIC_FOODS: &[FoodWarningEntry] = &[
    FoodWarningEntry {
        display_name: "Soy Products (tofu, soy milk, edamame)",
        match_keys: &["soy", "soybean", "tofu", "edamame", "tempeh", "miso"],
        reason: "Soy interferes with levothyroxine absorption (reduces efficacy by up to 50%)",
        priority: ClinicalPriority::LowEndocrine,
        alternatives: &["almond_milk", "oat_milk", "chicken", "fish"],
        temporal_restriction: Some("Consume ≥4 hours after levothyroxine dose"),
        conditional_on: None,
    },
    FoodWarningEntry {
        display_name: "Cabbage, Broccoli, Cauliflower (Cruciferous vegetables)",
        match_keys: &["cabbage", "broccoli", "cauliflower", "kale", "brussels sprout"],
        reason: "Goitrogenic effect only significant with iodine deficiency. Generally safe when cooked. Only restrict if iodine deficiency confirmed.",
        priority: ClinicalPriority::LowEndocrine,
        alternatives: &[],
        temporal_restriction: None,
        conditional_on: Some("confirmed iodine deficiency"),
    },
];

// ============================================================================
// Medication-Food Interactions
// ============================================================================

/// Medication-food timing interaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MedicationFoodInteraction {
    pub medication: &'static str,
    pub food: &'static str,
    pub timing: &'static str,
    pub reason: &'static str,
}

pub const LEVOTHYROXINE_SOY: MedicationFoodInteraction = MedicationFoodInteraction {
    medication: "Levothyroxine",
    food: "Soy products",
    timing: "Take levothyroxine on empty stomach; wait ≥4 hours before consuming soy",
    reason: "Soy reduces levothyroxine absorption by up to 50%",
};

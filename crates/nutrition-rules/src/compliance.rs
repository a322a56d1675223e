//! Constraint Consumer Checks
//!
//! Read-only queries that pantry and recipe tooling run against a generated
//! [`ClinicalConstraint`]: is this food allowed, and does this meal fit the
//! per-meal limits.

use crate::constraint::ClinicalConstraint;
use crate::foods::{best_match, normalize_food_name, FoodRestriction};
use crate::nutrients::{Nutrient, NutrientLimit};
use crate::profile::Condition;
use serde::{Deserialize, Serialize};

/// Fraction of the potassium per-meal cap that triggers a near-limit warning
pub const POTASSIUM_NEAR_LIMIT_FRACTION: f64 = 0.9;

/// Allowed relative deviation from the per-meal protein target
pub const PROTEIN_TOLERANCE_FRACTION: f64 = 0.3;

/// Risk attached to a food check or meal violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

// ============================================================================
// Food Checks
// ============================================================================

/// Outcome of checking one food against the restriction lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodStatus {
    /// On the prohibited list
    Prohibited,
    /// On the limited list; a per-meal ceiling may apply
    Restricted,
    /// On the warning list
    Caution,
    /// Not restricted
    Safe,
}

impl FoodStatus {
    pub fn severity(&self) -> Severity {
        match self {
            FoodStatus::Prohibited => Severity::Critical,
            FoodStatus::Restricted => Severity::High,
            FoodStatus::Caution => Severity::Medium,
            FoodStatus::Safe => Severity::Low,
        }
    }

    /// Whether the food may appear in a meal at all
    pub fn is_usable(&self) -> bool {
        !matches!(self, FoodStatus::Prohibited)
    }
}

/// Result of [`ClinicalConstraint::check_food`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodCheck {
    pub item_name: String,
    pub status: FoodStatus,
    pub severity: Severity,
    pub quantity_available_g: Option<f64>,
    /// Grams allowed per meal; zero for prohibited foods
    pub quantity_allowed_g: Option<f64>,
    pub message: String,
    pub timing: Option<String>,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl FoodCheck {
    /// Whether the available quantity is above the per-meal allowance
    pub fn exceeds_allowance(&self) -> bool {
        match (self.quantity_available_g, self.quantity_allowed_g) {
            (Some(available), Some(allowed)) => available > allowed,
            _ => false,
        }
    }

    fn from_restriction(
        item_name: String,
        status: FoodStatus,
        restriction: &FoodRestriction,
        quantity_g: Option<f64>,
    ) -> Self {
        let (label, allowed) = match status {
            FoodStatus::Prohibited => ("PROHIBITED", Some(0.0)),
            FoodStatus::Restricted => ("RESTRICTED", restriction.allowed_per_meal_g()),
            _ => ("CAUTION", None),
        };
        FoodCheck {
            item_name,
            status,
            severity: status.severity(),
            quantity_available_g: quantity_g,
            quantity_allowed_g: allowed,
            message: format!("{}: {}", label, restriction.reason),
            timing: restriction.temporal_restriction.clone(),
            alternatives: restriction.alternative_foods.clone(),
        }
    }
}

impl ClinicalConstraint {
    /// Check a food against the prohibited, limited and warning lists, in that order.
    /// Within a list the most specific name wins.
    pub fn check_food(&self, name: &str, quantity_g: Option<f64>) -> FoodCheck {
        let item_name = normalize_food_name(name);
        let lists = [
            (FoodStatus::Prohibited, self.prohibited_foods()),
            (FoodStatus::Restricted, self.limited_foods()),
            (FoodStatus::Caution, self.warning_foods()),
        ];

        for (status, foods) in lists {
            if let Some(restriction) = best_match(foods, &item_name) {
                return FoodCheck::from_restriction(item_name, status, restriction, quantity_g);
            }
        }

        FoodCheck {
            item_name,
            status: FoodStatus::Safe,
            severity: Severity::Low,
            quantity_available_g: quantity_g,
            quantity_allowed_g: None,
            message: "No clinical restriction".to_string(),
            timing: None,
            alternatives: Vec::new(),
        }
    }
}

// ============================================================================
// Meal Checks
// ============================================================================

/// Nutrient content of one meal or recipe serving
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MealNutrients {
    pub potassium_mg: f64,
    pub sodium_mg: f64,
    pub phosphorus_mg: f64,
    pub protein_g: f64,
    pub carbohydrates_g: f64,
}

/// Per-meal limit exceeded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub nutrient: Nutrient,
    pub value: f64,
    pub limit: f64,
    pub severity: Severity,
    /// Lab value backing the limit, when known
    pub citation: Option<String>,
}

/// Value close to or outside a soft target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceWarning {
    pub nutrient: Nutrient,
    pub value: f64,
    /// Limit or target the value was compared against
    pub reference: f64,
    pub message: String,
}

/// Result of [`ClinicalConstraint::check_meal`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealCompliance {
    pub compliant: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<ComplianceWarning>,
}

impl MealCompliance {
    pub fn overall_status(&self) -> &'static str {
        if self.compliant {
            "SAFE"
        } else {
            "UNSAFE"
        }
    }

    /// Most severe violation, if any
    pub fn worst_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.severity).min()
    }
}

fn over_per_meal_cap(
    nutrient: Nutrient,
    value: f64,
    limit: &NutrientLimit,
    severity: Severity,
    citation: Option<String>,
) -> Option<Violation> {
    let cap = limit.per_meal_max?;
    (value > cap).then(|| Violation {
        nutrient,
        value,
        limit: cap,
        severity,
        citation,
    })
}

impl ClinicalConstraint {
    /// Check one meal against the per-meal limits.
    ///
    /// Limits without a per-meal bound are not checked. Carbohydrates are only
    /// enforced for patients with type 2 diabetes.
    pub fn check_meal(&self, meal: &MealNutrients) -> MealCompliance {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        let egfr_citation = self.egfr().map(|egfr| format!("eGFR {:.1} mL/min/1.73m²", egfr));
        match over_per_meal_cap(
            Nutrient::Potassium,
            meal.potassium_mg,
            self.potassium(),
            Severity::Critical,
            egfr_citation,
        ) {
            Some(violation) => violations.push(violation),
            None => {
                if let Some(cap) = self.potassium().per_meal_max {
                    if meal.potassium_mg > cap * POTASSIUM_NEAR_LIMIT_FRACTION {
                        warnings.push(ComplianceWarning {
                            nutrient: Nutrient::Potassium,
                            value: meal.potassium_mg,
                            reference: cap,
                            message: "Near limit - monitor closely".to_string(),
                        });
                    }
                }
            }
        }

        violations.extend(over_per_meal_cap(
            Nutrient::Sodium,
            meal.sodium_mg,
            self.sodium(),
            Severity::High,
            None,
        ));
        violations.extend(over_per_meal_cap(
            Nutrient::Phosphorus,
            meal.phosphorus_mg,
            self.phosphorus(),
            Severity::High,
            None,
        ));

        let protein_target = self.protein().per_meal_protein_g;
        if (meal.protein_g - protein_target).abs() > protein_target * PROTEIN_TOLERANCE_FRACTION {
            warnings.push(ComplianceWarning {
                nutrient: Nutrient::Protein,
                value: meal.protein_g,
                reference: protein_target,
                message: "Protein outside recommended range".to_string(),
            });
        }

        if self.medical_conditions().has(Condition::Type2Diabetes) {
            violations.extend(over_per_meal_cap(
                Nutrient::Carbohydrates,
                meal.carbohydrates_g,
                self.carbohydrates(),
                Severity::Medium,
                None,
            ));
        }

        MealCompliance {
            compliant: violations.is_empty(),
            violations,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::PatientProfile;
    use crate::RulesEngine;

    fn renal_constraint() -> ClinicalConstraint {
        let profile = PatientProfile::new("p-renal")
            .with_condition(Condition::Hypertension, true)
            .with_condition(Condition::ChronicKidneyDisease, true)
            .with_condition(Condition::Type2Diabetes, true)
            .with_condition(Condition::Hypothyroidism, true)
            .with_egfr(40.0)
            .with_weight_kg(75.0);
        RulesEngine::new().generate_clinical_constraints(&profile).unwrap()
    }

    fn balanced_meal(constraint: &ClinicalConstraint) -> MealNutrients {
        MealNutrients {
            potassium_mg: 300.0,
            sodium_mg: 400.0,
            phosphorus_mg: 200.0,
            protein_g: constraint.protein().per_meal_protein_g,
            carbohydrates_g: 45.0,
        }
    }

    #[test]
    fn test_prohibited_food() {
        let check = renal_constraint().check_food("banana", Some(120.0));
        assert_eq!(check.status, FoodStatus::Prohibited);
        assert_eq!(check.severity, Severity::Critical);
        assert_eq!(check.quantity_allowed_g, Some(0.0));
        assert!(check.exceeds_allowance());
        assert!(check.message.starts_with("PROHIBITED: High potassium"));
        assert_eq!(check.alternatives, vec!["berries", "apples", "grapes"]);
        assert!(!check.status.is_usable());
    }

    #[test]
    fn test_restricted_food_uses_per_meal_ceiling() {
        let constraint = renal_constraint();
        let check = constraint.check_food("Tomato", Some(40.0));
        assert_eq!(check.status, FoodStatus::Restricted);
        assert_eq!(check.quantity_allowed_g, Some(50.0));
        assert!(!check.exceeds_allowance());

        let check = constraint.check_food("spinach", Some(100.0));
        assert_eq!(check.quantity_allowed_g, Some(30.0));
        assert!(check.exceeds_allowance());
    }

    #[test]
    fn test_ceiling_falls_back_to_reason_text() {
        let mut constraint = renal_constraint();
        let json = constraint.to_json_pretty().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["limited_foods"][0]["per_meal_limit_g"] = serde_json::Value::Null;
        constraint = ClinicalConstraint::from_json_str(&value.to_string()).unwrap();
        let check = constraint.check_food("tomatoes", None);
        assert_eq!(check.quantity_allowed_g, Some(50.0));
    }

    #[test]
    fn test_caution_food_carries_timing() {
        let check = renal_constraint().check_food("soy", None);
        assert_eq!(check.status, FoodStatus::Caution);
        assert_eq!(check.timing.as_deref(), Some("Consume ≥4 hours after levothyroxine dose"));
    }

    #[test]
    fn test_unlisted_food_is_safe() {
        let check = renal_constraint().check_food("white_rice", Some(200.0));
        assert_eq!(check.status, FoodStatus::Safe);
        assert_eq!(check.item_name, "white rice");
        assert!(!check.exceeds_allowance());
    }

    #[test]
    fn test_cruciferous_dish_is_caution() {
        let check = renal_constraint().check_food("cauliflower_rice", Some(200.0));
        assert_eq!(check.status, FoodStatus::Caution);
        assert!(check.message.contains("iodine deficiency"));
    }

    #[test]
    fn test_pantry_names_match_on_whole_words() {
        let profile = PatientProfile::new("p-pantry")
            .with_condition(Condition::ChronicKidneyDisease, true)
            .with_condition(Condition::Hypothyroidism, true)
            .with_egfr(25.0);
        let constraint = RulesEngine::new().generate_clinical_constraints(&profile).unwrap();

        let expected = [
            ("baby_spinach", FoodStatus::Restricted),
            ("potato chips", FoodStatus::Prohibited),
            ("ripe banana", FoodStatus::Prohibited),
            ("sweet potato fries", FoodStatus::Prohibited),
            ("to", FoodStatus::Safe),
            ("milk", FoodStatus::Safe),
            ("edamame", FoodStatus::Caution),
        ];
        for (item, status) in expected {
            assert_eq!(constraint.check_food(item, None).status, status, "{}", item);
        }

        let baby_spinach = constraint.check_food("baby_spinach", Some(50.0));
        assert_eq!(baby_spinach.quantity_allowed_g, Some(30.0));
        assert!(baby_spinach.exceeds_allowance());
        let fries = constraint.check_food("sweet potato fries", None);
        assert!(fries.message.contains("Very high potassium"));
    }

    #[test]
    fn test_balanced_meal_is_compliant() {
        let constraint = renal_constraint();
        let result = constraint.check_meal(&balanced_meal(&constraint));
        assert!(result.compliant);
        assert_eq!(result.overall_status(), "SAFE");
        assert!(result.warnings.is_empty());
        assert_eq!(result.worst_severity(), None);
    }

    #[test]
    fn test_potassium_over_cap_is_critical() {
        let constraint = renal_constraint();
        let cap = constraint.potassium().per_meal_max.unwrap();
        let meal = MealNutrients {
            potassium_mg: cap + 1.0,
            ..balanced_meal(&constraint)
        };
        let result = constraint.check_meal(&meal);
        assert!(!result.compliant);
        assert_eq!(result.overall_status(), "UNSAFE");
        assert_eq!(result.violations[0].nutrient, Nutrient::Potassium);
        assert_eq!(result.worst_severity(), Some(Severity::Critical));
        assert_eq!(result.violations[0].citation.as_deref(), Some("eGFR 40.0 mL/min/1.73m²"));
    }

    #[test]
    fn test_potassium_near_cap_warns() {
        let constraint = renal_constraint();
        let cap = constraint.potassium().per_meal_max.unwrap();
        let meal = MealNutrients {
            potassium_mg: cap * 0.95,
            ..balanced_meal(&constraint)
        };
        let result = constraint.check_meal(&meal);
        assert!(result.compliant);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].nutrient, Nutrient::Potassium);
    }

    #[test]
    fn test_sodium_phosphorus_and_carbs() {
        let constraint = renal_constraint();
        let meal = MealNutrients {
            sodium_mg: 5000.0,
            phosphorus_mg: 5000.0,
            carbohydrates_g: 120.0,
            ..balanced_meal(&constraint)
        };
        let result = constraint.check_meal(&meal);
        let nutrients: Vec<_> = result.violations.iter().map(|v| (v.nutrient, v.severity)).collect();
        assert_eq!(
            nutrients,
            vec![
                (Nutrient::Sodium, Severity::High),
                (Nutrient::Phosphorus, Severity::High),
                (Nutrient::Carbohydrates, Severity::Medium),
            ]
        );
    }

    #[test]
    fn test_carbs_ignored_without_diabetes() {
        let constraint = RulesEngine::new()
            .generate_clinical_constraints(&PatientProfile::new("p-general"))
            .unwrap();
        let meal = MealNutrients {
            carbohydrates_g: 200.0,
            protein_g: constraint.protein().per_meal_protein_g,
            ..MealNutrients::default()
        };
        assert!(constraint.check_meal(&meal).compliant);
    }

    #[test]
    fn test_protein_deviation_warns() {
        let constraint = renal_constraint();
        let meal = MealNutrients {
            protein_g: constraint.protein().per_meal_protein_g * 2.0,
            ..balanced_meal(&constraint)
        };
        let result = constraint.check_meal(&meal);
        assert!(result.compliant);
        assert_eq!(result.warnings[0].nutrient, Nutrient::Protein);
    }
}

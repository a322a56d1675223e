//! Patient Profile
//!
//! Input contract supplied by the patient-extraction collaborator. Accepts the
//! extraction document shape (`renal_profile`, `serum_creatinine`,
//! `anchor_age`, unit strings alongside values) as well as the shorter names.

use crate::RulesError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fields a profile must carry before any rule runs
pub const REQUIRED_IDENTITY_FIELDS: [&str; 2] = ["user_id", "medical_conditions"];

/// Chronic conditions the rules engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Condition {
    Hypertension,
    Type2Diabetes,
    ChronicKidneyDisease,
    Dyslipidemia,
    Hypothyroidism,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::Hypertension,
        Condition::Type2Diabetes,
        Condition::ChronicKidneyDisease,
        Condition::Dyslipidemia,
        Condition::Hypothyroidism,
    ];

    /// Key used in `medical_conditions`
    pub fn key(&self) -> &'static str {
        match self {
            Condition::Hypertension => "hypertension",
            Condition::Type2Diabetes => "type2_diabetes",
            Condition::ChronicKidneyDisease => "chronic_kidney_disease",
            Condition::Dyslipidemia => "dyslipidemia",
            Condition::Hypothyroidism => "hypothyroidism",
        }
    }
}

/// Condition name → presence. Absent and `null` flags both read as "not present".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Option<bool>>", into = "BTreeMap<String, bool>")]
pub struct MedicalConditions(BTreeMap<String, bool>);

impl MedicalConditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a condition is flagged present
    pub fn has(&self, condition: Condition) -> bool {
        self.0.get(condition.key()).copied().unwrap_or(false)
    }

    /// Set a condition flag
    pub fn with(mut self, condition: Condition, present: bool) -> Self {
        self.0.insert(condition.key().to_string(), present);
        self
    }

    /// Raw flag by name, including conditions the engine has no rules for
    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(name, present)| (name.as_str(), *present))
    }

    /// Names of conditions flagged present
    pub fn present(&self) -> Vec<&str> {
        self.iter().filter(|(_, present)| *present).map(|(name, _)| name).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, Option<bool>>> for MedicalConditions {
    fn from(raw: BTreeMap<String, Option<bool>>) -> Self {
        MedicalConditions(
            raw.into_iter()
                .filter_map(|(name, flag)| flag.map(|present| (name, present)))
                .collect(),
        )
    }
}

impl From<MedicalConditions> for BTreeMap<String, bool> {
    fn from(conditions: MedicalConditions) -> Self {
        conditions.0
    }
}

/// Demographics block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Demographics {
    #[serde(alias = "anchor_age")]
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub weight_kg: Option<f64>,
}

/// Renal function labs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenalProfile {
    /// mL/min/1.73m²
    pub egfr: Option<f64>,
    /// mg/dL
    #[serde(alias = "serum_creatinine")]
    pub creatinine: Option<f64>,
    /// mg/dL
    pub bun: Option<f64>,
}

/// Serum electrolytes (mEq/L)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Electrolytes {
    pub sodium: Option<f64>,
    pub potassium: Option<f64>,
    pub chloride: Option<f64>,
}

/// Glycemic labs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiabetesLabs {
    /// %
    pub hba1c: Option<f64>,
    /// mg/dL
    #[serde(alias = "glucose")]
    pub fasting_blood_sugar: Option<f64>,
    /// Post-prandial blood sugar, mg/dL
    pub ppbs: Option<f64>,
}

/// Lipid panel (mg/dL)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LipidProfile {
    pub triglycerides: Option<f64>,
    pub total_cholesterol: Option<f64>,
    pub ldl: Option<f64>,
    pub hdl: Option<f64>,
}

/// Grouped laboratory results. Any group or value may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaboratoryResults {
    #[serde(alias = "renal", deserialize_with = "null_as_default")]
    pub renal_profile: RenalProfile,
    #[serde(deserialize_with = "null_as_default")]
    pub electrolytes: Electrolytes,
    #[serde(deserialize_with = "null_as_default")]
    pub diabetes: DiabetesLabs,
    #[serde(alias = "lipid_panel", deserialize_with = "null_as_default")]
    pub lipid_profile: LipidProfile,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Patient profile consumed by the rules engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub user_id: String,
    pub medical_conditions: MedicalConditions,
    #[serde(default, deserialize_with = "null_as_default")]
    pub demographics: Demographics,
    #[serde(default, deserialize_with = "null_as_default")]
    pub laboratory_results: LaboratoryResults,
}

impl PatientProfile {
    /// Empty profile with no conditions and no labs
    pub fn new(user_id: impl Into<String>) -> Self {
        PatientProfile {
            user_id: user_id.into(),
            medical_conditions: MedicalConditions::new(),
            demographics: Demographics::default(),
            laboratory_results: LaboratoryResults::default(),
        }
    }

    /// Parse a profile from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, RulesError> {
        let value: Value = serde_json::from_str(json).map_err(RulesError::MalformedProfile)?;
        Self::from_value(value)
    }

    /// Parse a profile from an already-decoded JSON value.
    ///
    /// Missing `user_id`/`medical_conditions` is reported as
    /// [`RulesError::MissingIdentity`]; wrongly typed values as
    /// [`RulesError::MalformedProfile`].
    pub fn from_value(value: Value) -> Result<Self, RulesError> {
        if let Some(fields) = value.as_object() {
            for field in REQUIRED_IDENTITY_FIELDS {
                if matches!(fields.get(field), None | Some(Value::Null)) {
                    return Err(RulesError::MissingIdentity { field });
                }
            }
        }
        let profile: PatientProfile =
            serde_json::from_value(value).map_err(RulesError::MalformedProfile)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check identity and numeric sanity of an in-memory profile
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.user_id.trim().is_empty() {
            return Err(RulesError::MissingIdentity { field: "user_id" });
        }
        for (field, value) in self.numeric_fields() {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(RulesError::InvalidLabValue { field, value: v });
                }
            }
        }
        Ok(())
    }

    fn numeric_fields(&self) -> [(&'static str, Option<f64>); 14] {
        let labs = &self.laboratory_results;
        [
            ("demographics.weight_kg", self.demographics.weight_kg),
            ("renal_profile.egfr", labs.renal_profile.egfr),
            ("renal_profile.creatinine", labs.renal_profile.creatinine),
            ("renal_profile.bun", labs.renal_profile.bun),
            ("electrolytes.sodium", labs.electrolytes.sodium),
            ("electrolytes.potassium", labs.electrolytes.potassium),
            ("electrolytes.chloride", labs.electrolytes.chloride),
            ("diabetes.hba1c", labs.diabetes.hba1c),
            ("diabetes.fasting_blood_sugar", labs.diabetes.fasting_blood_sugar),
            ("diabetes.ppbs", labs.diabetes.ppbs),
            ("lipid_profile.triglycerides", labs.lipid_profile.triglycerides),
            ("lipid_profile.total_cholesterol", labs.lipid_profile.total_cholesterol),
            ("lipid_profile.ldl", labs.lipid_profile.ldl),
            ("lipid_profile.hdl", labs.lipid_profile.hdl),
        ]
    }

    pub fn has(&self, condition: Condition) -> bool {
        self.medical_conditions.has(condition)
    }

    pub fn egfr(&self) -> Option<f64> {
        self.laboratory_results.renal_profile.egfr
    }

    /// Serum potassium, mEq/L
    pub fn serum_potassium(&self) -> Option<f64> {
        self.laboratory_results.electrolytes.potassium
    }

    pub fn hba1c(&self) -> Option<f64> {
        self.laboratory_results.diabetes.hba1c
    }

    pub fn weight_kg(&self) -> Option<f64> {
        self.demographics.weight_kg
    }

    pub fn with_condition(mut self, condition: Condition, present: bool) -> Self {
        self.medical_conditions = self.medical_conditions.with(condition, present);
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.demographics.age = Some(age);
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.demographics.gender = Some(gender.into());
        self
    }

    pub fn with_weight_kg(mut self, weight_kg: f64) -> Self {
        self.demographics.weight_kg = Some(weight_kg);
        self
    }

    pub fn with_egfr(mut self, egfr: f64) -> Self {
        self.laboratory_results.renal_profile.egfr = Some(egfr);
        self
    }

    pub fn with_potassium(mut self, potassium: f64) -> Self {
        self.laboratory_results.electrolytes.potassium = Some(potassium);
        self
    }

    pub fn with_hba1c(mut self, hba1c: f64) -> Self {
        self.laboratory_results.diabetes.hba1c = Some(hba1c);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extraction_document() -> Value {
        json!({
            "user_id": "MIMIC_10001",
            "subject_id": 10001,
            "demographics": { "anchor_age": 67, "gender": "F", "weight_kg": 72.5 },
            "medical_conditions": {
                "hypertension": true,
                "type2_diabetes": true,
                "chronic_kidney_disease": true,
                "dyslipidemia": true
            },
            "laboratory_results": {
                "diabetes": { "fasting_blood_sugar": 142.0, "ppbs": null, "hba1c": 7.9, "unit_hba1c": "%" },
                "renal_profile": { "serum_creatinine": 1.8, "egfr": 38.0, "bun": 31.0, "unit_egfr": "mL/min/1.73m²" },
                "lipid_profile": { "triglycerides": 180.0, "total_cholesterol": 210.0, "ldl": null, "hdl": 42.0, "unit": "mg/dL" },
                "electrolytes": { "sodium": 139.0, "potassium": 5.1, "chloride": 101.0, "unit": "mEq/L" }
            },
            "extraction_metadata": { "source": "MIMIC-IV" }
        })
    }

    #[test]
    fn test_parses_extraction_document() {
        let profile = PatientProfile::from_value(extraction_document()).unwrap();
        assert_eq!(profile.user_id, "MIMIC_10001");
        assert_eq!(profile.demographics.age, Some(67));
        assert_eq!(profile.weight_kg(), Some(72.5));
        assert_eq!(profile.egfr(), Some(38.0));
        assert_eq!(profile.laboratory_results.renal_profile.creatinine, Some(1.8));
        assert_eq!(profile.serum_potassium(), Some(5.1));
        assert_eq!(profile.laboratory_results.lipid_profile.ldl, None);
        assert!(profile.has(Condition::ChronicKidneyDisease));
        assert!(!profile.has(Condition::Hypothyroidism));
    }

    #[test]
    fn test_missing_labs_are_unknown() {
        let profile = PatientProfile::from_json_str(
            r#"{"user_id": "p1", "medical_conditions": {"hypertension": true}}"#,
        )
        .unwrap();
        assert_eq!(profile.egfr(), None);
        assert_eq!(profile.serum_potassium(), None);
        assert_eq!(profile.weight_kg(), None);
    }

    #[test]
    fn test_null_groups_and_flags() {
        let profile = PatientProfile::from_json_str(
            r#"{"user_id": "p1", "medical_conditions": {"hypertension": null},
                "demographics": null, "laboratory_results": {"renal_profile": null}}"#,
        )
        .unwrap();
        assert!(!profile.has(Condition::Hypertension));
        assert_eq!(profile.medical_conditions.get("hypertension"), None);
        assert_eq!(profile.egfr(), None);
    }

    #[test]
    fn test_missing_identity() {
        let err = PatientProfile::from_json_str(r#"{"medical_conditions": {}}"#).unwrap_err();
        assert!(matches!(err, RulesError::MissingIdentity { field: "user_id" }));

        let err = PatientProfile::from_json_str(r#"{"user_id": "p1"}"#).unwrap_err();
        assert!(matches!(err, RulesError::MissingIdentity { field: "medical_conditions" }));

        let err = PatientProfile::from_json_str(r#"{"user_id": "  ", "medical_conditions": {}}"#).unwrap_err();
        assert!(matches!(err, RulesError::MissingIdentity { field: "user_id" }));
    }

    #[test]
    fn test_non_numeric_lab_is_malformed() {
        let mut doc = extraction_document();
        doc["laboratory_results"]["renal_profile"]["egfr"] = json!("forty");
        let err = PatientProfile::from_value(doc).unwrap_err();
        assert!(matches!(err, RulesError::MalformedProfile(_)));
    }

    #[test]
    fn test_non_boolean_condition_is_malformed() {
        let err = PatientProfile::from_json_str(
            r#"{"user_id": "p1", "medical_conditions": {"hypertension": "yes"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RulesError::MalformedProfile(_)));
    }

    #[test]
    fn test_negative_lab_rejected() {
        let profile = PatientProfile::new("p1").with_egfr(-3.0);
        let err = profile.validate().unwrap_err();
        assert!(matches!(err, RulesError::InvalidLabValue { field: "renal_profile.egfr", .. }));

        let profile = PatientProfile::new("p1").with_potassium(f64::NAN);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_conditions_round_trip_as_plain_map() {
        let conditions = MedicalConditions::new()
            .with(Condition::Hypertension, true)
            .with(Condition::Hypothyroidism, false);
        let json = serde_json::to_value(&conditions).unwrap();
        assert_eq!(json, json!({"hypertension": true, "hypothyroidism": false}));
        assert_eq!(conditions.present(), vec!["hypertension"]);
    }
}

//! CKD Staging
//!
//! Classifies kidney function from eGFR using the KDIGO breakpoints in
//! [`crate::reference::CKD_STAGE_THRESHOLDS`].

use crate::reference::{CKD_STAGE_THRESHOLDS, RENAL_RESTRICTION_EGFR};
use serde::{Deserialize, Serialize};

/// Label reported when eGFR is not available
pub const UNKNOWN_STAGE_LABEL: &str = "unknown";

/// Chronic kidney disease stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CkdStage {
    /// eGFR >= 90
    Normal,
    /// eGFR >= 90 with other markers of kidney damage
    Stage1,
    /// eGFR 60-89 (Mild)
    Stage2,
    /// eGFR 45-59 (Moderate decline)
    Stage3a,
    /// eGFR 30-44 (Moderate to severe)
    Stage3b,
    /// eGFR 15-29 (Severe)
    Stage4,
    /// eGFR < 15 (Kidney failure)
    Stage5,
}

impl CkdStage {
    /// Stage for a known eGFR (mL/min/1.73m²)
    pub fn from_egfr(egfr: f64) -> Self {
        classify(egfr).1
    }

    /// Whether renal nutrient restrictions apply (stage 3a or worse)
    pub fn requires_renal_restriction(&self) -> bool {
        *self >= CkdStage::Stage3a
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            CkdStage::Normal => "Normal or high kidney function",
            CkdStage::Stage1 => "Kidney damage with normal function",
            CkdStage::Stage2 => "Mildly decreased kidney function",
            CkdStage::Stage3a => "Mild to moderately decreased kidney function",
            CkdStage::Stage3b => "Moderately to severely decreased kidney function",
            CkdStage::Stage4 => "Severely decreased kidney function",
            CkdStage::Stage5 => "Kidney failure",
        }
    }
}

fn classify(egfr: f64) -> (&'static str, CkdStage) {
    CKD_STAGE_THRESHOLDS
        .iter()
        .find(|threshold| egfr >= threshold.egfr_min)
        .map(|threshold| (threshold.label, threshold.stage))
        .unwrap_or((CKD_STAGE_THRESHOLDS[5].label, CkdStage::Stage5))
}

/// Classify CKD stage from eGFR.
///
/// Returns `("unknown", None)` when eGFR is absent.
pub fn classify_ckd_stage(egfr: Option<f64>) -> (&'static str, Option<CkdStage>) {
    match egfr {
        Some(value) => {
            let (label, stage) = classify(value);
            (label, Some(stage))
        }
        None => (UNKNOWN_STAGE_LABEL, None),
    }
}

/// Whether CKD renal nutrient restrictions apply.
///
/// Requires the CKD flag and a known eGFR strictly below 60. An unknown eGFR
/// never triggers the renal branch.
pub fn renal_restriction_applies(has_ckd: bool, egfr: Option<f64>) -> bool {
    has_ckd && egfr.map_or(false, |value| value < RENAL_RESTRICTION_EGFR)
}

//! Clinical Priority Hierarchy
//!
//! Every nutrient limit and food restriction is owned by exactly one priority.
//! When two conditions disagree, the lower rank wins.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Clinical priority levels (lower rank = higher priority)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClinicalPriority {
    /// Life-threatening renal risk (hyperkalemia, uremia)
    CriticalRenal = 1,
    /// Life-threatening cardiac risk (hypertensive crisis)
    CriticalCardiac = 2,
    /// Serious metabolic risk (diabetic complications)
    HighMetabolic = 3,
    /// Cardiovascular risk from lipids
    MediumLipid = 4,
    /// Manageable endocrine interactions (medication timing)
    LowEndocrine = 5,
    /// General wellness
    GeneralHealth = 6,
}

impl ClinicalPriority {
    /// Numeric rank, 1 is the most urgent
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Whether `self` displaces `other` in a conflict
    pub fn outranks(self, other: ClinicalPriority) -> bool {
        self.rank() < other.rank()
    }

    /// Pick the winning side of a two-way conflict.
    ///
    /// Returns `(winner, loser)`. Ties keep the first argument in front.
    pub fn arbitrate<T>(first: (ClinicalPriority, T), second: (ClinicalPriority, T)) -> ((ClinicalPriority, T), (ClinicalPriority, T)) {
        if second.0.outranks(first.0) {
            (second, first)
        } else {
            (first, second)
        }
    }

    /// Stable upper-case name used in summaries
    pub fn name(self) -> &'static str {
        match self {
            ClinicalPriority::CriticalRenal => "CRITICAL_RENAL",
            ClinicalPriority::CriticalCardiac => "CRITICAL_CARDIAC",
            ClinicalPriority::HighMetabolic => "HIGH_METABOLIC",
            ClinicalPriority::MediumLipid => "MEDIUM_LIPID",
            ClinicalPriority::LowEndocrine => "LOW_ENDOCRINE",
            ClinicalPriority::GeneralHealth => "GENERAL_HEALTH",
        }
    }

    /// Clinical domain this priority protects
    pub fn domain(self) -> &'static str {
        match self {
            ClinicalPriority::CriticalRenal => "Renal Safety",
            ClinicalPriority::CriticalCardiac => "Cardiovascular Safety",
            ClinicalPriority::HighMetabolic => "Metabolic Control",
            ClinicalPriority::MediumLipid => "Lipid Management",
            ClinicalPriority::LowEndocrine => "Endocrine Balance",
            ClinicalPriority::GeneralHealth => "General Health",
        }
    }
}

impl fmt::Display for ClinicalPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

//! Cohort Processing
//!
//! Generates constraints for every profile in an extraction cohort.
//! Supports parallel processing via rayon when the `parallel` feature is enabled.
//!
//! # Example
//!
//! ```ignore
//! use nutrition_rules::batch::{CohortConfig, CohortProcessor, parse_cohort};
//!
//! let profiles = parse_cohort(&std::fs::read_to_string("cohort.json")?)?;
//! let processor = CohortProcessor::new(CohortConfig::default().with_skip_invalid(true));
//! let result = processor.process_values(profiles)?;
//! println!("Generated {} constraints", result.success_count());
//! ```

use crate::constraint::{ClinicalConstraint, RulesEngine};
use crate::profile::PatientProfile;
use crate::RulesError;
use log::{info, warn};
use serde::de::Error as _;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Key holding the profile array in an extraction cohort document
pub const COHORT_PROFILES_KEY: &str = "user_profiles";

/// Configuration for cohort processing
#[derive(Clone, Debug)]
pub struct CohortConfig {
    /// Enable parallel processing
    pub parallel: bool,
    /// Record invalid profiles as failures instead of aborting
    pub skip_invalid: bool,
}

impl Default for CohortConfig {
    fn default() -> Self {
        CohortConfig {
            parallel: true,
            skip_invalid: false,
        }
    }
}

impl CohortConfig {
    /// Enable/disable parallel processing
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Skip invalid profiles
    pub fn with_skip_invalid(mut self, skip: bool) -> Self {
        self.skip_invalid = skip;
        self
    }
}

/// A profile that could not be turned into constraints
#[derive(Debug)]
pub struct CohortFailure {
    /// Position in the cohort
    pub index: usize,
    pub user_id: Option<String>,
    pub error: RulesError,
}

/// Statistics from cohort processing
#[derive(Clone, Debug, Default)]
pub struct CohortStats {
    /// Total processing time in milliseconds
    pub processing_time_ms: u64,
    /// Average generation time per constraint in microseconds
    pub avg_generation_time_us: f64,
    /// Constraints carrying at least one safety note
    pub with_safety_notes: usize,
    /// Constraints carrying at least one conflict-resolution record
    pub with_conflicts: usize,
}

/// Result from cohort processing, in cohort order
#[derive(Debug)]
pub struct CohortResult {
    pub constraints: Vec<ClinicalConstraint>,
    pub failures: Vec<CohortFailure>,
    pub stats: CohortStats,
}

impl CohortResult {
    pub fn success_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn total_count(&self) -> usize {
        self.constraints.len() + self.failures.len()
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_count() == 0 {
            0.0
        } else {
            self.constraints.len() as f64 / self.total_count() as f64
        }
    }
}

/// Split a cohort document into per-profile JSON values.
///
/// Accepts `{"user_profiles": [...]}` or a bare array of profiles.
pub fn parse_cohort(json: &str) -> Result<Vec<Value>, RulesError> {
    let document: Value = serde_json::from_str(json).map_err(RulesError::MalformedProfile)?;
    match document {
        Value::Array(profiles) => Ok(profiles),
        Value::Object(mut fields) => match fields.remove(COHORT_PROFILES_KEY) {
            Some(Value::Array(profiles)) => Ok(profiles),
            _ => Err(RulesError::MalformedProfile(serde_json::Error::custom(format!(
                "cohort document needs a `{}` array",
                COHORT_PROFILES_KEY
            )))),
        },
        _ => Err(RulesError::MalformedProfile(serde_json::Error::custom(
            "cohort document must be an object or an array",
        ))),
    }
}

type Outcome = (usize, Option<String>, Result<ClinicalConstraint, RulesError>);

/// Cohort processor wrapping a [`RulesEngine`]
pub struct CohortProcessor {
    engine: RulesEngine,
    config: CohortConfig,
}

impl CohortProcessor {
    pub fn new(config: CohortConfig) -> Self {
        CohortProcessor {
            engine: RulesEngine::new(),
            config,
        }
    }

    pub fn config(&self) -> &CohortConfig {
        &self.config
    }

    /// Generate constraints for already-parsed profiles
    pub fn process(&self, profiles: &[PatientProfile]) -> Result<CohortResult, RulesError> {
        let start_time = Instant::now();
        let outcomes = self.run(profiles, |profile| {
            (Some(profile.user_id.clone()), self.engine.generate_clinical_constraints(profile))
        });
        self.collect(outcomes, start_time)
    }

    /// Parse and generate constraints for raw JSON profiles
    pub fn process_values(&self, profiles: Vec<Value>) -> Result<CohortResult, RulesError> {
        let start_time = Instant::now();
        let outcomes = self.run(&profiles, |value| {
            let user_id = value.get("user_id").and_then(Value::as_str).map(str::to_string);
            let result = PatientProfile::from_value(value.clone())
                .and_then(|profile| self.engine.generate_clinical_constraints(&profile));
            (user_id, result)
        });
        self.collect(outcomes, start_time)
    }

    fn run<I, F>(&self, items: &[I], generate: F) -> Vec<Outcome>
    where
        I: Sync,
        F: Fn(&I) -> (Option<String>, Result<ClinicalConstraint, RulesError>) + Sync,
    {
        if self.config.parallel {
            self.run_parallel(items, generate)
        } else {
            self.run_sequential(items, generate)
        }
    }

    /// Generate with parallel processing
    #[cfg(feature = "parallel")]
    fn run_parallel<I, F>(&self, items: &[I], generate: F) -> Vec<Outcome>
    where
        I: Sync,
        F: Fn(&I) -> (Option<String>, Result<ClinicalConstraint, RulesError>) + Sync,
    {
        use rayon::prelude::*;

        items
            .par_iter()
            .enumerate()
            .map(|(idx, item)| {
                let (user_id, result) = generate(item);
                (idx, user_id, result)
            })
            .collect()
    }

    /// Fallback when parallel feature is disabled
    #[cfg(not(feature = "parallel"))]
    fn run_parallel<I, F>(&self, items: &[I], generate: F) -> Vec<Outcome>
    where
        F: Fn(&I) -> (Option<String>, Result<ClinicalConstraint, RulesError>),
    {
        self.run_sequential(items, generate)
    }

    /// Sequential generation
    fn run_sequential<I, F>(&self, items: &[I], generate: F) -> Vec<Outcome>
    where
        F: Fn(&I) -> (Option<String>, Result<ClinicalConstraint, RulesError>),
    {
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let (user_id, result) = generate(item);
                (idx, user_id, result)
            })
            .collect()
    }

    fn collect(&self, outcomes: Vec<Outcome>, start_time: Instant) -> Result<CohortResult, RulesError> {
        let mut constraints = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();

        for (index, user_id, result) in outcomes {
            match result {
                Ok(constraint) => constraints.push(constraint),
                Err(error) if self.config.skip_invalid => {
                    warn!(
                        "Skipping profile {} ({}): {}",
                        index,
                        user_id.as_deref().unwrap_or("no user_id"),
                        error
                    );
                    failures.push(CohortFailure { index, user_id, error });
                }
                Err(error) => return Err(error),
            }
        }

        let elapsed = start_time.elapsed();
        let stats = CohortStats {
            processing_time_ms: elapsed.as_millis() as u64,
            avg_generation_time_us: if constraints.is_empty() {
                0.0
            } else {
                elapsed.as_micros() as f64 / constraints.len() as f64
            },
            with_safety_notes: constraints.iter().filter(|c| !c.safety_notes().is_empty()).count(),
            with_conflicts: constraints.iter().filter(|c| !c.conflict_resolutions().is_empty()).count(),
        };

        info!(
            "Cohort processed: {} constraints, {} failures in {} ms",
            constraints.len(),
            failures.len(),
            stats.processing_time_ms
        );

        Ok(CohortResult {
            constraints,
            failures,
            stats,
        })
    }
}

impl Default for CohortProcessor {
    fn default() -> Self {
        Self::new(CohortConfig::default())
    }
}

// ============================================================================
// Export
// ============================================================================

/// Files written by [`export_cohort`]
#[derive(Debug, Default)]
pub struct CohortExport {
    /// Paths written, in cohort order
    pub written: Vec<PathBuf>,
    /// User ids whose file name was already taken; nothing was written for them
    pub duplicates: Vec<String>,
}

/// File name for an exported constraint.
///
/// Characters outside `[A-Za-z0-9_-]` become `_`, so the name never leaves the
/// output directory. An id with no usable characters falls back to its position.
pub fn export_file_name(user_id: &str, position: usize) -> String {
    let stem: String = user_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if stem.chars().all(|c| c == '_') {
        format!("clinical_constraint_profile_{}.json", position)
    } else {
        format!("clinical_constraint_{}.json", stem)
    }
}

/// Write every constraint of a cohort to `output_dir` as pretty JSON.
///
/// A constraint whose file name collides with an earlier one in the same run
/// is reported in [`CohortExport::duplicates`] and not written.
pub fn export_cohort(result: &CohortResult, output_dir: &Path) -> Result<CohortExport, RulesError> {
    fs::create_dir_all(output_dir)?;
    let mut export = CohortExport::default();
    let mut taken = HashSet::new();

    for (position, constraint) in result.constraints.iter().enumerate() {
        let file_name = export_file_name(constraint.user_id(), position);
        if !taken.insert(file_name.clone()) {
            warn!("Duplicate export {} for user {}; not written", file_name, constraint.user_id());
            export.duplicates.push(constraint.user_id().to_string());
            continue;
        }
        let path = output_dir.join(file_name);
        constraint.export_json(&path)?;
        export.written.push(path);
    }

    Ok(export)
}

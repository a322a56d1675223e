//! Nutrition Rules CLI Tool
//!
//! Generate clinical nutrition constraints from patient profiles and query
//! exported constraints.
//!
//! Usage:
//!   nutrition-rules generate <profile> [--format json|compact|summary] [--output <file>]
//!   nutrition-rules cohort <cohort> --output-dir <dir> [--sequential] [--skip-invalid]
//!   nutrition-rules stage <egfr>
//!   nutrition-rules check --constraint <file> --food <name> [--quantity-g <g>]
//!   nutrition-rules meal --constraint <file> --meal <file>

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use nutrition_rules::*;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "nutrition-rules")]
#[command(version)]
#[command(about = "Resolve conflicting clinical nutrition guidelines into per-patient constraints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file (stdout if not specified)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Log rule decisions (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Compact,
    Summary,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate constraints for one patient profile
    Generate {
        /// Patient profile JSON file
        profile: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Generate constraints for every profile in a cohort file
    Cohort {
        /// Cohort JSON file ({"user_profiles": [...]} or an array)
        cohort: PathBuf,

        /// Directory receiving one constraint file per patient
        #[arg(short = 'd', long)]
        output_dir: PathBuf,

        /// Disable parallel processing
        #[arg(long)]
        sequential: bool,

        /// Record invalid profiles and continue
        #[arg(long)]
        skip_invalid: bool,

        /// Do not print per-patient summaries
        #[arg(short, long)]
        quiet: bool,
    },

    /// Classify CKD stage from an eGFR value
    Stage {
        /// eGFR in mL/min/1.73m²
        egfr: f64,
    },

    /// Check a food against an exported constraint
    Check {
        /// Exported constraint JSON file
        #[arg(short, long)]
        constraint: PathBuf,

        /// Food name
        #[arg(short, long)]
        food: String,

        /// Quantity available in grams
        #[arg(short, long)]
        quantity_g: Option<f64>,
    },

    /// Check a meal's nutrient content against an exported constraint
    Meal {
        /// Exported constraint JSON file
        #[arg(short, long)]
        constraint: PathBuf,

        /// Meal nutrients JSON file (potassium_mg, sodium_mg, ...)
        #[arg(short, long)]
        meal: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let output_str = match cli.command {
        Commands::Generate { profile, format } => {
            let json = fs::read_to_string(&profile)?;
            let constraint = RulesEngine::new().generate_from_json(&json)?;
            match format {
                OutputFormat::Json => constraint.to_json_pretty()?,
                OutputFormat::Compact => serde_json::to_string(&constraint)?,
                OutputFormat::Summary => render_summary(&constraint),
            }
        }
        Commands::Cohort { cohort, output_dir, sequential, skip_invalid, quiet } => {
            run_cohort(&cohort, &output_dir, sequential, skip_invalid, quiet)?
        }
        Commands::Stage { egfr } => {
            let (label, stage) = classify_ckd_stage(Some(egfr));
            let stage = stage.ok_or("eGFR did not map to a stage")?;
            serde_json::to_string_pretty(&serde_json::json!({
                "egfr": egfr,
                "stage": stage,
                "label": label,
                "description": stage.description(),
                "renal_restriction": stage.requires_renal_restriction(),
            }))?
        }
        Commands::Check { constraint, food, quantity_g } => {
            let constraint = load_constraint(&constraint)?;
            let check = constraint.check_food(&food, quantity_g);
            print_food_check(&check);
            serde_json::to_string_pretty(&check)?
        }
        Commands::Meal { constraint, meal } => {
            let constraint = load_constraint(&constraint)?;
            let meal: MealNutrients = serde_json::from_str(&fs::read_to_string(&meal)?)?;
            let compliance = constraint.check_meal(&meal);
            print_meal_compliance(&compliance);
            serde_json::to_string_pretty(&compliance)?
        }
    };

    if let Some(output_path) = cli.output {
        fs::write(&output_path, &output_str)?;
        eprintln!("Output written to: {}", output_path.display());
    } else {
        println!("{}", output_str);
    }

    Ok(())
}

fn load_constraint(path: &Path) -> Result<ClinicalConstraint, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(path)?;
    Ok(ClinicalConstraint::from_json_str(&json)?)
}

fn run_cohort(
    cohort: &Path,
    output_dir: &Path,
    sequential: bool,
    skip_invalid: bool,
    quiet: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let profiles = parse_cohort(&fs::read_to_string(cohort)?)?;
    eprintln!("{} {} profiles from {}", "Loaded".green().bold(), profiles.len(), cohort.display());

    let config = CohortConfig::default()
        .with_parallel(!sequential)
        .with_skip_invalid(skip_invalid);
    let result = CohortProcessor::new(config).process_values(profiles)?;

    if !quiet {
        for constraint in &result.constraints {
            eprintln!("{}", render_summary(constraint));
        }
    }
    let export = export_cohort(&result, output_dir)?;
    let written: Vec<_> = export.written.iter().map(|path| path.display().to_string()).collect();

    eprintln!("{}", "═".repeat(50).green());
    eprintln!("{}", "COHORT RESULTS".green().bold());
    eprintln!("{}", "═".repeat(50).green());
    eprintln!("  Constraints: {}", result.success_count());
    eprintln!("  Failures: {}", result.failures.len() + export.duplicates.len());
    eprintln!("  With safety alerts: {}", result.stats.with_safety_notes);
    eprintln!("  With conflict resolutions: {}", result.stats.with_conflicts);
    eprintln!("  Processing time: {} ms", result.stats.processing_time_ms);
    for failure in &result.failures {
        eprintln!(
            "  {} profile {} ({}): {}",
            "SKIPPED".yellow(),
            failure.index,
            failure.user_id.as_deref().unwrap_or("no user_id"),
            failure.error
        );
    }
    for user_id in &export.duplicates {
        eprintln!("  {} duplicate user_id {}", "SKIPPED".yellow(), user_id);
    }

    let failures: Vec<_> = result
        .failures
        .iter()
        .map(|failure| {
            serde_json::json!({
                "index": failure.index,
                "user_id": failure.user_id,
                "error": failure.error.to_string(),
            })
        })
        .chain(export.duplicates.iter().map(|user_id| {
            serde_json::json!({
                "user_id": user_id,
                "error": "duplicate user_id; constraint not written",
            })
        }))
        .collect();

    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "status": "success",
        "constraints_written": written,
        "failures": failures,
        "processing_time_ms": result.stats.processing_time_ms,
    }))?)
}

fn print_food_check(check: &FoodCheck) {
    let status = match check.status {
        FoodStatus::Prohibited => "PROHIBITED".red().bold(),
        FoodStatus::Restricted => "RESTRICTED".yellow().bold(),
        FoodStatus::Caution => "CAUTION".cyan().bold(),
        FoodStatus::Safe => "SAFE".green().bold(),
    };
    eprintln!("{} {}", status, check.item_name);
    if let Some(allowed) = check.quantity_allowed_g {
        eprintln!("  Allowed per meal: {}g", allowed);
    }
    if check.exceeds_allowance() {
        eprintln!("  {}", "Available quantity exceeds the per-meal allowance".red());
    }
    if !check.alternatives.is_empty() {
        eprintln!("  Alternatives: {}", check.alternatives.join(", "));
    }
}

fn print_meal_compliance(compliance: &MealCompliance) {
    let status = if compliance.compliant {
        compliance.overall_status().green().bold()
    } else {
        compliance.overall_status().red().bold()
    };
    eprintln!("Meal status: {}", status);
    for violation in &compliance.violations {
        eprintln!(
            "  {:?} {}: {} > {}",
            violation.severity,
            violation.nutrient.display_name(),
            violation.value,
            violation.limit
        );
    }
    for warning in &compliance.warnings {
        eprintln!("  {} {}: {}", "warning".yellow(), warning.nutrient.display_name(), warning.message);
    }
}

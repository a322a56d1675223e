//! Benchmarks for constraint generation
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nutrition_rules::{CohortConfig, CohortProcessor, Condition, PatientProfile, RulesEngine};

fn complex_profile(id: usize) -> PatientProfile {
    PatientProfile::new(format!("bench-{}", id))
        .with_condition(Condition::Hypertension, true)
        .with_condition(Condition::ChronicKidneyDisease, true)
        .with_condition(Condition::Type2Diabetes, id % 2 == 0)
        .with_condition(Condition::Hypothyroidism, id % 3 == 0)
        .with_egfr(15.0 + (id % 50) as f64)
        .with_potassium(4.5 + (id % 10) as f64 * 0.15)
        .with_weight_kg(60.0 + (id % 30) as f64)
}

fn bench_single(c: &mut Criterion) {
    let engine = RulesEngine::new();
    let simple = PatientProfile::new("bench-simple").with_condition(Condition::Hypertension, true);
    let complex = complex_profile(6);

    c.bench_function("generate_htn_only", |b| {
        b.iter(|| engine.generate_clinical_constraints(black_box(&simple)))
    });

    c.bench_function("generate_multimorbid", |b| {
        b.iter(|| engine.generate_clinical_constraints(black_box(&complex)))
    });

    let constraint = engine.generate_clinical_constraints(&complex).unwrap();
    c.bench_function("export_json", |b| b.iter(|| black_box(&constraint).to_json_pretty()));
}

fn bench_cohort(c: &mut Criterion) {
    let mut group = c.benchmark_group("cohort");

    for size in [100usize, 1000] {
        let profiles: Vec<_> = (0..size).map(complex_profile).collect();
        let sequential = CohortProcessor::new(CohortConfig::default().with_parallel(false));
        let parallel = CohortProcessor::new(CohortConfig::default().with_parallel(true));

        group.bench_with_input(BenchmarkId::new("sequential", size), &profiles, |b, p| {
            b.iter(|| sequential.process(black_box(p)))
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), &profiles, |b, p| {
            b.iter(|| parallel.process(black_box(p)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single, bench_cohort);
criterion_main!(benches);

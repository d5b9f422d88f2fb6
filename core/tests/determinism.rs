//! Determinism tests.
//!
//! CRITICAL: Same dataset + same parameters must produce bit-identical
//! result bundles. If these tests fail, something in the pipeline reads
//! state it should not (iteration order, clock, platform RNG).

use taxben_core::{
    config::EngineConfig,
    output::OutputExtract,
    synth::{generate, PopulationSpec},
    types::DistributionStatistic,
    TaxBenEngine,
};

fn build_engine(seed: u64) -> TaxBenEngine {
    let data = generate(&PopulationSpec::with_households(250), seed).expect("generate population");
    TaxBenEngine::new(EngineConfig::builtin(), data)
}

#[test]
fn same_seed_produces_identical_bundles() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;

    let engine_a = build_engine(SEED);
    let engine_b = build_engine(SEED);

    for stat in DistributionStatistic::ALL {
        let a = engine_a.baseline(stat).expect("baseline a");
        let b = engine_b.baseline(stat).expect("baseline b");
        assert_eq!(a.bundle, b.bundle, "bundles diverged for {}", stat.label());
        assert_eq!(a.extract, b.extract, "groupings diverged for {}", stat.label());
        // run metadata is per run, never part of the comparison
        assert_ne!(a.run.run_id, b.run.run_id);
    }
}

#[test]
fn repeated_reform_runs_are_identical() {
    let engine = build_engine(77);
    let mut params = engine.config().baseline.clone();
    params.tva_rate = 0.18;
    params.bsa_income_threshold = 500.0;

    let first = engine.run_reform(DistributionStatistic::Income, &params).expect("first run");
    let second = engine.run_reform(DistributionStatistic::Income, &params).expect("second run");
    assert_eq!(first.bundle, second.bundle);
    assert_eq!(
        OutputExtract::from_simulation(&first.simulated),
        OutputExtract::from_simulation(&second.simulated)
    );
}

#[test]
fn serialized_bundles_are_byte_identical() {
    let a = build_engine(5).baseline(DistributionStatistic::Consumption).expect("baseline a");
    let b = build_engine(5).baseline(DistributionStatistic::Consumption).expect("baseline b");
    let json_a = serde_json::to_string(&a.bundle).expect("serialize a");
    let json_b = serde_json::to_string(&b.bundle).expect("serialize b");
    assert_eq!(json_a, json_b);
}

#[test]
fn different_seeds_produce_different_results() {
    let a = build_engine(42).baseline(DistributionStatistic::Consumption).expect("baseline a");
    let b = build_engine(99).baseline(DistributionStatistic::Consumption).expect("baseline b");
    assert_ne!(a.bundle, b.bundle, "Different seeds produced identical bundles; seed is not being used");
}

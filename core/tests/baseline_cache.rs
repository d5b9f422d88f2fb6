//! Baseline cache tests: single computation per key, concurrency, retry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use taxben_core::{
    analysis::run_analysis,
    cache::{BaselineArtifacts, BaselineCache},
    config::EngineConfig,
    error::EngineError,
    synth::{generate, PopulationSpec},
    types::{DistributionStatistic, RunInfo, RunKind},
    TaxBenEngine,
};

fn build_engine(households: usize) -> TaxBenEngine {
    let data = generate(&PopulationSpec::with_households(households), 13).expect("generate population");
    TaxBenEngine::new(EngineConfig::builtin(), data)
}

fn compute(engine: &TaxBenEngine, stat: DistributionStatistic) -> BaselineArtifacts {
    let sim = engine.simulate(&engine.config().baseline);
    let (bundle, frame) = run_analysis(&sim, stat, None).expect("analysis");
    BaselineArtifacts {
        run: RunInfo::start(RunKind::Baseline, stat),
        bundle,
        extract: frame.extract(),
    }
}

#[test]
fn concurrent_first_requests_compute_once() {
    let engine = build_engine(60);
    let cache = BaselineCache::new();
    let computed = AtomicUsize::new(0);
    let stat = DistributionStatistic::Income;

    let results: Vec<Arc<BaselineArtifacts>> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    cache
                        .get_or_compute(stat, || {
                            computed.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            Ok(compute(&engine, stat))
                        })
                        .expect("cache lookup")
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("thread panicked")).collect()
    });

    assert_eq!(computed.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
}

#[test]
fn different_keys_are_computed_independently() {
    let engine = build_engine(40);
    let cache = BaselineCache::new();
    let computed = AtomicUsize::new(0);

    thread::scope(|s| {
        for stat in DistributionStatistic::ALL {
            let (cache, computed, engine) = (&cache, &computed, &engine);
            s.spawn(move || {
                cache
                    .get_or_compute(stat, || {
                        computed.fetch_add(1, Ordering::SeqCst);
                        Ok(compute(engine, stat))
                    })
                    .expect("cache lookup");
            });
        }
    });

    assert_eq!(computed.load(Ordering::SeqCst), 4);
    assert_eq!(cache.len(), 4);
}

#[test]
fn failed_computation_is_retried() {
    let engine = build_engine(20);
    let cache = BaselineCache::new();
    let stat = DistributionStatistic::Consumption;

    let err = cache
        .get_or_compute(stat, || Err(EngineError::InvalidSelector(9)))
        .expect_err("computation fails");
    assert!(matches!(err, EngineError::InvalidSelector(9)));
    assert!(!cache.contains(stat));
    assert!(cache.is_empty());

    let entry = cache.get_or_compute(stat, || Ok(compute(&engine, stat))).expect("retry");
    assert!(cache.contains(stat));
    assert_eq!(entry.run.stat, stat);
}

#[test]
fn engine_baseline_is_served_from_cache() {
    let engine = build_engine(50);
    let first = engine.baseline(DistributionStatistic::IncomeNetIndirect).expect("first");
    let second = engine.baseline(DistributionStatistic::IncomeNetIndirect).expect("second");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.run.run_id, second.run.run_id);
    assert_eq!(engine.cache().len(), 1);
}

#[test]
fn warm_cache_populates_every_statistic() {
    let engine = build_engine(50);
    assert!(engine.cache().is_empty());
    assert_eq!(engine.warm_cache(), 4);
    for stat in DistributionStatistic::ALL {
        assert!(engine.cache().contains(stat));
    }
    // warming again hits the cache
    let before = engine.cache().get(DistributionStatistic::Consumption).expect("cached");
    assert_eq!(engine.warm_cache(), 4);
    let after = engine.cache().get(DistributionStatistic::Consumption).expect("cached");
    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn concurrent_engine_requests_share_one_baseline() {
    let engine = build_engine(80);
    let ids: Vec<String> = thread::scope(|s| {
        let handles: Vec<_> = (0..6)
            .map(|_| s.spawn(|| engine.baseline(DistributionStatistic::Consumption).expect("baseline").run.run_id.clone()))
            .collect();
        handles.into_iter().map(|h| h.join().expect("thread panicked")).collect()
    });
    assert!(ids.iter().all(|id| *id == ids[0]));
}

//! The engine façade: prepared data, baseline cache, reform runs.
//!
//! PIPELINE (fixed, documented, never reordered):
//!   1. Uprating & preparation        (once, at construction)
//!   2. Policy simulation             (simulation.rs)
//!   3. Distributional analysis       (analysis.rs)
//!   4. Baseline cache                (cache.rs, baseline runs only)
//!
//! RULES:
//!   - The prepared dataset is immutable once built and shared by every run.
//!   - A reform run always takes its deciles and household types from
//!     the cached baseline for the same distribution statistic.
//!   - Parameter override errors never abort a run.

use crate::{
    analysis::run_analysis,
    budget::RunBudget,
    cache::{BaselineArtifacts, BaselineCache},
    compare::Comparison,
    config::{EngineConfig, PolicyParams},
    dataset::Dataset,
    error::{EngineError, EngineResult},
    results::ResultBundle,
    simulation::{Simulation, SimulatedDataset},
    types::{DistributionStatistic, RunInfo, RunKind},
    uprating::{prepare, PreparedDataset},
};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A finished reform run.
#[derive(Debug, Clone)]
pub struct ReformOutcome {
    pub run:       RunInfo,
    pub params:    PolicyParams,
    pub bundle:    ResultBundle,
    pub simulated: SimulatedDataset,
}

/// A reform compared against its baseline.
#[derive(Debug)]
pub struct ComparisonOutcome {
    pub baseline:     Arc<BaselineArtifacts>,
    pub reform:       ReformOutcome,
    pub comparison:   Comparison,
    /// Overrides that were rejected and left at their baseline value.
    pub param_errors: Vec<EngineError>,
}

pub struct TaxBenEngine {
    config:     EngineConfig,
    data:       Arc<PreparedDataset>,
    simulation: Simulation,
    cache:      BaselineCache,
}

impl TaxBenEngine {
    pub fn new(config: EngineConfig, dataset: Dataset) -> Self {
        let data = prepare(dataset, &config.uprating, &config.catalog, &config.baseline);
        log::info!(
            "engine: prepared {} persons in {} households",
            data.len(),
            data.households.len()
        );
        Self {
            config,
            data: Arc::new(data),
            simulation: Simulation::standard(),
            cache: BaselineCache::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn data(&self) -> &Arc<PreparedDataset> {
        &self.data
    }

    pub fn cache(&self) -> &BaselineCache {
        &self.cache
    }

    /// Baseline parameters on top of user overrides, with the overrides
    /// that were rejected.
    pub fn reform_params(&self, overrides: &Map<String, Value>) -> (PolicyParams, Vec<EngineError>) {
        self.config.baseline.with_overrides(overrides, &self.config.catalog)
    }

    /// Simulate without analysis. Used for output extracts.
    pub fn simulate(&self, params: &PolicyParams) -> SimulatedDataset {
        self.simulation.run(&self.data, params)
    }

    // ── Baseline ───────────────────────────────────────────────────

    pub fn baseline(&self, stat: DistributionStatistic) -> EngineResult<Arc<BaselineArtifacts>> {
        self.baseline_within(stat, &RunBudget::unlimited())
    }

    pub fn baseline_within(
        &self,
        stat: DistributionStatistic,
        budget: &RunBudget,
    ) -> EngineResult<Arc<BaselineArtifacts>> {
        self.cache.get_or_compute(stat, || self.compute_baseline(stat, budget))
    }

    fn compute_baseline(&self, stat: DistributionStatistic, budget: &RunBudget) -> EngineResult<BaselineArtifacts> {
        let run = RunInfo::start(RunKind::Baseline, stat);
        log::debug!("engine: baseline run {} ({})", run.run_id, stat.label());

        let simulated = self.simulation.run_within(&self.data, &self.config.baseline, budget)?;
        let (bundle, frame) = run_analysis(&simulated, stat, None)?;
        budget.check("baseline analysis")?;

        Ok(BaselineArtifacts { run, bundle, extract: frame.extract() })
    }

    /// Populate every cache key. Failures are logged and skipped.
    /// Returns the number of keys populated.
    pub fn warm_cache(&self) -> usize {
        DistributionStatistic::ALL
            .iter()
            .filter(|&&stat| match self.baseline(stat) {
                Ok(_) => true,
                Err(e) => {
                    log::warn!("engine: could not warm baseline for {}: {e}", stat.label());
                    false
                }
            })
            .count()
    }

    // ── Reform ─────────────────────────────────────────────────────

    pub fn run_reform(&self, stat: DistributionStatistic, params: &PolicyParams) -> EngineResult<ReformOutcome> {
        self.run_reform_within(stat, params, &RunBudget::unlimited())
    }

    /// Reform run that stops with `TimeBudgetExceeded` once `budget`
    /// is spent. Baseline computation, if needed, counts against it.
    pub fn run_reform_within(
        &self,
        stat: DistributionStatistic,
        params: &PolicyParams,
        budget: &RunBudget,
    ) -> EngineResult<ReformOutcome> {
        let baseline = self.baseline_within(stat, budget)?;
        budget.check("baseline")?;

        let run = RunInfo::start(RunKind::Reform, stat);
        log::debug!("engine: reform run {} ({})", run.run_id, stat.label());

        let simulated = self.simulation.run_within(&self.data, params, budget)?;
        let (bundle, _) = run_analysis(&simulated, stat, Some(&baseline.extract))?;
        budget.check("reform analysis")?;

        Ok(ReformOutcome { run, params: params.clone(), bundle, simulated })
    }

    /// Apply `overrides` to the baseline, run the reform and compare.
    pub fn compare(&self, stat: DistributionStatistic, overrides: &Map<String, Value>) -> EngineResult<ComparisonOutcome> {
        self.compare_within(stat, overrides, &RunBudget::unlimited())
    }

    pub fn compare_within(
        &self,
        stat: DistributionStatistic,
        overrides: &Map<String, Value>,
        budget: &RunBudget,
    ) -> EngineResult<ComparisonOutcome> {
        let (params, param_errors) = self.reform_params(overrides);
        let reform = self.run_reform_within(stat, &params, budget)?;
        let baseline = self.baseline(stat)?;
        let comparison = Comparison::build(
            &baseline.bundle,
            &reform.bundle,
            &self.config.baseline,
            &reform.params,
            &self.config.catalog,
        );
        Ok(ComparisonOutcome { baseline, reform, comparison, param_errors })
    }
}

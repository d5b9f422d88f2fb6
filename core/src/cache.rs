//! Baseline result cache: one baseline run per distribution statistic.
//!
//! RULES:
//!   - The key is the distribution statistic; there are four entries at most.
//!   - An entry is populated once and never evicted or invalidated.
//!   - Each key has its own lock. Concurrent first requests for the same
//!     key compute once; the others wait and share the result. Requests
//!     for different keys never wait on each other.
//!   - A failed computation leaves the entry empty; the next request retries.

use crate::{
    analysis::AnalysisExtract,
    error::EngineResult,
    results::ResultBundle,
    types::{DistributionStatistic, RunInfo},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// What a baseline run leaves behind for reform runs to reuse.
#[derive(Debug, Clone)]
pub struct BaselineArtifacts {
    pub run:     RunInfo,
    pub bundle:  ResultBundle,
    pub extract: AnalysisExtract,
}

type Slot = Arc<Mutex<Option<Arc<BaselineArtifacts>>>>;

#[derive(Debug, Default)]
pub struct BaselineCache {
    slots: Mutex<HashMap<DistributionStatistic, Slot>>,
}

/// Entries are written whole or not at all, so a poisoned lock still
/// guards a consistent value.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BaselineCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, stat: DistributionStatistic) -> Slot {
        Arc::clone(lock(&self.slots).entry(stat).or_default())
    }

    /// The cached entry, without computing.
    pub fn get(&self, stat: DistributionStatistic) -> Option<Arc<BaselineArtifacts>> {
        let slot = lock(&self.slots).get(&stat).cloned()?;
        let entry = lock(&slot).clone();
        entry
    }

    pub fn contains(&self, stat: DistributionStatistic) -> bool {
        self.get(stat).is_some()
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        DistributionStatistic::ALL.iter().filter(|s| self.contains(**s)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the entry for `stat`, running `compute` if it is absent.
    pub fn get_or_compute<F>(&self, stat: DistributionStatistic, compute: F) -> EngineResult<Arc<BaselineArtifacts>>
    where
        F: FnOnce() -> EngineResult<BaselineArtifacts>,
    {
        let slot = self.slot(stat);
        let mut entry = lock(&slot);
        if let Some(cached) = entry.as_ref() {
            log::debug!("cache: hit for {}", stat.label());
            return Ok(Arc::clone(cached));
        }

        let artifacts = Arc::new(compute()?);
        *entry = Some(Arc::clone(&artifacts));
        log::info!("cache: populated {} (run {})", stat.label(), artifacts.run.run_id);
        Ok(artifacts)
    }
}

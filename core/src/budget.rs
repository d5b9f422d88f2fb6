//! Run budget: caller-facing time limit for a synchronous run.
//!
//! The engine never suspends; the budget is checked between pipeline
//! stages and between simulation rules. A run that overshoots stops at
//! the next check with `TimeBudgetExceeded` and returns no partial result.

use crate::error::{EngineError, EngineResult};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct RunBudget {
    started: Instant,
    limit:   Option<Duration>,
}

impl RunBudget {
    pub fn unlimited() -> Self {
        Self { started: Instant::now(), limit: None }
    }

    pub fn with_limit(limit: Duration) -> Self {
        Self { started: Instant::now(), limit: Some(limit) }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    /// Fails once the elapsed time exceeds the limit.
    pub fn check(&self, stage: &'static str) -> EngineResult<()> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        let elapsed = self.elapsed();
        if elapsed > limit {
            log::warn!("budget: {stage} overran ({}ms > {}ms)", elapsed.as_millis(), limit.as_millis());
            return Err(EngineError::TimeBudgetExceeded {
                stage,
                elapsed_ms: elapsed.as_millis(),
                limit_ms:   limit.as_millis(),
            });
        }
        Ok(())
    }
}

impl Default for RunBudget {
    fn default() -> Self { Self::unlimited() }
}

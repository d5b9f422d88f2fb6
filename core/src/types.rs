//! Shared primitive types used across the entire engine.

use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique person identifier (`idperson`).
pub type PersonId = i64;

/// Household key (`idhh`).
pub type HouseholdId = i64;

/// Monthly amount in national currency units.
pub type Money = f64;

/// Which resource measure ranks the population, and which nominal
/// poverty line it is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatistic {
    Consumption            = 1,
    Income                 = 2,
    ConsumptionNetIndirect = 3,
    IncomeNetIndirect      = 4,
}

impl DistributionStatistic {
    pub const ALL: [DistributionStatistic; 4] = [
        DistributionStatistic::Consumption,
        DistributionStatistic::Income,
        DistributionStatistic::ConsumptionNetIndirect,
        DistributionStatistic::IncomeNetIndirect,
    ];

    pub fn from_selector(selector: u8) -> EngineResult<Self> {
        match selector {
            1 => Ok(Self::Consumption),
            2 => Ok(Self::Income),
            3 => Ok(Self::ConsumptionNetIndirect),
            4 => Ok(Self::IncomeNetIndirect),
            other => Err(EngineError::InvalidSelector(other)),
        }
    }

    pub fn selector(self) -> u8 {
        self as u8
    }

    /// Net-of-indirect measures are compared against the post-fiscal line.
    pub fn uses_post_fiscal_line(self) -> bool {
        matches!(self, Self::ConsumptionNetIndirect | Self::IncomeNetIndirect)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Consumption            => "Consumption based",
            Self::Income                 => "Income based",
            Self::ConsumptionNetIndirect => "Consumption based, net of indirect taxes",
            Self::IncomeNetIndirect      => "Income based, net of indirect taxes",
        }
    }
}

impl TryFrom<u8> for DistributionStatistic {
    type Error = EngineError;

    fn try_from(selector: u8) -> EngineResult<Self> {
        Self::from_selector(selector)
    }
}

/// The canonical run identifier.
pub type RunId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Baseline,
    Reform,
}

/// Metadata for one run. Kept apart from the result bundle so that
/// bundles compare bit-for-bit across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub run_id:         RunId,
    pub kind:           RunKind,
    pub stat:           DistributionStatistic,
    pub started_at:     DateTime<Utc>,
    pub engine_version: String,
}

impl RunInfo {
    pub fn start(kind: RunKind, stat: DistributionStatistic) -> Self {
        Self {
            run_id:         uuid::Uuid::new_v4().to_string(),
            kind,
            stat,
            started_at:     Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

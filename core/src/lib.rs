//! Tax-benefit microsimulation and distributional analysis engine.
//!
//! raw dataset → uprating → simulation(params) → analysis → result bundle
//!
//! Baseline runs are cached per distribution statistic; reform runs reuse
//! the baseline's deciles and household types.

pub mod analysis;
pub mod benefit_rules;
pub mod budget;
pub mod cache;
pub mod catalog;
pub mod compare;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod household_type;
pub mod output;
pub mod resources;
pub mod results;
pub mod rng;
pub mod rule;
pub mod simulation;
pub mod synth;
pub mod tax_rules;
pub mod types;
pub mod uprating;

pub use engine::TaxBenEngine;
pub use error::{EngineError, EngineResult};

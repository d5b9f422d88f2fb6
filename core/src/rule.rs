//! Policy rule trait and the working frame rules write into.
//!
//! RULE: Every tax, contribution and benefit is a PolicyRule.
//! The simulation calls apply() on each rule in the fixed order
//! documented in simulation.rs. A rule may read anything an earlier
//! rule wrote; it never reads what a later rule writes.

use crate::{
    config::PolicyParams,
    types::Money,
    uprating::PreparedDataset,
};

/// Per-person simulated flows, monthly.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PersonFlows {
    pub employee_sic:       Money,
    pub employer_sic:       Money,
    pub presumptive_tax:    Money,
    /// Self-employment + agricultural part of the PIT base.
    pub taxable_base_other: Money,
    /// Wage part of the PIT base.
    pub taxable_base_wage:  Money,
    pub taxable_base:       Money,
    pub income_tax:         Money,
    pub senior_grant:       Money,
    pub school_meal:        Money,
    pub original_income:    Money,
    pub disposable_income:  Money,
    /// Disposable income including in-kind benefits.
    pub disposable_in_kind: Money,
}

/// Per-household simulated flows, monthly. Owned by the household;
/// they appear on the head's row only in person-level views.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HouseholdFlows {
    pub vat_base:           Money,
    pub vat:                Money,
    pub social_assistance:  Money,
    pub original_income:    Money,
    pub disposable_in_kind: Money,
    /// Consumption after smoothing against the reported baseline.
    pub consumption:        Money,
}

/// Everything a rule can see and write during one simulation run.
pub struct SimFrame<'a> {
    pub data:       &'a PreparedDataset,
    pub params:     &'a PolicyParams,
    pub persons:    Vec<PersonFlows>,
    pub households: Vec<HouseholdFlows>,
}

impl<'a> SimFrame<'a> {
    pub fn new(data: &'a PreparedDataset, params: &'a PolicyParams) -> Self {
        Self {
            data,
            params,
            persons:    vec![PersonFlows::default(); data.persons.len()],
            households: vec![HouseholdFlows::default(); data.households.len()],
        }
    }
}

/// The contract every policy rule must fulfill.
pub trait PolicyRule: Send + Sync {
    /// Unique stable name for this rule.
    fn name(&self) -> &'static str;

    /// Compute this rule's columns for the whole population.
    fn apply(&self, frame: &mut SimFrame<'_>);
}

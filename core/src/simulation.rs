//! The policy simulation pipeline.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Social insurance contributions
//!   2. Presumptive turnover tax
//!   3. Personal income tax      (needs 1)
//!   4. VAT                      (household, booked on the head)
//!   5. Household social assistance
//!   6. Senior citizens grant
//!   7. School meals
//!   8. Resource aggregation     (needs 1-7)
//!
//! RULES:
//!   - A run is a pure function of (prepared dataset, parameter set).
//!   - Rules never touch the prepared dataset; they write flows only.
//!   - Household-level flows stay on the household. PersonRecord is the
//!     only place they are copied onto the head's row.

use crate::{
    benefit_rules::{SchoolMealRule, SeniorGrantRule, SocialAssistanceRule},
    budget::RunBudget,
    config::PolicyParams,
    dataset::Person,
    error::EngineResult,
    resources::ResourceRule,
    rule::{HouseholdFlows, PersonFlows, PolicyRule, SimFrame},
    tax_rules::{ContributionRule, IncomeTaxRule, PresumptiveTaxRule, VatRule},
    types::{DistributionStatistic, Money},
    uprating::{Household, PreparedDataset},
};
use std::sync::Arc;

pub struct Simulation {
    rules: Vec<Box<dyn PolicyRule>>,
}

impl Simulation {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The full rule set in the documented execution order.
    pub fn standard() -> Self {
        let mut sim = Simulation::new();
        sim.register(Box::new(ContributionRule));
        sim.register(Box::new(PresumptiveTaxRule));
        sim.register(Box::new(IncomeTaxRule));
        sim.register(Box::new(VatRule));
        sim.register(Box::new(SocialAssistanceRule));
        sim.register(Box::new(SeniorGrantRule));
        sim.register(Box::new(SchoolMealRule));
        sim.register(Box::new(ResourceRule));
        sim
    }

    /// Register a rule. Call in the documented execution order.
    pub fn register(&mut self, rule: Box<dyn PolicyRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn run(&self, data: &Arc<PreparedDataset>, params: &PolicyParams) -> SimulatedDataset {
        let mut frame = SimFrame::new(data, params);
        for rule in &self.rules {
            rule.apply(&mut frame);
        }
        SimulatedDataset::from_frame(Arc::clone(data), params, frame)
    }

    /// Same as `run`, checking the budget after every rule.
    pub fn run_within(
        &self,
        data: &Arc<PreparedDataset>,
        params: &PolicyParams,
        budget: &RunBudget,
    ) -> EngineResult<SimulatedDataset> {
        let mut frame = SimFrame::new(data, params);
        for rule in &self.rules {
            rule.apply(&mut frame);
            log::debug!("simulation: {} done after {:?}", rule.name(), budget.elapsed());
            budget.check(rule.name())?;
        }
        Ok(SimulatedDataset::from_frame(Arc::clone(data), params, frame))
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::standard()
    }
}

/// Run the standard pipeline.
pub fn simulate(data: &Arc<PreparedDataset>, params: &PolicyParams) -> SimulatedDataset {
    Simulation::standard().run(data, params)
}

pub fn simulate_within(
    data: &Arc<PreparedDataset>,
    params: &PolicyParams,
    budget: &RunBudget,
) -> EngineResult<SimulatedDataset> {
    Simulation::standard().run_within(data, params, budget)
}

// ── Simulated dataset ──────────────────────────────────────────────

/// Output of one simulation run. Shares the prepared input; owns its flows.
#[derive(Debug, Clone)]
pub struct SimulatedDataset {
    pub data:       Arc<PreparedDataset>,
    pub params:     PolicyParams,
    pub persons:    Vec<PersonFlows>,
    pub households: Vec<HouseholdFlows>,
}

impl SimulatedDataset {
    fn from_frame(data: Arc<PreparedDataset>, params: &PolicyParams, frame: SimFrame<'_>) -> Self {
        Self {
            data,
            params:     params.clone(),
            persons:    frame.persons,
            households: frame.households,
        }
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn record(&self, index: usize) -> PersonRecord<'_> {
        let hh_index = self.data.household_of[index];
        PersonRecord {
            person:     &self.data.persons[index],
            flows:      &self.persons[index],
            household:  &self.data.households[hh_index],
            hh_flows:   &self.households[hh_index],
            is_head:    self.data.households[hh_index].head == index,
            povline:    self.data.poverty_lines.basic,
            povline_pf: self.data.poverty_lines.basic_pf,
        }
    }

    pub fn records(&self) -> impl Iterator<Item = PersonRecord<'_>> + '_ {
        (0..self.len()).map(move |i| self.record(i))
    }
}

// ── Person-level view ──────────────────────────────────────────────

/// One person's row, with household-level values materialized on the
/// head only. Every other member reads zero for them.
#[derive(Debug, Clone, Copy)]
pub struct PersonRecord<'a> {
    pub person:     &'a Person,
    pub flows:      &'a PersonFlows,
    pub household:  &'a Household,
    hh_flows:       &'a HouseholdFlows,
    pub is_head:    bool,
    povline:        Money,
    povline_pf:     Money,
}

impl PersonRecord<'_> {
    fn head_only(&self, value: Money) -> Money {
        if self.is_head { value } else { 0.0 }
    }

    pub fn weight(&self) -> f64 {
        self.person.weight
    }

    pub fn equivalence_scale(&self) -> f64 {
        self.head_only(self.household.equivalence_scale)
    }

    pub fn vat(&self) -> Money {
        self.head_only(self.hh_flows.vat)
    }

    pub fn vat_base(&self) -> Money {
        self.head_only(self.hh_flows.vat_base)
    }

    pub fn social_assistance(&self) -> Money {
        self.head_only(self.hh_flows.social_assistance)
    }

    /// Smoothed household consumption.
    pub fn consumption(&self) -> Money {
        self.head_only(self.hh_flows.consumption)
    }

    pub fn base_consumption(&self) -> Money {
        self.head_only(self.household.base_consumption)
    }

    pub fn direct_tax(&self) -> Money {
        self.flows.income_tax + self.flows.presumptive_tax
    }

    pub fn contributions(&self) -> Money {
        self.flows.employee_sic + self.flows.employer_sic
    }

    /// Means-tested plus non-means-tested cash benefits.
    pub fn cash_benefits(&self) -> Money {
        self.social_assistance() + self.flows.senior_grant
    }

    pub fn in_kind(&self) -> Money {
        self.flows.school_meal
    }

    /// Indirect tax; only VAT is modelled.
    pub fn indirect_tax(&self) -> Money {
        self.vat()
    }

    /// Indirect subsidies are not modelled.
    pub fn indirect_subsidies(&self) -> Money {
        0.0
    }

    pub fn consumption_pf(&self) -> Money {
        self.consumption() - self.indirect_tax() + self.indirect_subsidies()
    }

    pub fn disposable_pf(&self) -> Money {
        self.flows.disposable_income - self.indirect_tax() + self.indirect_subsidies()
    }

    /// Disposable income plus imputed own production.
    pub fn income_x(&self) -> Money {
        self.flows.disposable_income + self.person.other_resources
    }

    pub fn income_x_pf(&self) -> Money {
        self.income_x() - self.indirect_tax() + self.indirect_subsidies()
    }

    /// The ranking resource for a distribution statistic.
    pub fn resource(&self, stat: DistributionStatistic) -> Money {
        match stat {
            DistributionStatistic::Consumption            => self.consumption(),
            DistributionStatistic::Income                 => self.income_x(),
            DistributionStatistic::ConsumptionNetIndirect => self.consumption_pf(),
            DistributionStatistic::IncomeNetIndirect      => self.income_x_pf(),
        }
    }

    /// The nominal poverty line matching a distribution statistic.
    pub fn poverty_line(&self, stat: DistributionStatistic) -> Money {
        if stat.uses_post_fiscal_line() { self.povline_pf } else { self.povline }
    }

    pub fn basic_poverty_line(&self) -> Money {
        self.povline
    }

    pub fn basic_poverty_line_pf(&self) -> Money {
        self.povline_pf
    }
}

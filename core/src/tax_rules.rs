//! Taxes and contributions: social insurance, presumptive turnover tax,
//! personal income tax and VAT.
//!
//! Each rule's core formula is a free function so it can be checked
//! in isolation from the population.

use crate::{
    config::PolicyParams,
    dataset::Person,
    rule::{PolicyRule, SimFrame},
    types::Money,
};
use std::collections::HashSet;

const MONTHS: f64 = 12.0;

// ── Social insurance ───────────────────────────────────────────────

/// Employee and employer contributions on formal wages.
pub struct ContributionRule;

/// (employee, employer) contributions for one person.
pub fn contributions(person: &Person, params: &PolicyParams) -> (Money, Money) {
    if !person.is_formal() {
        return (0.0, 0.0);
    }
    (person.wage * params.tscee_rate, person.wage * params.tscer_rate)
}

impl PolicyRule for ContributionRule {
    fn name(&self) -> &'static str { "contributions" }

    fn apply(&self, frame: &mut SimFrame<'_>) {
        for (flows, person) in frame.persons.iter_mut().zip(&frame.data.persons) {
            let (employee, employer) = contributions(person, frame.params);
            flows.employee_sic = employee;
            flows.employer_sic = employer;
        }
    }
}

// ── Presumptive turnover tax ───────────────────────────────────────

/// Turnover tax for small businesses below the PIT threshold.
pub struct PresumptiveTaxRule;

/// Monthly presumptive tax on a monthly turnover.
///
/// Bands are `(lower, upper]` on annual thresholds divided by 12:
///   band 1 `(.., t1]`          exempt
///   band 2 `(t1, t2]`          fixed `presumptive_tax_2 / 12`
///   band 3 `(t2, t3]`          fixed `presumptive_tax_3 / 12`
///   band 4 `(t3, pit_thresh]`  `turnover × presumptive_rate_4`
/// Above the PIT threshold the business pays income tax instead.
/// If a reform makes bands overlap, the higher band wins.
pub fn presumptive_tax(monthly_turnover: Money, params: &PolicyParams) -> Money {
    let t1 = params.presumptive_turnover_1 / MONTHS;
    let t2 = params.presumptive_turnover_2 / MONTHS;
    let t3 = params.presumptive_turnover_3 / MONTHS;
    let t4 = params.pit_yse_turnover_threshold / MONTHS;
    let in_band = |lower: f64, upper: f64| monthly_turnover > lower && monthly_turnover <= upper;

    if in_band(t3, t4) {
        monthly_turnover * params.presumptive_rate_4
    } else if in_band(t2, t3) {
        params.presumptive_tax_3 / MONTHS
    } else if in_band(t1, t2) {
        params.presumptive_tax_2 / MONTHS
    } else {
        0.0
    }
}

impl PolicyRule for PresumptiveTaxRule {
    fn name(&self) -> &'static str { "presumptive_tax" }

    fn apply(&self, frame: &mut SimFrame<'_>) {
        for (flows, person) in frame.persons.iter_mut().zip(&frame.data.persons) {
            flows.presumptive_tax = presumptive_tax(person.turnover, frame.params);
        }
    }
}

// ── Personal income tax ────────────────────────────────────────────

/// Annual PIT base, split into its components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnualTaxBase {
    /// Self-employment (when not under presumptive tax) + agricultural.
    pub other: Money,
    /// Formal wages.
    pub wage:  Money,
    /// `other + wage − employee contributions`, floored at zero.
    pub total: Money,
}

/// Annual PIT base from monthly incomes and monthly employee contributions.
pub fn annual_tax_base(person: &Person, employee_sic: Money, params: &PolicyParams) -> AnnualTaxBase {
    let turnover_y = person.turnover * MONTHS;
    let self_employment_y = if turnover_y > params.pit_yse_turnover_threshold {
        person.self_employment * MONTHS
    } else {
        0.0
    };
    let agricultural_y = (person.agricultural * MONTHS - params.pit_yag_exemption).max(0.0);
    let wage_y = if person.is_formal() { person.wage * MONTHS } else { 0.0 };

    let other = self_employment_y + agricultural_y;
    AnnualTaxBase {
        other,
        wage:  wage_y,
        total: (other + wage_y - employee_sic * MONTHS).max(0.0),
    }
}

/// Annual tax on an annual base. Bracket 1 is the zero band and is never
/// charged; bracket 5 has no upper bound.
pub fn annual_income_tax(base: Money, params: &PolicyParams) -> Money {
    let bands = [
        (params.pit_bracket2_thresh, params.pit_bracket3_thresh, params.pit_bracket2_rate),
        (params.pit_bracket3_thresh, params.pit_bracket4_thresh, params.pit_bracket3_rate),
        (params.pit_bracket4_thresh, params.pit_bracket5_thresh, params.pit_bracket4_rate),
        (params.pit_bracket5_thresh, f64::INFINITY, params.pit_bracket5_rate),
    ];
    bands
        .iter()
        .map(|&(lower, upper, rate)| (base.min(upper) - lower).max(0.0) * rate)
        .sum()
}

pub struct IncomeTaxRule;

impl PolicyRule for IncomeTaxRule {
    fn name(&self) -> &'static str { "income_tax" }

    fn apply(&self, frame: &mut SimFrame<'_>) {
        for (flows, person) in frame.persons.iter_mut().zip(&frame.data.persons) {
            let base = annual_tax_base(person, flows.employee_sic, frame.params);
            flows.taxable_base_other = base.other / MONTHS;
            flows.taxable_base_wage = base.wage / MONTHS;
            flows.taxable_base = base.total / MONTHS;
            flows.income_tax = annual_income_tax(base.total, frame.params) / MONTHS;
        }
    }
}

// ── VAT ────────────────────────────────────────────────────────────

/// Standard-rate VAT on the household's consumption of listed items.
/// Items missing from the list are exempt; listed items missing from
/// the dataset contribute nothing.
pub struct VatRule;

impl PolicyRule for VatRule {
    fn name(&self) -> &'static str { "vat" }

    fn apply(&self, frame: &mut SimFrame<'_>) {
        let data = frame.data;
        let listed: HashSet<&str> = frame.params.vat_items_list.iter().map(String::as_str).collect();
        let vatable: Vec<usize> = data
            .item_codes
            .iter()
            .enumerate()
            .filter(|(_, code)| listed.contains(code.as_str()))
            .map(|(i, _)| i)
            .collect();

        for (flows, household) in frame.households.iter_mut().zip(&data.households) {
            let base: Money = household
                .members
                .iter()
                .map(|&m| vatable.iter().map(|&i| data.persons[m].items[i]).sum::<Money>())
                .sum();
            flows.vat_base = base;
            flows.vat = base * frame.params.tva_rate;
        }
    }
}

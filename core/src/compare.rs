//! Baseline vs reform comparison tables.
//!
//! Budget amounts are reported yearly in millions; shares, poverty
//! rates and gaps in percent with differences in percentage points.
//! Header rows carry no values.

use crate::{
    catalog::VatCatalog,
    config::PolicyParams,
    results::{BudgetCategory, PovertyGroup, ResultBundle},
    types::Money,
};
use serde::Serialize;

pub const MONTHS_PER_YEAR: f64 = 12.0;
pub const MILLION: f64 = 1e6;

/// Monthly amount to yearly millions.
pub fn yearly_millions(monthly: Money) -> f64 {
    monthly * MONTHS_PER_YEAR / MILLION
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub label:      String,
    pub baseline:   Option<f64>,
    pub reform:     Option<f64>,
    pub difference: Option<f64>,
}

impl ComparisonRow {
    fn values(label: impl Into<String>, baseline: Option<f64>, reform: Option<f64>) -> Self {
        let difference = baseline.zip(reform).map(|(b, r)| r - b);
        Self { label: label.into(), baseline, reform, difference }
    }

    fn header(label: impl Into<String>) -> Self {
        Self::values(label, None, None)
    }

    pub fn is_header(&self) -> bool {
        self.baseline.is_none() && self.reform.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Yearly, millions of national currency.
    pub budget:         Vec<ComparisonRow>,
    pub shares:         Vec<ComparisonRow>,
    pub poverty_rate:   Vec<ComparisonRow>,
    pub poverty_gap:    Vec<ComparisonRow>,
    /// Baseline poverty line, yearly.
    pub povline_yearly: Money,
    pub policy_changes: Vec<String>,
}

impl Comparison {
    pub fn build(
        baseline: &ResultBundle,
        reform: &ResultBundle,
        baseline_params: &PolicyParams,
        reform_params: &PolicyParams,
        catalog: &VatCatalog,
    ) -> Self {
        Self {
            budget:         budget_rows(baseline, reform),
            shares:         share_rows(baseline, reform),
            poverty_rate:   poverty_rows(baseline, reform, ResultBundle::poverty_rate),
            poverty_gap:    poverty_rows(baseline, reform, ResultBundle::poverty_gap),
            povline_yearly: baseline.povline * MONTHS_PER_YEAR,
            policy_changes: reform_params.describe_changes(baseline_params, catalog),
        }
    }
}

fn item_label(cat: BudgetCategory) -> String {
    format!("- {}", cat.label())
}

fn budget_rows(baseline: &ResultBundle, reform: &ResultBundle) -> Vec<ComparisonRow> {
    let amount = |cat: BudgetCategory| {
        ComparisonRow::values(
            cat.label(),
            Some(yearly_millions(baseline.budget(cat))),
            Some(yearly_millions(reform.budget(cat))),
        )
    };
    let item = |cat: BudgetCategory| ComparisonRow { label: item_label(cat), ..amount(cat) };

    let mut rows = vec![amount(BudgetCategory::TotalRevenue), ComparisonRow::header("By source")];
    rows.extend(BudgetCategory::REVENUE.iter().map(|c| item(*c)));
    rows.push(amount(BudgetCategory::TotalExpenditure));
    rows.push(ComparisonRow::header("By type"));
    rows.extend(BudgetCategory::EXPENDITURE.iter().map(|c| item(*c)));
    rows
}

fn share_rows(baseline: &ResultBundle, reform: &ResultBundle) -> Vec<ComparisonRow> {
    let base_shares = baseline.budget.shares();
    let reform_shares = reform.budget.shares();
    let row = |i: usize| {
        let (cat, base) = base_shares[i];
        ComparisonRow::values(item_label(cat), Some(base), Some(reform_shares[i].1))
    };

    let mut rows = vec![ComparisonRow::header("By source")];
    rows.extend((0..BudgetCategory::REVENUE.len()).map(row));
    rows.push(ComparisonRow::header("By type"));
    rows.extend((BudgetCategory::REVENUE.len()..base_shares.len()).map(row));
    rows
}

fn poverty_rows(
    baseline: &ResultBundle,
    reform: &ResultBundle,
    value: fn(&ResultBundle, PovertyGroup) -> Option<f64>,
) -> Vec<ComparisonRow> {
    PovertyGroup::report_order()
        .into_iter()
        .map(|group| match group {
            PovertyGroup::Header(_) => ComparisonRow::header(group.label()),
            PovertyGroup::AllIndividuals => {
                ComparisonRow::values(group.label(), value(baseline, group), value(reform, group))
            }
            PovertyGroup::Subgroup(_) => ComparisonRow::values(
                format!("- {}", group.label()),
                value(baseline, group),
                value(reform, group),
            ),
        })
        .collect()
}

/// `+1,234.50`, `-0.25`, `0.00`.
pub fn format_signed(value: f64) -> String {
    if value > 0.0 {
        format!("+{}", format_thousands(value))
    } else if value < 0.0 {
        format!("-{}", format_thousands(-value))
    } else {
        "0.00".to_string()
    }
}

/// Two decimals with comma thousands separators.
pub fn format_thousands(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_formatting() {
        assert_eq!(format_signed(1234.5), "+1,234.50");
        assert_eq!(format_signed(-0.25), "-0.25");
        assert_eq!(format_signed(0.0), "0.00");
        assert_eq!(format_thousands(1_234_567.891), "1,234,567.89");
        assert_eq!(format_thousands(12.0), "12.00");
    }

    #[test]
    fn yearly_millions_scales_monthly_totals() {
        assert!((yearly_millions(1_000_000.0) - 12.0).abs() < 1e-12);
    }
}

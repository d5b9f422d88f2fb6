//! Result bundle: the aggregate tables produced by one analysis run.
//!
//! Serialized shape (key order is stable):
//!   { "taxbenpol_abs":   { category: amount, ... },
//!     "taxbenpol_share": { category: percent, ... },
//!     "poverty": { group: { "Poverty rate (%)": x, "Poverty gap (%)": y },
//!                  ..., "povline": value } }

use crate::{
    household_type::{Section, Subgroup},
    types::Money,
};
use serde::ser::{Serialize, SerializeMap, Serializer};

pub const RATE_KEY: &str = "Poverty rate (%)";
pub const GAP_KEY: &str = "Poverty gap (%)";
pub const POVLINE_KEY: &str = "povline";

// ── Budget ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BudgetCategory {
    DirectTaxes,
    SocialInsuranceContributions,
    IndirectTaxes,
    CashBenefits,
    InKindBenefits,
    IndirectSubsidies,
    ChildBenefits,
    SocialAssistance,
    TotalRevenue,
    TotalExpenditure,
}

impl BudgetCategory {
    pub const ALL: [BudgetCategory; 10] = [
        BudgetCategory::DirectTaxes,
        BudgetCategory::SocialInsuranceContributions,
        BudgetCategory::IndirectTaxes,
        BudgetCategory::CashBenefits,
        BudgetCategory::InKindBenefits,
        BudgetCategory::IndirectSubsidies,
        BudgetCategory::ChildBenefits,
        BudgetCategory::SocialAssistance,
        BudgetCategory::TotalRevenue,
        BudgetCategory::TotalExpenditure,
    ];

    pub const REVENUE: [BudgetCategory; 3] = [
        BudgetCategory::DirectTaxes,
        BudgetCategory::SocialInsuranceContributions,
        BudgetCategory::IndirectTaxes,
    ];

    pub const EXPENDITURE: [BudgetCategory; 3] = [
        BudgetCategory::CashBenefits,
        BudgetCategory::InKindBenefits,
        BudgetCategory::IndirectSubsidies,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BudgetCategory::DirectTaxes                  => "Direct taxes",
            BudgetCategory::SocialInsuranceContributions => "Social insurance contributions",
            BudgetCategory::IndirectTaxes                => "Indirect taxes",
            BudgetCategory::CashBenefits                 => "Cash benefits",
            BudgetCategory::InKindBenefits               => "In-kind benefits",
            BudgetCategory::IndirectSubsidies            => "Indirect subsidies",
            BudgetCategory::ChildBenefits                => "Child benefits",
            BudgetCategory::SocialAssistance             => "Social assistance",
            BudgetCategory::TotalRevenue                 => "Sum of government revenue",
            BudgetCategory::TotalExpenditure             => "Sum of government expenditure",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Weighted monthly totals per budget category.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BudgetTable {
    amounts: [Money; 10],
}

impl BudgetTable {
    /// Build from the eight base categories; totals are derived.
    pub fn from_base(mut amount_of: impl FnMut(BudgetCategory) -> Money) -> Self {
        let mut table = Self::default();
        for cat in &BudgetCategory::ALL[..8] {
            table.amounts[cat.index()] = amount_of(*cat);
        }
        table.amounts[BudgetCategory::TotalRevenue.index()] =
            BudgetCategory::REVENUE.iter().map(|c| table.get(*c)).sum();
        table.amounts[BudgetCategory::TotalExpenditure.index()] =
            BudgetCategory::EXPENDITURE.iter().map(|c| table.get(*c)).sum();
        table
    }

    pub fn get(&self, cat: BudgetCategory) -> Money {
        self.amounts[cat.index()]
    }

    /// Share of each revenue item in total revenue and each expenditure
    /// item in total expenditure, in percent. Zero when the total is zero.
    pub fn shares(&self) -> Vec<(BudgetCategory, f64)> {
        let share = |part: Money, total: Money| if total > 0.0 { part / total * 100.0 } else { 0.0 };
        let revenue = self.get(BudgetCategory::TotalRevenue);
        let expenditure = self.get(BudgetCategory::TotalExpenditure);
        BudgetCategory::REVENUE
            .iter()
            .map(|c| (*c, share(self.get(*c), revenue)))
            .chain(BudgetCategory::EXPENDITURE.iter().map(|c| (*c, share(self.get(*c), expenditure))))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BudgetCategory, Money)> + '_ {
        BudgetCategory::ALL.iter().map(move |c| (*c, self.get(*c)))
    }
}

// ── Poverty ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PovertyGroup {
    AllIndividuals,
    Header(Section),
    Subgroup(Subgroup),
}

impl PovertyGroup {
    /// Reporting order: everyone, then each section header followed by
    /// its subgroups.
    pub fn report_order() -> Vec<PovertyGroup> {
        let mut order = vec![PovertyGroup::AllIndividuals];
        for section in [Section::HouseholdStructure, Section::Vulnerable, Section::Labour] {
            order.push(PovertyGroup::Header(section));
            order.extend(
                Subgroup::ALL
                    .iter()
                    .filter(|g| g.section() == section)
                    .map(|g| PovertyGroup::Subgroup(*g)),
            );
        }
        order
    }

    pub fn key(self) -> &'static str {
        match self {
            PovertyGroup::AllIndividuals => "All individuals",
            PovertyGroup::Header(s)      => s.key(),
            PovertyGroup::Subgroup(g)    => g.key(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PovertyGroup::AllIndividuals => "All individuals",
            PovertyGroup::Header(s)      => s.label(),
            PovertyGroup::Subgroup(g)    => g.label(),
        }
    }
}

/// Rate and gap in percent. Headers carry neither.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PovertyEntry {
    pub group: PovertyGroup,
    pub rate:  Option<f64>,
    pub gap:   Option<f64>,
}

// ── Bundle ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ResultBundle {
    pub budget:  BudgetTable,
    pub poverty: Vec<PovertyEntry>,
    /// Monthly poverty line the rates were measured against.
    pub povline: Money,
}

impl ResultBundle {
    pub fn budget(&self, cat: BudgetCategory) -> Money {
        self.budget.get(cat)
    }

    pub fn poverty_entry(&self, group: PovertyGroup) -> Option<&PovertyEntry> {
        self.poverty.iter().find(|e| e.group == group)
    }

    pub fn poverty_rate(&self, group: PovertyGroup) -> Option<f64> {
        self.poverty_entry(group).and_then(|e| e.rate)
    }

    pub fn poverty_gap(&self, group: PovertyGroup) -> Option<f64> {
        self.poverty_entry(group).and_then(|e| e.gap)
    }
}

struct BudgetAbs<'a>(&'a BudgetTable);
struct BudgetShare<'a>(&'a BudgetTable);
struct PovertyMap<'a>(&'a ResultBundle);
struct EntryValues<'a>(&'a PovertyEntry);

impl Serialize for BudgetAbs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(BudgetCategory::ALL.len()))?;
        for (cat, amount) in self.0.iter() {
            map.serialize_entry(cat.label(), &amount)?;
        }
        map.end()
    }
}

impl Serialize for BudgetShare<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let shares = self.0.shares();
        let mut map = serializer.serialize_map(Some(shares.len()))?;
        for (cat, share) in shares {
            map.serialize_entry(cat.label(), &share)?;
        }
        map.end()
    }
}

impl Serialize for EntryValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(RATE_KEY, &self.0.rate)?;
        map.serialize_entry(GAP_KEY, &self.0.gap)?;
        map.end()
    }
}

impl Serialize for PovertyMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.poverty.len() + 1))?;
        for entry in &self.0.poverty {
            map.serialize_entry(entry.group.key(), &EntryValues(entry))?;
        }
        map.serialize_entry(POVLINE_KEY, &self.0.povline)?;
        map.end()
    }
}

impl Serialize for ResultBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("taxbenpol_abs", &BudgetAbs(&self.budget))?;
        map.serialize_entry("taxbenpol_share", &BudgetShare(&self.budget))?;
        map.serialize_entry("poverty", &PovertyMap(self))?;
        map.end()
    }
}

//! Uprating & preparation: brings raw survey data to the policy year.
//!
//! Steps, in order:
//!   1. Uprate incomes (earnings factor, overall CPI) and consumption
//!      items (per-category CPI).
//!   2. Clip wage and self-employment income at zero.
//!   3. Agricultural income: zero the whole household when its total is
//!      not positive, otherwise zero only negative individual values.
//!   4. Uprate the poverty lines.
//!   5. Equivalence scale per household.
//!   6. Consumption fallback: household sum of all item columns.
//!
//! RULE: household-level facts live on `Household`, computed once.
//! They are only copied onto the head row when a person-level view
//! is produced.

use crate::{
    catalog::VatCatalog,
    config::{PolicyParams, UpratingFactors},
    dataset::{Dataset, HouseholdGroup, Person},
    types::{HouseholdId, Money},
};
use serde::{Deserialize, Serialize};

/// Monthly poverty lines at policy-year prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PovertyLines {
    pub basic:    Money,
    pub upper:    Money,
    pub basic_pf: Money,
    pub upper_pf: Money,
}

impl PovertyLines {
    pub fn uprated(params: &PolicyParams, factors: &UpratingFactors) -> Self {
        Self {
            basic:    params.basic_pov_line * factors.overall,
            upper:    params.upper_pov_line * factors.overall,
            basic_pf: params.basic_pov_line_pf * factors.overall,
            upper_pf: params.upper_pov_line_pf * factors.overall,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Household {
    pub id:      HouseholdId,
    pub head:    usize,
    pub members: Vec<usize>,
    /// Sum of member age-band weights.
    pub equivalence_scale:   f64,
    /// Sum of all item-level consumption over members.
    pub item_consumption:    Money,
    /// Consumption the reform smoothing starts from.
    pub base_consumption:    Money,
    /// Sum of uprated reported disposable income over members.
    pub reported_disposable: Money,
}

impl Household {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub persons:             Vec<Person>,
    pub item_codes:          Vec<String>,
    pub passthrough_columns: Vec<String>,
    /// False when the input had no `dwt` column.
    pub has_weights:         bool,
    pub households:          Vec<Household>,
    pub household_of:        Vec<usize>,
    pub poverty_lines:       PovertyLines,
}

impl PreparedDataset {
    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn household(&self, person: usize) -> &Household {
        &self.households[self.household_of[person]]
    }

    pub fn item_index(&self, code: &str) -> Option<usize> {
        self.item_codes.iter().position(|c| c == code)
    }
}

/// Equivalence weight for one person. Upper bounds are inclusive.
pub fn equivalence_weight(age: f64) -> f64 {
    match age {
        a if a <= 3.0  => 0.30,
        a if a <= 7.0  => 0.50,
        a if a <= 12.0 => 0.70,
        a if a <= 17.0 => 0.95,
        a if a <= 29.0 => 1.10,
        a if a <= 39.0 => 0.95,
        a if a <= 59.0 => 0.90,
        _ => 0.80,
    }
}

pub fn prepare(
    raw: Dataset,
    factors: &UpratingFactors,
    catalog: &VatCatalog,
    baseline: &PolicyParams,
) -> PreparedDataset {
    let parts = raw.into_parts();
    let mut persons = parts.persons;

    // 1. Uprating
    let item_factors: Vec<f64> = parts
        .item_codes
        .iter()
        .map(|code| factors.for_category(catalog.category(code)))
        .collect();

    for person in &mut persons {
        person.wage *= factors.earnings;
        person.self_employment *= factors.earnings;
        person.agricultural *= factors.earnings;
        person.reported_disposable *= factors.overall;
        person.turnover *= factors.overall;
        person.household_consumption *= factors.overall;
        for (value, factor) in person.items.iter_mut().zip(&item_factors) {
            *value *= factor;
        }

        // 2. Labour incomes never negative
        person.wage = person.wage.max(0.0);
        person.self_employment = person.self_employment.max(0.0);
    }

    // 3. Agricultural income
    for group in &parts.households {
        let total: Money = group.members.iter().map(|&i| persons[i].agricultural).sum();
        for &i in &group.members {
            if total <= 0.0 || persons[i].agricultural < 0.0 {
                persons[i].agricultural = 0.0;
            }
        }
    }

    // 4. Poverty lines
    let poverty_lines = PovertyLines::uprated(baseline, factors);

    // 5-6. Household facts
    let use_reported_consumption = parts.has_household_consumption
        && persons.iter().any(|p| p.household_consumption != 0.0);

    let households: Vec<Household> = parts
        .households
        .into_iter()
        .map(|group| build_household(group, &persons, use_reported_consumption))
        .collect();

    log::debug!(
        "uprating: {} persons in {} households, consumption source={}",
        persons.len(),
        households.len(),
        if use_reported_consumption { "xhh" } else { "item fallback" }
    );

    PreparedDataset {
        persons,
        item_codes: parts.item_codes,
        passthrough_columns: parts.passthrough_columns,
        has_weights: parts.has_weights,
        households,
        household_of: parts.household_of,
        poverty_lines,
    }
}

fn build_household(group: HouseholdGroup, persons: &[Person], use_reported_consumption: bool) -> Household {
    let members = || group.members.iter().map(|&i| &persons[i]);

    let equivalence_scale = members().map(|p| equivalence_weight(p.age)).sum();
    let item_consumption = members().map(|p| p.items.iter().sum::<Money>()).sum();
    let reported_disposable = members().map(|p| p.reported_disposable).sum();
    let base_consumption = if use_reported_consumption {
        persons[group.head].household_consumption
    } else {
        item_consumption
    };

    Household {
        id: group.id,
        head: group.head,
        members: group.members,
        equivalence_scale,
        item_consumption,
        base_consumption,
        reported_disposable,
    }
}

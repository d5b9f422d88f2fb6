//! Synthetic population generator.
//!
//! Produces a reproducible household survey with the same columns a
//! real input file carries. Same spec and seed, same dataset.

use crate::{
    catalog::VatCatalog,
    dataset::{Dataset, Person},
    error::EngineResult,
    rng::{RngBank, Stream, StreamRng},
    types::Money,
};
use serde::{Deserialize, Serialize};

pub const MAX_HOUSEHOLD_SIZE: u64 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSpec {
    pub households:      usize,
    /// Share of working adults in formal employment.
    pub formal_share:    f64,
    pub employment_rate: f64,
    pub business_rate:   f64,
    pub farming_rate:    f64,
    /// Emit an `xhh` household-consumption column.
    pub with_household_consumption: bool,
    /// Random survey weights; otherwise every weight is 1.
    pub with_weights:    bool,
    /// Item columns to generate. Defaults to the full catalog.
    pub item_codes:      Vec<String>,
}

impl Default for PopulationSpec {
    fn default() -> Self {
        Self {
            households:      500,
            formal_share:    0.45,
            employment_rate: 0.55,
            business_rate:   0.15,
            farming_rate:    0.25,
            with_household_consumption: true,
            with_weights:    true,
            item_codes:      VatCatalog.all_codes(),
        }
    }
}

impl PopulationSpec {
    pub fn with_households(households: usize) -> Self {
        Self { households, ..Self::default() }
    }
}

struct Streams {
    households:  StreamRng,
    demography:  StreamRng,
    labour:      StreamRng,
    business:    StreamRng,
    consumption: StreamRng,
    weights:     StreamRng,
}

/// Generate a dataset of `spec.households` households.
pub fn generate(spec: &PopulationSpec, seed: u64) -> EngineResult<Dataset> {
    let bank = RngBank::new(seed);
    let mut s = Streams {
        households:  bank.for_stream(Stream::Households),
        demography:  bank.for_stream(Stream::Demography),
        labour:      bank.for_stream(Stream::Labour),
        business:    bank.for_stream(Stream::Business),
        consumption: bank.for_stream(Stream::Consumption),
        weights:     bank.for_stream(Stream::Weights),
    };

    let mut persons = Vec::new();
    for h in 0..spec.households {
        persons.extend(generate_household(spec, &mut s, h as i64 + 1));
    }

    log::debug!(
        "synth: seed={seed} generated {} persons in {} households",
        persons.len(),
        spec.households
    );
    Dataset::new(persons, spec.item_codes.clone(), Vec::new(), spec.with_household_consumption)
}

fn generate_household(spec: &PopulationSpec, s: &mut Streams, idhh: i64) -> Vec<Person> {
    // Sizes skew small: 1 + min of two uniform draws.
    let size = 1 + s.households.next_u64_below(MAX_HOUSEHOLD_SIZE).min(s.households.next_u64_below(MAX_HOUSEHOLD_SIZE));
    let ranking_group = (1 + s.households.next_u64_below(10)) as f64;
    let weight = if spec.with_weights { s.weights.uniform(50.0, 150.0).round() } else { 1.0 };

    let mut members = Vec::with_capacity(size as usize);
    for m in 0..size {
        let mut person = Person::new(idhh * 100 + m as i64 + 1, idhh, m == 0);
        person.age = member_age(&mut s.demography, m);
        let sex = if m == 1 {
            // partner takes the opposite sex of the head
            members.first().and_then(|h: &Person| h.sex).map_or(0.0, |hs| 1.0 - hs)
        } else {
            s.demography.next_u64_below(2) as f64
        };
        person.sex = Some(sex);
        person.disabled = if s.demography.chance(0.05) { 1.0 } else { 0.0 };
        person.education = Some(s.demography.next_u64_below(5) as f64);
        person.ranking_group = ranking_group;
        person.weight = weight;

        let adult = person.age >= 18.0;
        let working_age = adult && person.age < 65.0;
        person.employment_status = Some(if working_age && s.labour.chance(spec.employment_rate) { 1.0 } else { 0.0 });
        person.formality = if adult && s.labour.chance(spec.formal_share) { 1.0 } else { 0.0 };
        if person.employment_status == Some(1.0) {
            person.wage = s.labour.log_normal(420.0, 0.6);
        }
        if working_age && s.business.chance(spec.business_rate) {
            person.turnover = s.business.log_normal(350.0, 1.1);
            person.self_employment = person.turnover * s.business.uniform(0.15, 0.45);
        }
        if adult && s.business.chance(spec.farming_rate) {
            person.agricultural = s.business.uniform(-25.0, 180.0);
        }
        if adult && s.business.chance(0.1) {
            person.other_resources = s.business.uniform(5.0, 60.0);
        }
        person.reported_disposable = (person.original_income() * s.labour.uniform(0.8, 1.0)).max(0.0);
        person.items = vec![0.0; spec.item_codes.len()];
        members.push(person);
    }

    let budget = household_budget(&mut s.consumption, &members);
    let shares: Vec<f64> = spec.item_codes.iter().map(|_| s.consumption.next_f64()).collect();
    let total_share: f64 = shares.iter().sum();
    if total_share > 0.0 {
        if let Some(head) = members.first_mut() {
            for (value, share) in head.items.iter_mut().zip(&shares) {
                *value = (budget * share / total_share * 100.0).round() / 100.0;
            }
        }
    }
    if spec.with_household_consumption {
        let total: Money = members.iter().map(|p| p.items.iter().sum::<Money>()).sum();
        for person in &mut members {
            person.household_consumption = total;
        }
    }
    members
}

fn member_age(rng: &mut StreamRng, position: u64) -> f64 {
    let age = match position {
        0 => rng.uniform(19.0, 82.0),
        1 => rng.uniform(18.0, 78.0),
        _ if rng.chance(0.75) => rng.uniform(0.0, 18.0),
        _ => rng.uniform(18.0, 90.0),
    };
    age.floor()
}

/// Monthly household spending: reported income plus a subsistence floor.
fn household_budget(rng: &mut StreamRng, members: &[Person]) -> Money {
    let income: Money = members.iter().map(|p| p.reported_disposable).sum();
    let floor = 80.0 * members.len() as f64;
    (income * rng.uniform(0.7, 1.05)).max(floor * rng.uniform(0.8, 1.4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_population() {
        let spec = PopulationSpec::with_households(40);
        let a = generate(&spec, 7).unwrap();
        let b = generate(&spec, 7).unwrap();
        assert_eq!(a.persons(), b.persons());
        let c = generate(&spec, 8).unwrap();
        assert_ne!(a.persons(), c.persons());
    }

    #[test]
    fn every_household_has_one_head() {
        let data = generate(&PopulationSpec::with_households(60), 1).unwrap();
        for group in data.households() {
            let heads = group.members.iter().filter(|&&m| data.persons()[m].head).count();
            assert_eq!(heads, 1);
        }
    }
}

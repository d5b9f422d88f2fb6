//! Cash and in-kind benefits: household social assistance, senior
//! citizens grant, school meals.

use crate::{
    config::PolicyParams,
    dataset::Person,
    rule::{PolicyRule, SimFrame},
    types::Money,
};

/// School meals are served 10 months a year; the value is spread over 12.
pub const SCHOOL_YEAR_SHARE: f64 = 10.0 / 12.0;

/// Household ranking groups whose children qualify for school meals.
pub const SCHOOL_MEAL_GROUPS: [f64; 3] = [2.0, 3.0, 4.0];

// ── Household social assistance ────────────────────────────────────

/// Means-tested cash benefit, paid to the household and booked on the head.
pub struct SocialAssistanceRule;

/// Entitlement for an eligible household of `size` members with
/// `disabled` disabled members.
pub fn social_assistance_amount(size: usize, disabled: f64, params: &PolicyParams) -> Money {
    let base = match size {
        0 => 0.0,
        1 => params.bsa_1_person,
        2 => params.bsa_2_person,
        _ => params.bsa_3_plus_person,
    };
    base + disabled * params.bsa_disabled_topup
}

impl PolicyRule for SocialAssistanceRule {
    fn name(&self) -> &'static str { "social_assistance" }

    fn apply(&self, frame: &mut SimFrame<'_>) {
        let data = frame.data;
        for (flows, household) in frame.households.iter_mut().zip(&data.households) {
            let members = || household.members.iter().map(|&m| &data.persons[m]);
            let original_income: Money = members().map(Person::original_income).sum();
            flows.original_income = original_income;

            flows.social_assistance = if original_income < frame.params.bsa_income_threshold {
                let disabled: f64 = members().map(|p| p.disabled).sum();
                social_assistance_amount(household.size(), disabled, frame.params)
            } else {
                0.0
            };
        }
    }
}

// ── Senior citizens grant ──────────────────────────────────────────

/// Individually tested; several members of one household can qualify.
pub struct SeniorGrantRule;

pub fn senior_grant(person: &Person, params: &PolicyParams) -> Money {
    let eligible = person.age >= params.senior_grant_age
        && person.original_income() < params.senior_grant_income_threshold;
    if eligible { params.senior_grant_amount } else { 0.0 }
}

impl PolicyRule for SeniorGrantRule {
    fn name(&self) -> &'static str { "senior_grant" }

    fn apply(&self, frame: &mut SimFrame<'_>) {
        for (flows, person) in frame.persons.iter_mut().zip(&frame.data.persons) {
            flows.senior_grant = senior_grant(person, frame.params);
        }
    }
}

// ── School meals ───────────────────────────────────────────────────

/// In-kind benefit for children in the qualifying ranking groups.
pub struct SchoolMealRule;

pub fn school_meal(person: &Person, params: &PolicyParams) -> Money {
    let eligible = person.age < params.school_meal_age
        && SCHOOL_MEAL_GROUPS.contains(&person.ranking_group);
    if eligible { params.school_meal_value * SCHOOL_YEAR_SHARE } else { 0.0 }
}

impl PolicyRule for SchoolMealRule {
    fn name(&self) -> &'static str { "school_meal" }

    fn apply(&self, frame: &mut SimFrame<'_>) {
        for (flows, person) in frame.persons.iter_mut().zip(&frame.data.persons) {
            flows.school_meal = school_meal(person, frame.params);
        }
    }
}

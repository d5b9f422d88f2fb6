//! Resource aggregation: original, disposable and in-kind-inclusive
//! income per person, then household consumption smoothed against the
//! reported baseline.
//!
//! RULE: runs last. Reads every flow the tax and benefit rules wrote.

use crate::{
    rule::{PolicyRule, SimFrame},
    types::Money,
};

/// When resources fall, consumption never drops below this share of
/// its base level.
pub const CONSUMPTION_FLOOR_SHARE: f64 = 0.25;

/// Household consumption after a change `delta` in disposable income.
///
/// A gain passes through in full. A loss passes through until it would
/// take consumption under `CONSUMPTION_FLOOR_SHARE × base`.
pub fn smoothed_consumption(base: Money, delta: Money) -> Money {
    if delta < 0.0 {
        (base + delta).max(base * CONSUMPTION_FLOOR_SHARE)
    } else {
        base + delta
    }
}

pub struct ResourceRule;

impl PolicyRule for ResourceRule {
    fn name(&self) -> &'static str { "resources" }

    fn apply(&self, frame: &mut SimFrame<'_>) {
        let data = frame.data;

        for (i, (flows, person)) in frame.persons.iter_mut().zip(&data.persons).enumerate() {
            let household = data.household(i);
            let social_assistance = if household.head == i {
                frame.households[data.household_of[i]].social_assistance
            } else {
                0.0
            };

            flows.original_income = person.original_income();
            flows.disposable_income = flows.original_income
                + social_assistance
                + flows.senior_grant
                - flows.income_tax
                - flows.presumptive_tax
                - flows.employee_sic;
            flows.disposable_in_kind = flows.disposable_income + flows.school_meal;
        }

        for (flows, household) in frame.households.iter_mut().zip(&data.households) {
            let disposable_in_kind: Money = household
                .members
                .iter()
                .map(|&m| frame.persons[m].disposable_in_kind)
                .sum();
            flows.disposable_in_kind = disposable_in_kind;
            flows.consumption = smoothed_consumption(
                household.base_consumption,
                disposable_in_kind - household.reported_disposable,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_binds_only_on_large_losses() {
        assert_eq!(smoothed_consumption(1000.0, -800.0), 250.0);
        assert_eq!(smoothed_consumption(1000.0, -700.0), 300.0);
        assert_eq!(smoothed_consumption(1000.0, 0.0), 1000.0);
        assert_eq!(smoothed_consumption(1000.0, 150.0), 1150.0);
    }
}

//! Distributional analysis tests.

use std::collections::HashMap;
use std::sync::Arc;
use taxben_core::{
    analysis::{equivalize, run_analysis, weighted_average, DECILES},
    catalog::VatCatalog,
    config::{EngineConfig, PolicyParams, UpratingFactors},
    dataset::Dataset,
    household_type::Subgroup,
    results::{BudgetCategory, PovertyGroup},
    simulation::simulate,
    synth::{generate, PopulationSpec},
    types::DistributionStatistic,
    uprating::prepare,
    TaxBenEngine,
};

fn build_engine(seed: u64, households: usize) -> TaxBenEngine {
    let data = generate(&PopulationSpec::with_households(households), seed).expect("generate population");
    TaxBenEngine::new(EngineConfig::builtin(), data)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn household_amounts_are_counted_once() {
    let engine = build_engine(11, 200);
    let sim = engine.simulate(&engine.config().baseline);
    let (bundle, _) = run_analysis(&sim, DistributionStatistic::Consumption, None).expect("analysis");

    let vat_once: f64 = sim
        .households
        .iter()
        .zip(&sim.data.households)
        .map(|(flows, hh)| flows.vat * sim.data.persons[hh.head].weight)
        .sum();
    assert!(vat_once > 0.0);
    assert!(
        close(bundle.budget(BudgetCategory::IndirectTaxes), vat_once),
        "indirect taxes {} vs household VAT {vat_once}",
        bundle.budget(BudgetCategory::IndirectTaxes)
    );

    for record in sim.records().filter(|r| !r.is_head) {
        assert_eq!(record.vat(), 0.0);
        assert_eq!(record.social_assistance(), 0.0);
        assert_eq!(record.consumption(), 0.0);
        assert_eq!(record.equivalence_scale(), 0.0);
    }
}

#[test]
fn budget_totals_are_sums_of_their_items() {
    let engine = build_engine(3, 150);
    let baseline = engine.baseline(DistributionStatistic::Income).expect("baseline");
    let b = &baseline.bundle;

    let revenue: f64 = BudgetCategory::REVENUE.iter().map(|c| b.budget(*c)).sum();
    let expenditure: f64 = BudgetCategory::EXPENDITURE.iter().map(|c| b.budget(*c)).sum();
    assert!(close(b.budget(BudgetCategory::TotalRevenue), revenue));
    assert!(close(b.budget(BudgetCategory::TotalExpenditure), expenditure));

    assert_eq!(b.budget(BudgetCategory::ChildBenefits), b.budget(BudgetCategory::InKindBenefits));
    assert_eq!(b.budget(BudgetCategory::SocialAssistance), b.budget(BudgetCategory::CashBenefits));
    assert_eq!(b.budget(BudgetCategory::IndirectSubsidies), 0.0);

    let shares = b.budget.shares();
    let revenue_shares: f64 = shares[..3].iter().map(|(_, s)| s).sum();
    assert!((revenue_shares - 100.0).abs() < 1e-6);
}

#[test]
fn poverty_rates_and_gaps_are_bounded() {
    let engine = build_engine(5, 300);
    for stat in DistributionStatistic::ALL {
        let baseline = engine.baseline(stat).expect("baseline");
        let bundle = &baseline.bundle;
        assert_eq!(bundle.poverty.len(), PovertyGroup::report_order().len());

        for entry in &bundle.poverty {
            match entry.group {
                PovertyGroup::Header(_) => {
                    assert!(entry.rate.is_none() && entry.gap.is_none());
                }
                _ => {
                    let rate = entry.rate.expect("rate");
                    let gap = entry.gap.expect("gap");
                    assert!((0.0..=100.0).contains(&rate), "{:?} rate {rate}", entry.group);
                    assert!((0.0..=100.0).contains(&gap), "{:?} gap {gap}", entry.group);
                    assert!(gap <= rate + 1e-9, "{:?}: gap {gap} > rate {rate}", entry.group);
                }
            }
        }
    }
}

#[test]
fn poverty_line_matches_the_statistic() {
    let engine = build_engine(9, 80);
    let consumption = engine.baseline(DistributionStatistic::Consumption).expect("baseline");
    let net = engine.baseline(DistributionStatistic::ConsumptionNetIndirect).expect("baseline");
    assert!(close(consumption.bundle.povline, 120.0 * 1.2092));
    assert!(close(net.bundle.povline, 109.0 * 1.2092));
}

#[test]
fn deciles_order_the_equivalized_resource() {
    let engine = build_engine(21, 400);
    let sim = engine.simulate(&engine.config().baseline);
    let (_, frame) = run_analysis(&sim, DistributionStatistic::Consumption, None).expect("analysis");

    let mut lowest = [f64::INFINITY; DECILES as usize];
    let mut highest = [f64::NEG_INFINITY; DECILES as usize];
    for row in &frame.rows {
        assert!((1..=DECILES).contains(&row.decile));
        let d = usize::from(row.decile - 1);
        lowest[d] = lowest[d].min(row.equivalized);
        highest[d] = highest[d].max(row.equivalized);
    }
    for d in 0..usize::from(DECILES) - 1 {
        assert!(lowest[d].is_finite(), "decile {} is empty", d + 1);
        assert!(highest[d] <= lowest[d + 1], "decile {} overlaps decile {}", d + 1, d + 2);
    }
}

#[test]
fn household_members_share_flags_and_resource() {
    let engine = build_engine(4, 120);
    let sim = engine.simulate(&engine.config().baseline);
    let (_, frame) = run_analysis(&sim, DistributionStatistic::Income, None).expect("analysis");

    let mut by_household = HashMap::new();
    for (i, row) in frame.rows.iter().enumerate() {
        let hh = sim.data.household_of[i];
        let first = *by_household.entry(hh).or_insert((row.flags, row.equivalized));
        assert_eq!(first, (row.flags, row.equivalized), "person {} disagrees with household", row.idperson);
    }
}

#[test]
fn household_types_come_from_members() {
    let data = Dataset::parse_str(
        "idhh idperson dhh dag dgn lfo yem x0111\n\
         1 1 1 35 0 1 300 50\n\
         1 2 0 6 1 0 0 0\n\
         2 3 1 70 1 0 0 40\n",
    )
    .expect("parse");
    let data = Arc::new(prepare(data, &UpratingFactors::baseline(), &VatCatalog, &PolicyParams::baseline()));
    let sim = simulate(&data, &PolicyParams::baseline());
    let (_, frame) = run_analysis(&sim, DistributionStatistic::Consumption, None).expect("analysis");

    let parent = frame.rows[0].flags;
    assert!(parent.contains(Subgroup::OneAdultWithChildren));
    assert!(parent.contains(Subgroup::NoMaleAdult));
    assert!(parent.contains(Subgroup::NoInformalAdults));
    assert!(!parent.contains(Subgroup::NoEarnings));
    assert_eq!(frame.rows[1].flags, parent);

    let elder = frame.rows[2].flags;
    assert!(elder.contains(Subgroup::SinglePerson));
    assert!(elder.contains(Subgroup::AtLeastOneElderly));
    assert!(elder.contains(Subgroup::InformalAdult));
    assert!(elder.contains(Subgroup::NoEarnings));
}

#[test]
fn zero_weights_never_fail() {
    let data = Dataset::parse_str(
        "idhh idperson dhh dag dwt x0111\n\
         1 1 1 35 0 50\n\
         2 2 1 40 0 10\n",
    )
    .expect("parse");
    let data = Arc::new(prepare(data, &UpratingFactors::baseline(), &VatCatalog, &PolicyParams::baseline()));
    let sim = simulate(&data, &PolicyParams::baseline());
    let (bundle, frame) = run_analysis(&sim, DistributionStatistic::Consumption, None).expect("analysis");

    assert!(frame.rows.iter().all(|r| r.decile == 1));
    assert_eq!(bundle.poverty_rate(PovertyGroup::AllIndividuals), Some(0.0));
    assert_eq!(bundle.povline, 0.0);
    assert_eq!(bundle.budget(BudgetCategory::TotalRevenue), 0.0);
}

#[test]
fn equivalization_is_zero_where_undefined() {
    assert_eq!(equivalize(-10.0, 1.5), 0.0);
    assert_eq!(equivalize(100.0, 0.0), 0.0);
    assert_eq!(equivalize(150.0, 1.5), 100.0);
    assert_eq!(weighted_average(std::iter::empty()), 0.0);
    assert_eq!(weighted_average([(10.0, 1.0), (20.0, 3.0)]), 17.5);
}

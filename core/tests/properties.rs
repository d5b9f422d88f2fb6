//! Property tests for the rule formulas and the analysis helpers.

use proptest::prelude::*;
use taxben_core::{
    analysis::{assign_deciles, poverty_gap, DECILES},
    config::{EngineConfig, PolicyParams},
    output::round2,
    resources::{smoothed_consumption, CONSUMPTION_FLOOR_SHARE},
    results::PovertyGroup,
    synth::{generate, PopulationSpec},
    tax_rules::{annual_income_tax, presumptive_tax},
    types::DistributionStatistic,
    TaxBenEngine,
};

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn income_tax_is_monotone_and_below_top_rate(a in 0.0f64..1e6, b in 0.0f64..1e6) {
        let params = PolicyParams::baseline();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let tax_low = annual_income_tax(low, &params);
        let tax_high = annual_income_tax(high, &params);
        prop_assert!(tax_low >= 0.0);
        prop_assert!(tax_low <= tax_high + 1e-9);
        prop_assert!(tax_high <= high * params.pit_bracket5_rate + 1e-9);
    }

    #[test]
    fn presumptive_tax_is_never_negative(turnover in -100.0f64..2000.0) {
        let params = PolicyParams::baseline();
        let tax = presumptive_tax(turnover, &params);
        prop_assert!(tax >= 0.0);
        if turnover <= params.presumptive_turnover_1 / 12.0 {
            prop_assert_eq!(tax, 0.0);
        }
    }

    #[test]
    fn consumption_respects_the_floor(base in 0.0f64..1e5, delta in -1e6f64..1e6) {
        let c = smoothed_consumption(base, delta);
        prop_assert!(c >= base * CONSUMPTION_FLOOR_SHARE - 1e-9);
        if delta >= 0.0 {
            prop_assert_eq!(c, base + delta);
        }
    }

    #[test]
    fn poverty_gap_is_a_fraction(resource in 0.0f64..1e4, line in 0.0f64..1e4) {
        let gap = poverty_gap(resource, line);
        prop_assert!((0.0..=1.0).contains(&gap));
        if resource >= line {
            prop_assert_eq!(gap, 0.0);
        }
    }

    #[test]
    fn deciles_are_ordered_and_in_range(
        rows in prop::collection::vec((0.0f64..1000.0, 0.0f64..10.0), 1..200)
    ) {
        let ranks: Vec<f64> = rows.iter().map(|r| r.0).collect();
        let weights: Vec<f64> = rows.iter().map(|r| r.1).collect();
        let deciles = assign_deciles(&ranks, &weights);
        prop_assert_eq!(deciles.len(), rows.len());
        for i in 0..rows.len() {
            prop_assert!((1..=DECILES).contains(&deciles[i]));
            for j in 0..rows.len() {
                if ranks[i] < ranks[j] {
                    prop_assert!(deciles[i] <= deciles[j], "rank {} in {} above rank {} in {}",
                        ranks[i], deciles[i], ranks[j], deciles[j]);
                }
            }
        }
    }

    #[test]
    fn round2_is_idempotent(value in -1e9f64..1e9) {
        let once = round2(value);
        prop_assert_eq!(round2(once), once);
        prop_assert!((once - value).abs() <= 0.005 + 1e-6);
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(8))]

    #[test]
    fn any_population_gives_bounded_poverty(seed in any::<u64>(), households in 1usize..60) {
        let data = generate(&PopulationSpec::with_households(households), seed).expect("generate population");
        let engine = TaxBenEngine::new(EngineConfig::builtin(), data);
        for stat in DistributionStatistic::ALL {
            let baseline = engine.baseline(stat).expect("baseline");
            let rate = baseline.bundle.poverty_rate(PovertyGroup::AllIndividuals).expect("rate");
            prop_assert!((0.0..=100.0).contains(&rate));
            prop_assert!(baseline.bundle.povline > 0.0);
        }
    }
}

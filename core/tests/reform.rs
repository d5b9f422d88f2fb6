//! Reform runs: baseline join, comparison tables, time budget.

use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use taxben_core::{
    analysis::run_analysis,
    budget::RunBudget,
    catalog::VatCatalog,
    config::{EngineConfig, PolicyParams, UpratingFactors},
    dataset::Dataset,
    error::EngineError,
    results::{BudgetCategory, PovertyGroup},
    simulation::simulate,
    synth::{generate, PopulationSpec},
    types::DistributionStatistic,
    uprating::prepare,
    TaxBenEngine,
};

fn build_engine(seed: u64) -> TaxBenEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    let data = generate(&PopulationSpec::with_households(200), seed).expect("generate population");
    TaxBenEngine::new(EngineConfig::builtin(), data)
}

fn overrides(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[test]
fn unchanged_reform_reproduces_the_baseline() {
    let engine = build_engine(1);
    for stat in DistributionStatistic::ALL {
        let baseline = engine.baseline(stat).expect("baseline");
        let reform = engine.run_reform(stat, &engine.config().baseline).expect("reform");
        assert_eq!(reform.bundle, baseline.bundle, "{}", stat.label());
    }
}

#[test]
fn reform_keeps_baseline_deciles_and_household_types() {
    let engine = build_engine(2);
    let stat = DistributionStatistic::Consumption;
    let baseline = engine.baseline(stat).expect("baseline");

    let mut params = engine.config().baseline.clone();
    params.tva_rate = 0.30;
    params.bsa_1_person = 400.0;
    let sim = engine.simulate(&params);

    // ranking on its own, the reform would reshuffle people
    let (_, fresh) = run_analysis(&sim, stat, None).expect("fresh analysis");
    let (_, joined) = run_analysis(&sim, stat, Some(&baseline.extract)).expect("joined analysis");

    assert_eq!(joined.extract(), baseline.extract);
    assert_ne!(fresh.extract(), baseline.extract);
}

#[test]
fn join_fails_for_persons_missing_from_the_baseline() {
    let raw = |text: &str| {
        let data = Dataset::parse_str(text).expect("parse");
        Arc::new(prepare(data, &UpratingFactors::baseline(), &VatCatalog, &PolicyParams::baseline()))
    };
    let params = PolicyParams::baseline();
    let stat = DistributionStatistic::Income;

    let base = raw("idhh idperson dhh dag yem\n1 1 1 30 100\n2 2 1 40 200\n");
    let (_, frame) = run_analysis(&simulate(&base, &params), stat, None).expect("baseline analysis");
    let extract = frame.extract();

    let extra = raw("idhh idperson dhh dag yem\n1 1 1 30 100\n2 2 1 40 200\n3 3 1 50 0\n");
    let err = run_analysis(&simulate(&extra, &params), stat, Some(&extract)).expect_err("extra person");
    assert!(matches!(err, EngineError::BaselineJoin { person_id: 3, .. }), "{err}");

    let fewer = raw("idhh idperson dhh dag yem\n1 1 1 30 100\n");
    let err = run_analysis(&simulate(&fewer, &params), stat, Some(&extract)).expect_err("missing person");
    assert!(matches!(err, EngineError::BaselineJoin { person_id: 2, .. }), "{err}");
}

#[test]
fn raising_vat_raises_indirect_revenue() {
    let engine = build_engine(3);
    let outcome = engine
        .compare(DistributionStatistic::Consumption, &overrides(json!({ "tva_rate": 0.20 })))
        .expect("compare");

    let base = outcome.baseline.bundle.budget(BudgetCategory::IndirectTaxes);
    let reform = outcome.reform.bundle.budget(BudgetCategory::IndirectTaxes);
    assert!(reform > base, "{reform} <= {base}");
    assert!(outcome.param_errors.is_empty());
    assert!(outcome.comparison.policy_changes.iter().any(|l| l == "tva_rate: 0.16 -> 0.2"));
}

#[test]
fn poverty_line_overrides_are_rejected() {
    let engine = build_engine(9);
    let outcome = engine
        .compare(DistributionStatistic::Consumption, &overrides(json!({ "basic_pov_line": 10000 })))
        .expect("compare");

    assert_eq!(outcome.param_errors.len(), 1);
    assert!(matches!(
        &outcome.param_errors[0],
        EngineError::InvalidParameter { name, .. } if name == "basic_pov_line"
    ));
    assert_eq!(outcome.reform.params.basic_pov_line, engine.config().baseline.basic_pov_line);
    assert_eq!(outcome.reform.bundle.povline, outcome.baseline.bundle.povline);
    assert!(outcome.comparison.policy_changes.iter().all(|l| !l.contains("pov_line")));
}

#[test]
fn rejected_overrides_do_not_abort_the_run() {
    let engine = build_engine(4);
    let outcome = engine
        .compare(
            DistributionStatistic::Income,
            &overrides(json!({
                "pit_bracket1_rate": 0.1,
                "bsa_1_person": "abc",
                "no_such_param": 5,
                "senior_grant_amount": 100,
            })),
        )
        .expect("compare");

    assert_eq!(outcome.param_errors.len(), 3);
    assert!(outcome.param_errors.iter().all(EngineError::is_recoverable));
    assert_eq!(outcome.reform.params.senior_grant_amount, 100.0);
    assert_eq!(outcome.reform.params.pit_bracket1_rate, 0.0);
    assert_eq!(outcome.reform.params.bsa_1_person, 165.0);

    let base = outcome.baseline.bundle.budget(BudgetCategory::CashBenefits);
    let reform = outcome.reform.bundle.budget(BudgetCategory::CashBenefits);
    assert!(reform >= base);
}

#[test]
fn comparison_tables_have_the_reporting_layout() {
    let engine = build_engine(5);
    let outcome = engine
        .compare(DistributionStatistic::IncomeNetIndirect, &Map::new())
        .expect("compare");
    let c = &outcome.comparison;

    let labels: Vec<&str> = c.budget.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Sum of government revenue",
            "By source",
            "- Direct taxes",
            "- Social insurance contributions",
            "- Indirect taxes",
            "Sum of government expenditure",
            "By type",
            "- Cash benefits",
            "- In-kind benefits",
            "- Indirect subsidies",
        ]
    );
    assert_eq!(c.shares.len(), 8);
    assert_eq!(c.poverty_rate.len(), PovertyGroup::report_order().len());
    assert_eq!(c.poverty_gap.len(), c.poverty_rate.len());
    assert!(c.poverty_rate.iter().any(|r| r.label == "- HH with children" && r.baseline.is_some()));

    let bundle = serde_json::to_value(&outcome.baseline.bundle).expect("serialize bundle");
    let with_child = &bundle["poverty"]["isHHWithChild"];
    assert!(with_child["Poverty rate (%)"].is_number(), "{with_child}");
    assert!(with_child["Poverty gap (%)"].is_number(), "{with_child}");

    for row in c.budget.iter().chain(&c.shares).chain(&c.poverty_rate) {
        match row.difference {
            None => assert!(row.is_header(), "{} has values but no difference", row.label),
            Some(d) => assert_eq!(d, 0.0, "{} differs under an empty reform", row.label),
        }
    }
    assert!((c.povline_yearly - outcome.baseline.bundle.povline * 12.0).abs() < 1e-9);
    // only the VAT item count line
    assert_eq!(c.policy_changes.len(), 1);
    assert!(c.policy_changes[0].starts_with("Selected standard-rated VAT items (count): 70/79"));
}

#[test]
fn budget_rows_are_yearly_millions() {
    let engine = build_engine(6);
    let outcome = engine
        .compare(DistributionStatistic::Consumption, &overrides(json!({ "tscee_rate": 0.07 })))
        .expect("compare");
    let monthly = outcome.reform.bundle.budget(BudgetCategory::TotalRevenue);
    let row = &outcome.comparison.budget[0];
    let reform = row.reform.expect("reform value");
    assert!((reform - monthly * 12.0 / 1e6).abs() < 1e-12);
}

#[test]
fn exhausted_budget_stops_the_run() {
    let engine = build_engine(7);
    let budget = RunBudget::with_limit(Duration::ZERO);
    thread::sleep(Duration::from_millis(2));

    let err = engine
        .run_reform_within(DistributionStatistic::Consumption, &engine.config().baseline, &budget)
        .expect_err("budget is spent");
    assert!(matches!(err, EngineError::TimeBudgetExceeded { .. }), "{err}");
    // a failed baseline is not cached
    assert!(engine.cache().is_empty());

    // a generous budget completes
    let budget = RunBudget::with_limit(Duration::from_secs(600));
    engine
        .run_reform_within(DistributionStatistic::Consumption, &engine.config().baseline, &budget)
        .expect("reform within budget");
    assert_eq!(engine.cache().len(), 1);
}

#[test]
fn invalid_selector_is_rejected() {
    let err = DistributionStatistic::from_selector(5).expect_err("selector 5");
    assert!(matches!(err, EngineError::InvalidSelector(5)));
    assert_eq!(DistributionStatistic::try_from(3).expect("selector 3"), DistributionStatistic::ConsumptionNetIndirect);
}

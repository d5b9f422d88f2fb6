//! Person-level output extract tests.

use std::sync::Arc;
use taxben_core::{
    catalog::VatCatalog,
    config::{EngineConfig, PolicyParams, UpratingFactors},
    dataset::Dataset,
    output::{round2, OutputExtract, EXTRACT_COLUMNS, MISSING_MARKER},
    simulation::simulate,
    synth::{generate, PopulationSpec},
    uprating::prepare,
    TaxBenEngine,
};

const SURVEY: &str = "\
idhh idperson dhh dag dgn lfo dec yem yds idmother x0112 x0111
1 1 1 41 1 1 3 512.345 400 NA 80 20
1 2 0 9 0 0 3 0 0 1 0 0
2 3 1 67 0 0 6 0 10 NA 30 60
";

fn extract() -> OutputExtract {
    let data = Dataset::parse_str(SURVEY).expect("parse");
    let data = Arc::new(prepare(data, &UpratingFactors::baseline(), &VatCatalog, &PolicyParams::baseline()));
    OutputExtract::from_simulation(&simulate(&data, &PolicyParams::baseline()))
}

fn column(extract: &OutputExtract, name: &str) -> Vec<Option<f64>> {
    extract.column(name).unwrap_or_else(|| panic!("column {name}"))
}

#[test]
fn extract_has_fixed_columns_and_one_row_per_person() {
    let ex = extract();
    assert_eq!(ex.columns, EXTRACT_COLUMNS.to_vec());
    assert_eq!(ex.rows.len(), 3);
    assert!(ex.rows.iter().all(|r| r.len() == EXTRACT_COLUMNS.len()));
    assert_eq!(column(&ex, "idperson"), vec![Some(1.0), Some(2.0), Some(3.0)]);
}

#[test]
fn columns_without_a_source_are_missing() {
    let ex = extract();
    // no idfather column in the survey
    assert!(column(&ex, "idfather").iter().all(Option::is_none));
    // idmother is carried through where present
    assert_eq!(column(&ex, "idmother"), vec![None, Some(1.0), None]);
    // sex was supplied, education was not
    assert!(column(&ex, "dgn").iter().all(Option::is_some));
    assert!(column(&ex, "deh").iter().all(Option::is_none));
}

#[test]
fn weights_are_missing_when_the_survey_has_none() {
    let ex = extract();
    assert_eq!(column(&ex, "dwt"), vec![None, None, None]);

    let weighted = SURVEY.replacen("x0111\n", "x0111 dwt\n", 1)
        .replacen(" 20\n", " 20 2.5\n", 1)
        .replacen(" 0 0\n2", " 0 0 1\n2", 1)
        .replacen(" 60\n", " 60 4\n", 1);
    let data = Dataset::parse_str(&weighted).expect("parse weighted");
    let data = Arc::new(prepare(data, &UpratingFactors::baseline(), &VatCatalog, &PolicyParams::baseline()));
    let ex = OutputExtract::from_simulation(&simulate(&data, &PolicyParams::baseline()));
    assert_eq!(column(&ex, "dwt"), vec![Some(2.5), Some(1.0), Some(4.0)]);
}

#[test]
fn household_values_appear_on_the_head_only() {
    let ex = extract();
    let vat = column(&ex, "tva_s");
    assert!(vat[0].expect("head vat") > 0.0);
    assert_eq!(vat[1], Some(0.0));
    assert_eq!(column(&ex, "ils_head"), vec![Some(1.0), Some(0.0), Some(1.0)]);
    assert_eq!(column(&ex, "ils_con")[1], Some(0.0));
}

#[test]
fn monetary_columns_are_rounded_to_cents() {
    let ex = extract();
    let wage = column(&ex, "yem")[0].expect("wage");
    // 512.345 × 1.3197 = 676.1417...
    assert_eq!(wage, 676.14);
    for name in ["ils_dispy", "ils_tax", "tscee_s", "ils_con"] {
        for value in column(&ex, name).into_iter().flatten() {
            assert_eq!(round2(value), value, "{name} = {value} is not rounded");
        }
    }
    // non-monetary columns are left alone
    assert_eq!(column(&ex, "dag")[0], Some(41.0));
}

#[test]
fn rounding_is_idempotent() {
    let ex = extract();
    assert_eq!(ex.rounded(), ex);
    assert_eq!(ex.rounded().rounded(), ex);
}

#[test]
fn rounding_breaks_ties_to_even() {
    assert_eq!(round2(0.125), 0.12);
    assert_eq!(round2(2.5), 2.5);
    assert_eq!(round2(-1.0), -1.0);
}

#[test]
fn tsv_output_marks_missing_values() {
    let ex = extract();
    let mut buffer = Vec::new();
    ex.write_tsv(&mut buffer).expect("write tsv");
    let text = String::from_utf8(buffer).expect("utf-8");

    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(EXTRACT_COLUMNS.join("\t").as_str()));
    let first: Vec<&str> = lines.next().expect("first row").split('\t').collect();
    assert_eq!(first.len(), EXTRACT_COLUMNS.len());
    let idfather = EXTRACT_COLUMNS.iter().position(|c| *c == "idfather").expect("idfather");
    assert_eq!(first[idfather], MISSING_MARKER);
    let dwt = EXTRACT_COLUMNS.iter().position(|c| *c == "dwt").expect("dwt");
    assert_eq!(first[dwt], MISSING_MARKER);
    assert_eq!(lines.count(), 2);
}

#[test]
fn tsv_written_to_disk_reloads_as_a_dataset() {
    let engine = TaxBenEngine::new(
        EngineConfig::builtin(),
        generate(&PopulationSpec::with_households(30), 8).expect("generate population"),
    );
    let sim = engine.simulate(&engine.config().baseline);
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("extract.tsv");
    OutputExtract::from_simulation(&sim).write_tsv_path(&path).expect("write extract");

    let reloaded = Dataset::from_path(&path).expect("reload extract");
    assert_eq!(reloaded.len(), sim.len());
    assert_eq!(reloaded.households().len(), sim.data.households.len());
}

//! Person-level output extract.
//!
//! RULES:
//!   - Column set and order are fixed by `EXTRACT_COLUMNS`.
//!   - A column with no source in the dataset is written as `NA`.
//!   - Monetary columns are rounded to 2 decimals, ties to even.
//!   - Household-level values appear on the head's row only.

use crate::{
    error::EngineResult,
    simulation::{PersonRecord, SimulatedDataset},
    uprating::PreparedDataset,
};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

pub const MISSING_MARKER: &str = "NA";

pub const EXTRACT_COLUMNS: [&str; 69] = [
    "idhh", "idperson", "idmother", "idfather", "idpartner", "xhh_s", "xhh", "dag", "dgn", "dec",
    "dwt", "dms", "dhh", "ddi", "deh", "dct", "dcz", "dur", "les", "loc", "lfo", "lcs", "lindi",
    "yem", "yse", "yag", "ytn", "yds", "bsa_s", "boa_s", "bed_s", "tscee_s", "tscer_s", "ttn_s",
    "ttb01_s", "ttb02_s", "ttb_s", "tin_s", "tva_s", "arf", "aec", "spl", "splpf", "ses",
    "ils_head", "ils_earns", "ils_origy", "ils_tax", "ils_sicee", "ils_sicse", "ils_sicer",
    "ils_pen", "ils_benmt", "ils_bennt", "ils_benki", "ils_ben", "ils_dispy", "ils_dispy_pf",
    "ils_dispyki", "ils_taxco", "ils_sic", "ils_benco", "ils_bch", "ils_bsa", "ils_dispyx",
    "ils_dispyx_pf", "ils_con", "ils_con_pf", "il_exp_vat",
];

pub const MONETARY_COLUMNS: [&str; 45] = [
    "xhh_s", "xhh", "yem", "yse", "yag", "ytn", "yds", "bsa_s", "boa_s", "bed_s", "tscee_s",
    "tscer_s", "ttn_s", "ttb01_s", "ttb02_s", "ttb_s", "tin_s", "tva_s", "spl", "splpf", "ses",
    "ils_earns", "ils_origy", "ils_tax", "ils_sicee", "ils_sicse", "ils_sicer", "ils_pen",
    "ils_benmt", "ils_bennt", "ils_benki", "ils_ben", "ils_dispy", "ils_dispy_pf", "ils_dispyki",
    "ils_taxco", "ils_sic", "ils_benco", "ils_bch", "ils_bsa", "ils_dispyx", "ils_dispyx_pf",
    "ils_con", "ils_con_pf", "il_exp_vat",
];

/// Round to 2 decimals, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub fn is_monetary(column: &str) -> bool {
    MONETARY_COLUMNS.contains(&column)
}

/// Unrounded value of one extract column for one person. `None` when
/// the dataset has no source for the column.
pub fn column_value(record: &PersonRecord<'_>, data: &PreparedDataset, column: &str) -> Option<f64> {
    let p = record.person;
    let f = record.flows;
    let value = match column {
        "idhh"          => p.idhh as f64,
        "idperson"      => p.idperson as f64,
        "xhh_s"         => record.consumption(),
        "xhh"           => p.household_consumption,
        "dag"           => p.age,
        "dgn"           => p.sex?,
        "dec"           => p.ranking_group,
        "dwt"           => if data.has_weights { p.weight } else { return None },
        "dhh"           => if record.is_head { 1.0 } else { 0.0 },
        "ddi"           => p.disabled,
        "deh"           => p.education?,
        "les"           => p.employment_status?,
        "lfo"           => p.formality,
        "yem"           => p.wage,
        "yse"           => p.self_employment,
        "yag"           => p.agricultural,
        "ytn"           => p.turnover,
        "yds"           => p.reported_disposable,
        "bsa_s"         => record.social_assistance(),
        "boa_s"         => f.senior_grant,
        "bed_s"         => f.school_meal,
        "tscee_s"       => f.employee_sic,
        "tscer_s"       => f.employer_sic,
        "ttn_s"         => f.presumptive_tax,
        "ttb01_s"       => f.taxable_base_other,
        "ttb02_s"       => f.taxable_base_wage,
        "ttb_s"         => f.taxable_base,
        "tin_s"         => f.income_tax,
        "tva_s"         => record.vat(),
        "spl"           => record.basic_poverty_line(),
        "splpf"         => record.basic_poverty_line_pf(),
        "ses"           => record.equivalence_scale(),
        "ils_head"      => if record.is_head { 1.0 } else { 0.0 },
        "ils_earns"     => f.original_income,
        "ils_origy"     => f.original_income,
        "ils_tax"       => record.direct_tax(),
        "ils_sicee"     => f.employee_sic,
        "ils_sicse"     => 0.0,
        "ils_sicer"     => f.employer_sic,
        "ils_pen"       => 0.0,
        "ils_benmt"     => record.cash_benefits(),
        "ils_bennt"     => 0.0,
        "ils_benki"     => record.in_kind(),
        "ils_ben"       => record.cash_benefits(),
        "ils_dispy"     => f.disposable_income,
        "ils_dispy_pf"  => record.disposable_pf(),
        "ils_dispyki"   => f.disposable_in_kind,
        "ils_taxco"     => record.indirect_tax(),
        "ils_sic"       => record.contributions(),
        "ils_benco"     => record.indirect_subsidies(),
        "ils_bch"       => record.in_kind(),
        "ils_bsa"       => record.cash_benefits(),
        "ils_dispyx"    => record.income_x(),
        "ils_dispyx_pf" => record.income_x_pf(),
        "ils_con"       => record.consumption(),
        "ils_con_pf"    => record.consumption_pf(),
        "il_exp_vat"    => record.vat_base(),
        other => {
            let i = data.passthrough_columns.iter().position(|c| c == other)?;
            let v = p.passthrough[i];
            if v.is_nan() { return None; }
            v
        }
    };
    Some(value)
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputExtract {
    pub columns: Vec<&'static str>,
    pub rows:    Vec<Vec<Option<f64>>>,
}

impl OutputExtract {
    pub fn from_simulation(sim: &SimulatedDataset) -> Self {
        let rows = sim
            .records()
            .map(|record| {
                EXTRACT_COLUMNS
                    .iter()
                    .map(|col| {
                        let value = column_value(&record, &sim.data, col)?;
                        Some(if is_monetary(col) { round2(value) } else { value })
                    })
                    .collect()
            })
            .collect();
        Self { columns: EXTRACT_COLUMNS.to_vec(), rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| *c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let i = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[i]).collect())
    }

    /// Round every monetary column again. Already-rounded extracts are
    /// left unchanged.
    pub fn rounded(&self) -> Self {
        let monetary: Vec<bool> = self.columns.iter().map(|c| is_monetary(c)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&monetary)
                    .map(|(v, &m)| if m { v.map(round2) } else { *v })
                    .collect()
            })
            .collect();
        Self { columns: self.columns.clone(), rows }
    }

    pub fn write_tsv<W: Write>(&self, mut out: W) -> EngineResult<()> {
        writeln!(out, "{}", self.columns.join("\t"))?;
        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|v| v.map_or_else(|| MISSING_MARKER.to_string(), |v| v.to_string()))
                .collect();
            writeln!(out, "{}", cells.join("\t"))?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn write_tsv_path(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let file = File::create(path.as_ref())?;
        self.write_tsv(BufWriter::new(file))?;
        log::info!("output: wrote {} rows to {}", self.rows.len(), path.as_ref().display());
        Ok(())
    }
}

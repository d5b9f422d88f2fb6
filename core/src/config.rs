use crate::{
    catalog::{PriceCategory, VatCatalog},
    error::EngineError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

// ── Policy parameter set ───────────────────────────────────────────

/// One complete policy system. Thresholds and amounts are monthly unless
/// the name says otherwise; presumptive turnovers, presumptive amounts and
/// the PIT schedule are annual. Rates are fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyParams {
    // Poverty lines (monthly, pre-uprating)
    pub basic_pov_line:    f64,
    pub upper_pov_line:    f64,
    pub basic_pov_line_pf: f64,
    pub upper_pov_line_pf: f64,

    // Social insurance and VAT
    pub tscee_rate: f64,
    pub tscer_rate: f64,
    pub tva_rate:   f64,

    // Presumptive turnover tax (annual)
    pub presumptive_turnover_1: f64,
    pub presumptive_tax_1:      f64,
    pub presumptive_turnover_2: f64,
    pub presumptive_tax_2:      f64,
    pub presumptive_turnover_3: f64,
    pub presumptive_tax_3:      f64,
    pub presumptive_rate_4:     f64,

    // Personal income tax (annual)
    pub pit_yse_turnover_threshold: f64,
    pub pit_yag_exemption:          f64,
    pub pit_bracket1_thresh:        f64,
    pub pit_bracket1_rate:          f64,
    pub pit_bracket2_thresh:        f64,
    pub pit_bracket2_rate:          f64,
    pub pit_bracket3_thresh:        f64,
    pub pit_bracket3_rate:          f64,
    pub pit_bracket4_thresh:        f64,
    pub pit_bracket4_rate:          f64,
    pub pit_bracket5_thresh:        f64,
    pub pit_bracket5_rate:          f64,

    // Household social assistance
    pub bsa_income_threshold: f64,
    pub bsa_1_person:         f64,
    pub bsa_2_person:         f64,
    pub bsa_3_plus_person:    f64,
    pub bsa_disabled_topup:   f64,

    // Senior citizens grant
    pub senior_grant_age:              f64,
    pub senior_grant_income_threshold: f64,
    pub senior_grant_amount:           f64,

    // School meals
    pub school_meal_value: f64,
    pub school_meal_age:   f64,

    /// Item codes charged at the standard VAT rate.
    pub vat_items_list: Vec<String>,
}

/// Generates `PARAM_NAMES` and the by-name accessors from one field list,
/// so the external names can never drift from the struct.
macro_rules! numeric_params {
    ($($field:ident),* $(,)?) => {
        /// Every numeric parameter name, in presentation order.
        pub const PARAM_NAMES: &[&str] = &[$(stringify!($field)),*];

        impl PolicyParams {
            pub fn get(&self, name: &str) -> Option<f64> {
                match name {
                    $(stringify!($field) => Some(self.$field),)*
                    _ => None,
                }
            }

            fn field_mut(&mut self, name: &str) -> Option<&mut f64> {
                match name {
                    $(stringify!($field) => Some(&mut self.$field),)*
                    _ => None,
                }
            }
        }
    };
}

numeric_params!(
    basic_pov_line, upper_pov_line, basic_pov_line_pf, upper_pov_line_pf,
    tscee_rate, tscer_rate, tva_rate,
    presumptive_turnover_1, presumptive_tax_1,
    presumptive_turnover_2, presumptive_tax_2,
    presumptive_turnover_3, presumptive_tax_3,
    presumptive_rate_4,
    pit_yse_turnover_threshold, pit_yag_exemption,
    pit_bracket1_thresh, pit_bracket1_rate,
    pit_bracket2_thresh, pit_bracket2_rate,
    pit_bracket3_thresh, pit_bracket3_rate,
    pit_bracket4_thresh, pit_bracket4_rate,
    pit_bracket5_thresh, pit_bracket5_rate,
    bsa_income_threshold, bsa_1_person, bsa_2_person,
    bsa_3_plus_person, bsa_disabled_topup,
    senior_grant_age, senior_grant_income_threshold, senior_grant_amount,
    school_meal_value, school_meal_age,
);

/// Parameters a reform cannot edit: the zero-rate first PIT bracket, and
/// the poverty lines, which are fixed when the dataset is prepared.
pub const LOCKED_PARAMS: &[&str] = &[
    "pit_bracket1_thresh",
    "pit_bracket1_rate",
    "basic_pov_line",
    "upper_pov_line",
    "basic_pov_line_pf",
    "upper_pov_line_pf",
];

/// Parameters that only accept whole numbers.
const INTEGER_PARAMS: &[&str] = &["senior_grant_age"];

pub const VAT_ITEMS_PARAM: &str = "vat_items_list";

impl PolicyParams {
    /// The 2023 baseline system.
    pub fn baseline() -> Self {
        Self {
            basic_pov_line:    120.0,
            upper_pov_line:    150.0,
            basic_pov_line_pf: 109.0,
            upper_pov_line_pf: 136.0,

            tscee_rate: 0.05,
            tscer_rate: 0.10,
            tva_rate:   0.16,

            presumptive_turnover_1: 200.0,
            presumptive_tax_1:      0.0,
            presumptive_turnover_2: 400.0,
            presumptive_tax_2:      12.0,
            presumptive_turnover_3: 1200.0,
            presumptive_tax_3:      24.0,
            presumptive_rate_4:     0.03,

            pit_yse_turnover_threshold: 5000.0,
            pit_yag_exemption:          300.0,
            pit_bracket1_thresh:        0.0,
            pit_bracket1_rate:          0.0,
            pit_bracket2_thresh:        500.0,
            pit_bracket2_rate:          0.05,
            pit_bracket3_thresh:        1000.0,
            pit_bracket3_rate:          0.10,
            pit_bracket4_thresh:        1500.0,
            pit_bracket4_rate:          0.20,
            pit_bracket5_thresh:        2000.0,
            pit_bracket5_rate:          0.25,

            bsa_income_threshold: 441.0,
            bsa_1_person:         165.0,
            bsa_2_person:         276.0,
            bsa_3_plus_person:    386.0,
            bsa_disabled_topup:   80.0,

            senior_grant_age:              55.0,
            senior_grant_income_threshold: 221.0,
            senior_grant_amount:           76.0,

            school_meal_value: 80.0,
            school_meal_age:   18.0,

            vat_items_list: VatCatalog.baseline_standard_rated(),
        }
    }

    /// Apply user overrides on top of `self`.
    ///
    /// Each field is tolerated independently: a value that fails to parse
    /// leaves that field at its current value and is reported back as an
    /// `InvalidParameter`. The run itself is never aborted.
    pub fn with_overrides(
        &self,
        overrides: &serde_json::Map<String, Value>,
        catalog: &VatCatalog,
    ) -> (PolicyParams, Vec<EngineError>) {
        let mut params = self.clone();
        let mut rejected = Vec::new();

        for (name, raw) in overrides {
            let outcome = if name == VAT_ITEMS_PARAM {
                parse_vat_items(raw, catalog).map(|items| {
                    params.vat_items_list = items;
                })
            } else if LOCKED_PARAMS.contains(&name.as_str()) {
                Err("parameter is fixed and cannot be changed".to_string())
            } else {
                match params.field_mut(name) {
                    None => Err("unknown parameter".to_string()),
                    Some(field) => parse_param_value(name, raw).map(|parsed| {
                        if let Some(v) = parsed {
                            *field = v;
                        }
                    }),
                }
            };

            if let Err(reason) = outcome {
                log::warn!("parameter override rejected: {name}={raw} ({reason})");
                rejected.push(EngineError::InvalidParameter {
                    name:  name.clone(),
                    value: raw.to_string(),
                    reason,
                });
            }
        }

        (params, rejected)
    }

    /// Human-readable list of differences against `baseline`.
    pub fn describe_changes(&self, baseline: &PolicyParams, catalog: &VatCatalog) -> Vec<String> {
        let mut lines: Vec<String> = PARAM_NAMES
            .iter()
            .filter_map(|name| {
                let old = format_param_value(baseline.get(name)?);
                let new = format_param_value(self.get(name)?);
                (old != new).then(|| format!("{name}: {old} -> {new}"))
            })
            .collect();

        let total = catalog.len();
        lines.push(format!(
            "Selected standard-rated VAT items (count): {}/{total} (baseline {}/{total})",
            self.vat_items_list.len(),
            baseline.vat_items_list.len(),
        ));

        let selected: HashSet<&str> = self.vat_items_list.iter().map(String::as_str).collect();
        let base: HashSet<&str> = baseline.vat_items_list.iter().map(String::as_str).collect();
        if selected != base {
            let mut added: Vec<&str> = selected.difference(&base).copied().collect();
            let mut removed: Vec<&str> = base.difference(&selected).copied().collect();
            added.sort_unstable();
            removed.sort_unstable();
            if !added.is_empty() {
                let labels: Vec<&str> = added.iter().map(|c| catalog.label(c)).collect();
                lines.push(format!("  Added: {}", labels.join("; ")));
            }
            if !removed.is_empty() {
                let labels: Vec<&str> = removed.iter().map(|c| catalog.label(c)).collect();
                lines.push(format!("  Removed: {}", labels.join("; ")));
            }
        }
        lines
    }
}

impl Default for PolicyParams {
    fn default() -> Self { Self::baseline() }
}

/// Parse one numeric override. `Ok(None)` means "no override given".
fn parse_param_value(name: &str, raw: &Value) -> Result<Option<f64>, String> {
    let parsed = match raw {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64().ok_or_else(|| "not a finite number".to_string())?,
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
            if matches!(cleaned.as_str(), "" | "." | "-") {
                return Ok(None);
            }
            cleaned
                .parse::<f64>()
                .map_err(|_| format!("'{s}' is not a number"))?
        }
        _ => return Err("expected a number or numeric string".to_string()),
    };

    if !parsed.is_finite() {
        return Err("not a finite number".to_string());
    }
    if parsed < 0.0 {
        return Err("must not be negative".to_string());
    }
    if INTEGER_PARAMS.contains(&name) {
        return Ok(Some(parsed.round()));
    }
    Ok(Some(parsed))
}

fn parse_vat_items(raw: &Value, catalog: &VatCatalog) -> Result<Vec<String>, String> {
    let entries = raw
        .as_array()
        .ok_or_else(|| "expected a list of item codes".to_string())?;

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let code = entry
            .as_str()
            .ok_or_else(|| format!("item code {entry} is not a string"))?;
        if !catalog.contains(code) {
            return Err(format!("unknown item code '{code}'"));
        }
        if seen.insert(code) {
            items.push(code.to_string());
        }
    }
    Ok(items)
}

/// Four decimals, trailing zeros stripped.
pub fn format_param_value(value: f64) -> String {
    let formatted = format!("{value:.4}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

// ── Uprating factors ───────────────────────────────────────────────

/// CPI and earnings factors bringing raw survey data to the policy year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpratingFactors {
    pub overall:  f64,
    pub food:     f64,
    pub non_food: f64,
    pub alcohol:  f64,
    pub energy:   f64,
    pub earnings: f64,
}

impl UpratingFactors {
    pub fn baseline() -> Self {
        Self {
            overall:  1.2092,
            food:     1.1797,
            non_food: 1.2746,
            alcohol:  1.2089,
            energy:   1.1275,
            earnings: 1.3197,
        }
    }

    pub fn for_category(&self, category: PriceCategory) -> f64 {
        match category {
            PriceCategory::Food    => self.food,
            PriceCategory::Alcohol => self.alcohol,
            PriceCategory::Energy  => self.energy,
            PriceCategory::NonFood => self.non_food,
            PriceCategory::Overall => self.overall,
        }
    }
}

impl Default for UpratingFactors {
    fn default() -> Self { Self::baseline() }
}

// ── Engine config ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub baseline: PolicyParams,
    pub uprating: UpratingFactors,
    pub catalog:  VatCatalog,
}

impl EngineConfig {
    /// Hard-coded baseline system. Used by tests and when no data dir is given.
    pub fn builtin() -> Self {
        Self {
            baseline: PolicyParams::baseline(),
            uprating: UpratingFactors::baseline(),
            catalog:  VatCatalog,
        }
    }

    /// Load from the data/ directory.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let params_path = format!("{data_dir}/params/baseline_params.json");
        let params_content = std::fs::read_to_string(&params_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {params_path}: {e}"))?;
        let baseline: PolicyParams = serde_json::from_str(&params_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {params_path}: {e}"))?;

        let catalog = VatCatalog;
        if let Some(code) = baseline.vat_items_list.iter().find(|c| !catalog.contains(c)) {
            anyhow::bail!("{params_path}: unknown VAT item code '{code}'");
        }

        let uprating_path = format!("{data_dir}/uprating/uprating_factors.json");
        let uprating_content = std::fs::read_to_string(&uprating_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {uprating_path}: {e}"))?;
        let uprating: UpratingFactors = serde_json::from_str(&uprating_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {uprating_path}: {e}"))?;

        Ok(Self { baseline, uprating, catalog })
    }
}

impl Default for EngineConfig {
    fn default() -> Self { Self::builtin() }
}

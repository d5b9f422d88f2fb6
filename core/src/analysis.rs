//! Distributional analysis: ranking, deciles, household types, poverty
//! and budget aggregates for one simulated dataset.
//!
//! STEPS (in order):
//!   1. Household resource = sum of the selected resource over members.
//!   2. Equivalized resource = household resource / head's scale, where
//!      the resource is non-negative and the scale positive; else 0.
//!   3. Groupings. Baseline run: household flags and weighted deciles.
//!      Reform run: joined from the baseline extract by person id.
//!   4. Poverty line, poverty indicator and gap.
//!   5. Budget and poverty aggregates.
//!
//! RULE: degenerate inputs (zero weight, empty subgroup, zero line,
//! zero scale) give 0 for the affected statistic. They never fail.

use crate::{
    error::{EngineError, EngineResult},
    household_type::HouseholdFlags,
    results::{BudgetCategory, BudgetTable, PovertyEntry, PovertyGroup, ResultBundle},
    simulation::{PersonRecord, SimulatedDataset},
    types::{DistributionStatistic, Money, PersonId},
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::HashMap};

pub const DECILES: u8 = 10;

// ── Analysis extract ───────────────────────────────────────────────

/// The groupings a baseline run hands to reform runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractRow {
    pub idperson: PersonId,
    pub decile:   u8,
    pub flags:    HouseholdFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisExtract {
    rows:  Vec<ExtractRow>,
    index: HashMap<PersonId, usize>,
}

impl AnalysisExtract {
    pub fn new(rows: Vec<ExtractRow>) -> Self {
        let index = rows.iter().enumerate().map(|(i, r)| (r.idperson, i)).collect();
        Self { rows, index }
    }

    pub fn rows(&self) -> &[ExtractRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, idperson: PersonId) -> Option<&ExtractRow> {
        self.index.get(&idperson).map(|&i| &self.rows[i])
    }
}

// ── Analysis frame ─────────────────────────────────────────────────

/// Per-person analysis columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisRow {
    pub idperson:           PersonId,
    pub weight:             f64,
    pub resource:           Money,
    pub household_resource: Money,
    pub equivalence_scale:  f64,
    pub equivalized:        Money,
    pub decile:             u8,
    pub flags:              HouseholdFlags,
    pub poor:               bool,
    pub gap:                f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisFrame {
    pub stat:    DistributionStatistic,
    pub rows:    Vec<AnalysisRow>,
    pub povline: Money,
}

impl AnalysisFrame {
    pub fn extract(&self) -> AnalysisExtract {
        AnalysisExtract::new(
            self.rows
                .iter()
                .map(|r| ExtractRow { idperson: r.idperson, decile: r.decile, flags: r.flags })
                .collect(),
        )
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Weighted mean; 0 when there is nothing to average.
pub fn weighted_average(values: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    let (sum, weight) = values
        .into_iter()
        .fold((0.0, 0.0), |(s, w), (value, weight)| (s + value * weight, w + weight));
    if weight == 0.0 { 0.0 } else { sum / weight }
}

/// Equivalized resource, 0 where undefined.
pub fn equivalize(household_resource: Money, scale: f64) -> Money {
    if household_resource >= 0.0 && scale > 0.0 {
        household_resource / scale
    } else {
        0.0
    }
}

/// Poverty gap as a fraction of the line; 0 for the non-poor or a
/// non-positive line.
pub fn poverty_gap(equivalized: Money, povline: Money) -> f64 {
    if povline > 0.0 && equivalized < povline {
        ((povline - equivalized) / povline).max(0.0)
    } else {
        0.0
    }
}

/// Deciles by cumulative weight, in the order given by `ranks`.
///
/// Bin edges are `total × k / 10`; a person falls in decile k when
/// their cumulative weight (own weight included) lies in
/// `[edge(k-1), edge(k))`, the last bin closed. Ties in rank keep
/// input order. Zero total weight puts everyone in decile 1.
pub fn assign_deciles(ranks: &[Money], weights: &[f64]) -> Vec<u8> {
    let mut order: Vec<usize> = (0..ranks.len()).collect();
    order.sort_by(|&a, &b| ranks[a].partial_cmp(&ranks[b]).unwrap_or(Ordering::Equal));

    let total: f64 = weights.iter().sum();
    let mut deciles = vec![1u8; ranks.len()];
    if total <= 0.0 {
        return deciles;
    }

    let step = total / f64::from(DECILES);
    let mut edges: Vec<f64> = (0..=DECILES).map(|k| f64::from(k) * step).collect();
    edges[usize::from(DECILES)] = total;

    let mut cumulative = 0.0;
    for i in order {
        cumulative += weights[i];
        deciles[i] = (1..=DECILES)
            .find(|&k| cumulative < edges[usize::from(k)])
            .unwrap_or(DECILES);
    }
    deciles
}

// ── Run ────────────────────────────────────────────────────────────

pub fn run_analysis(
    sim: &SimulatedDataset,
    stat: DistributionStatistic,
    baseline: Option<&AnalysisExtract>,
) -> EngineResult<(ResultBundle, AnalysisFrame)> {
    let data = &sim.data;
    let records: Vec<PersonRecord<'_>> = sim.records().collect();

    // 1-2. Household resource and equivalization
    let resources: Vec<Money> = records.iter().map(|r| r.resource(stat)).collect();
    let household_resource: Vec<Money> = data
        .households
        .iter()
        .map(|h| h.members.iter().map(|&m| resources[m]).sum())
        .collect();

    let mut rows: Vec<AnalysisRow> = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let hh = data.household_of[i];
            let scale = data.households[hh].equivalence_scale;
            AnalysisRow {
                idperson:           r.person.idperson,
                weight:             r.weight(),
                resource:           resources[i],
                household_resource: household_resource[hh],
                equivalence_scale:  scale,
                equivalized:        equivalize(household_resource[hh], scale),
                decile:             1,
                flags:              HouseholdFlags::empty(),
                poor:               false,
                gap:                0.0,
            }
        })
        .collect();

    // 3. Groupings
    match baseline {
        None => {
            let household_flags: Vec<HouseholdFlags> = data
                .households
                .iter()
                .map(|h| HouseholdFlags::of_household(h.members.iter().map(|&m| &data.persons[m])))
                .collect();
            let ranks: Vec<Money> = rows.iter().map(|r| r.equivalized).collect();
            let weights: Vec<f64> = rows.iter().map(|r| r.weight).collect();
            let deciles = assign_deciles(&ranks, &weights);
            for (i, row) in rows.iter_mut().enumerate() {
                row.decile = deciles[i];
                row.flags = household_flags[data.household_of[i]];
            }
        }
        Some(extract) => join_baseline(&mut rows, extract)?,
    }
    log::debug!("analysis[{}]: groupings ready for {} persons", stat.label(), rows.len());

    // 4. Poverty
    let povline = weighted_average(records.iter().map(|r| (r.poverty_line(stat), r.weight())));
    for row in &mut rows {
        row.poor = row.equivalized < povline;
        row.gap = poverty_gap(row.equivalized, povline);
    }

    // 5. Aggregates
    let weighted_sum = |f: &dyn Fn(&PersonRecord<'_>) -> Money| -> Money {
        records.iter().map(|r| f(r) * r.weight()).sum()
    };
    let budget = BudgetTable::from_base(|cat| match cat {
        BudgetCategory::DirectTaxes                  => weighted_sum(&|r| r.direct_tax()),
        BudgetCategory::SocialInsuranceContributions => weighted_sum(&|r| r.contributions()),
        BudgetCategory::IndirectTaxes                => weighted_sum(&|r| r.indirect_tax()),
        BudgetCategory::CashBenefits                 => weighted_sum(&|r| r.cash_benefits()),
        BudgetCategory::InKindBenefits               => weighted_sum(&|r| r.in_kind()),
        BudgetCategory::IndirectSubsidies            => weighted_sum(&|r| r.indirect_subsidies()),
        BudgetCategory::ChildBenefits                => weighted_sum(&|r| r.in_kind()),
        BudgetCategory::SocialAssistance             => weighted_sum(&|r| r.cash_benefits()),
        BudgetCategory::TotalRevenue | BudgetCategory::TotalExpenditure => 0.0,
    });

    let poverty = PovertyGroup::report_order()
        .into_iter()
        .map(|group| poverty_entry(group, &rows))
        .collect();

    let bundle = ResultBundle { budget, poverty, povline };
    log::info!(
        "analysis[{}]: povline={:.2} poverty rate={:.2}% revenue={:.0} expenditure={:.0}",
        stat.label(),
        povline,
        bundle.poverty_rate(PovertyGroup::AllIndividuals).unwrap_or(0.0),
        bundle.budget(BudgetCategory::TotalRevenue),
        bundle.budget(BudgetCategory::TotalExpenditure),
    );

    Ok((bundle, AnalysisFrame { stat, rows, povline }))
}

/// Replace groupings with the baseline's, keyed by person id. Both
/// directions must match: every reform person is in the baseline and
/// every baseline person is in the reform.
fn join_baseline(rows: &mut [AnalysisRow], extract: &AnalysisExtract) -> EngineResult<()> {
    for row in rows.iter_mut() {
        let base = extract.get(row.idperson).ok_or_else(|| EngineError::BaselineJoin {
            person_id: row.idperson,
            reason:    "person not in baseline extract".into(),
        })?;
        row.decile = base.decile;
        row.flags = base.flags;
    }

    if extract.len() != rows.len() {
        let present: std::collections::HashSet<PersonId> = rows.iter().map(|r| r.idperson).collect();
        if let Some(missing) = extract.rows().iter().find(|r| !present.contains(&r.idperson)) {
            return Err(EngineError::BaselineJoin {
                person_id: missing.idperson,
                reason:    "baseline person missing from reform dataset".into(),
            });
        }
    }
    Ok(())
}

fn poverty_entry(group: PovertyGroup, rows: &[AnalysisRow]) -> PovertyEntry {
    let member = |row: &&AnalysisRow| match group {
        PovertyGroup::Subgroup(g) => row.flags.contains(g),
        _ => true,
    };
    match group {
        PovertyGroup::Header(_) => PovertyEntry { group, rate: None, gap: None },
        _ => {
            let rate = weighted_average(
                rows.iter().filter(member).map(|r| (if r.poor { 1.0 } else { 0.0 }, r.weight)),
            );
            let gap = weighted_average(rows.iter().filter(member).map(|r| (r.gap, r.weight)));
            PovertyEntry { group, rate: Some(rate * 100.0), gap: Some(gap * 100.0) }
        }
    }
}

//! Population micro-data: persons grouped into households.
//!
//! RULE: a Dataset is read-only once built. Every derived column is
//! produced by later stages into their own structures.
//!
//! Input format: whitespace-delimited text, one header row, one row per
//! person. `idhh`, `dhh` and `idperson` are required; every other known
//! column defaults to zero when absent. Columns named `x<digit>...` are
//! item-level consumption. Anything else is carried through untouched.

use crate::{
    catalog::is_item_column,
    error::{EngineError, EngineResult},
    types::{HouseholdId, Money, PersonId},
};
use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 3] = ["idhh", "dhh", "idperson"];

/// Cell values read as "missing" (and therefore zero for monetary columns).
const MISSING_MARKERS: [&str; 5] = ["NA", "nan", "NaN", ".", ""];

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub idperson: PersonId,
    pub idhh:     HouseholdId,
    /// `dhh == 1`
    pub head:     bool,

    // Demographics
    pub age:               f64,
    pub sex:               Option<f64>,
    pub disabled:          f64,
    pub education:         Option<f64>,
    pub employment_status: Option<f64>,
    /// `lfo`: 1 formal, 0 informal.
    pub formality:         f64,
    /// `dec`: household ranking group recorded in the survey.
    pub ranking_group:     f64,
    pub weight:            f64,

    // Monthly money
    pub wage:                  Money,
    pub self_employment:       Money,
    pub agricultural:          Money,
    pub turnover:              Money,
    pub reported_disposable:   Money,
    /// `xhh`: household total consumption repeated on every member.
    pub household_consumption: Money,
    /// `xivot`: other resources added to disposable income.
    pub other_resources:       Money,

    /// Item-level consumption, aligned with `Dataset::item_codes`.
    pub items:       Vec<Money>,
    /// Unknown columns, aligned with `Dataset::passthrough_columns`.
    pub passthrough: Vec<f64>,
}

impl Person {
    /// A person with every optional attribute at its default.
    pub fn new(idperson: PersonId, idhh: HouseholdId, head: bool) -> Self {
        Self {
            idperson,
            idhh,
            head,
            age: 0.0,
            sex: None,
            disabled: 0.0,
            education: None,
            employment_status: None,
            formality: 0.0,
            ranking_group: 0.0,
            weight: 1.0,
            wage: 0.0,
            self_employment: 0.0,
            agricultural: 0.0,
            turnover: 0.0,
            reported_disposable: 0.0,
            household_consumption: 0.0,
            other_resources: 0.0,
            items: Vec::new(),
            passthrough: Vec::new(),
        }
    }

    pub fn is_formal(&self) -> bool {
        self.formality == 1.0
    }

    pub fn is_informal(&self) -> bool {
        self.formality == 0.0
    }

    pub fn is_male(&self) -> bool {
        self.sex.is_some_and(|s| s > 0.0)
    }

    /// Wage + self-employment + agricultural income.
    pub fn original_income(&self) -> Money {
        self.wage + self.self_employment + self.agricultural
    }
}

/// Members of one household. `head` and `members` index into the person list.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdGroup {
    pub id:      HouseholdId,
    pub head:    usize,
    pub members: Vec<usize>,
}

impl HouseholdGroup {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    persons:             Vec<Person>,
    item_codes:          Vec<String>,
    passthrough_columns: Vec<String>,
    /// Whether `xhh` was supplied at all.
    has_household_consumption: bool,
    /// Whether `dwt` was supplied; otherwise every weight is the default 1.
    has_weights:         bool,
    households:          Vec<HouseholdGroup>,
    household_of:        Vec<usize>,
}

impl Dataset {
    /// Build and validate a dataset from typed persons. Typed persons
    /// always carry a weight. Errors number rows as if written out below
    /// a header line.
    pub fn new(
        persons: Vec<Person>,
        item_codes: Vec<String>,
        passthrough_columns: Vec<String>,
        has_household_consumption: bool,
    ) -> EngineResult<Self> {
        let lines: Vec<usize> = (0..persons.len()).map(|row| row + 2).collect();
        let layout = ColumnLayout {
            columns: Vec::new(),
            item_codes,
            passthrough_columns,
            has_household_consumption,
            has_weights: true,
        };
        Self::build(persons, &lines, layout)
    }

    /// `lines[i]` is the source line of `persons[i]`, used in errors.
    fn build(persons: Vec<Person>, lines: &[usize], layout: ColumnLayout) -> EngineResult<Self> {
        validate_persons(&persons, lines, layout.item_codes.len(), layout.passthrough_columns.len())?;
        let (households, household_of) = group_households(&persons, lines)?;
        Ok(Self {
            persons,
            item_codes: layout.item_codes,
            passthrough_columns: layout.passthrough_columns,
            has_household_consumption: layout.has_household_consumption,
            has_weights: layout.has_weights,
            households,
            household_of,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn parse_str(text: &str) -> EngineResult<Self> {
        Self::from_reader(text.as_bytes())
    }

    pub fn from_reader<R: BufRead>(reader: R) -> EngineResult<Self> {
        let mut lines = reader.lines().enumerate();

        let header: Vec<String> = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line?;
                    if !line.trim().is_empty() {
                        break line.split_whitespace().map(str::to_string).collect();
                    }
                }
                None => {
                    return Err(EngineError::MissingColumns {
                        columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
                    })
                }
            }
        };

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !header.iter().any(|h| h == *c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::MissingColumns { columns: missing });
        }

        let layout = ColumnLayout::from_header(&header);
        let mut persons = Vec::new();
        let mut source_lines = Vec::new();
        for (index, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            persons.push(layout.parse_row(&line, index + 1)?);
            source_lines.push(index + 1);
        }

        log::debug!(
            "dataset: parsed {} persons, {} item columns, {} pass-through columns",
            persons.len(),
            layout.item_codes.len(),
            layout.passthrough_columns.len()
        );

        Self::build(persons, &source_lines, layout)
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn item_codes(&self) -> &[String] {
        &self.item_codes
    }

    pub fn passthrough_columns(&self) -> &[String] {
        &self.passthrough_columns
    }

    pub fn has_household_consumption(&self) -> bool {
        self.has_household_consumption
    }

    pub fn has_weights(&self) -> bool {
        self.has_weights
    }

    pub fn households(&self) -> &[HouseholdGroup] {
        &self.households
    }

    /// Household index of each person.
    pub fn household_of(&self) -> &[usize] {
        &self.household_of
    }

    /// Consume into parts for the preparation stage.
    pub(crate) fn into_parts(self) -> DatasetParts {
        DatasetParts {
            persons:             self.persons,
            item_codes:          self.item_codes,
            passthrough_columns: self.passthrough_columns,
            has_household_consumption: self.has_household_consumption,
            has_weights:         self.has_weights,
            households:          self.households,
            household_of:        self.household_of,
        }
    }
}

pub(crate) struct DatasetParts {
    pub persons:             Vec<Person>,
    pub item_codes:          Vec<String>,
    pub passthrough_columns: Vec<String>,
    pub has_household_consumption: bool,
    pub has_weights:         bool,
    pub households:          Vec<HouseholdGroup>,
    pub household_of:        Vec<usize>,
}

// ── Parsing ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Column {
    IdPerson,
    IdHh,
    Dhh,
    Dag,
    Dgn,
    Ddi,
    Deh,
    Les,
    Lfo,
    Dec,
    Dwt,
    Yem,
    Yse,
    Yag,
    Ytn,
    Yds,
    Xhh,
    Xivot,
    Item(usize),
    Passthrough(usize),
}

struct ColumnLayout {
    columns:             Vec<Column>,
    item_codes:          Vec<String>,
    passthrough_columns: Vec<String>,
    has_household_consumption: bool,
    has_weights:         bool,
}

impl ColumnLayout {
    fn from_header(header: &[String]) -> Self {
        let mut item_codes = Vec::new();
        let mut passthrough_columns = Vec::new();
        let columns = header
            .iter()
            .map(|name| match name.as_str() {
                "idperson" => Column::IdPerson,
                "idhh"     => Column::IdHh,
                "dhh"      => Column::Dhh,
                "dag"      => Column::Dag,
                "dgn"      => Column::Dgn,
                "ddi"      => Column::Ddi,
                "deh"      => Column::Deh,
                "les"      => Column::Les,
                "lfo"      => Column::Lfo,
                "dec"      => Column::Dec,
                "dwt"      => Column::Dwt,
                "yem"      => Column::Yem,
                "yse"      => Column::Yse,
                "yag"      => Column::Yag,
                "ytn"      => Column::Ytn,
                "yds"      => Column::Yds,
                "xhh"      => Column::Xhh,
                "xivot"    => Column::Xivot,
                other if is_item_column(other) => {
                    item_codes.push(other.to_string());
                    Column::Item(item_codes.len() - 1)
                }
                other => {
                    passthrough_columns.push(other.to_string());
                    Column::Passthrough(passthrough_columns.len() - 1)
                }
            })
            .collect();

        Self {
            columns,
            item_codes,
            passthrough_columns,
            has_household_consumption: header.iter().any(|h| h == "xhh"),
            has_weights:         header.iter().any(|h| h == "dwt"),
        }
    }

    fn parse_row(&self, line: &str, line_no: usize) -> EngineResult<Person> {
        let cells: Vec<&str> = line.split_whitespace().collect();
        if cells.len() != self.columns.len() {
            return Err(EngineError::Dataset {
                line:    line_no,
                message: format!("expected {} fields, found {}", self.columns.len(), cells.len()),
            });
        }

        let mut person = Person::new(0, 0, false);
        person.items = vec![0.0; self.item_codes.len()];
        person.passthrough = vec![f64::NAN; self.passthrough_columns.len()];

        for (column, cell) in self.columns.iter().zip(cells) {
            match column {
                Column::IdPerson => person.idperson = parse_id(cell, "idperson", line_no)?,
                Column::IdHh     => person.idhh = parse_id(cell, "idhh", line_no)?,
                Column::Dhh      => person.head = parse_cell(cell, line_no)? == 1.0,
                Column::Dag      => person.age = parse_cell(cell, line_no)?,
                Column::Dgn      => person.sex = Some(parse_cell(cell, line_no)?),
                Column::Ddi      => person.disabled = parse_cell(cell, line_no)?,
                Column::Deh      => person.education = Some(parse_cell(cell, line_no)?),
                Column::Les      => person.employment_status = Some(parse_cell(cell, line_no)?),
                Column::Lfo      => person.formality = parse_cell(cell, line_no)?,
                Column::Dec      => person.ranking_group = parse_cell(cell, line_no)?,
                Column::Dwt      => person.weight = parse_cell(cell, line_no)?,
                Column::Yem      => person.wage = parse_cell(cell, line_no)?,
                Column::Yse      => person.self_employment = parse_cell(cell, line_no)?,
                Column::Yag      => person.agricultural = parse_cell(cell, line_no)?,
                Column::Ytn      => person.turnover = parse_cell(cell, line_no)?,
                Column::Yds      => person.reported_disposable = parse_cell(cell, line_no)?,
                Column::Xhh      => person.household_consumption = parse_cell(cell, line_no)?,
                Column::Xivot    => person.other_resources = parse_cell(cell, line_no)?,
                Column::Item(i)  => person.items[*i] = parse_cell(cell, line_no)?,
                Column::Passthrough(i) => {
                    person.passthrough[*i] = cell.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
        }
        Ok(person)
    }
}

/// Numeric cell; missing markers read as zero.
fn parse_cell(cell: &str, line_no: usize) -> EngineResult<f64> {
    if MISSING_MARKERS.contains(&cell) {
        return Ok(0.0);
    }
    let value = cell.parse::<f64>().map_err(|_| EngineError::Dataset {
        line:    line_no,
        message: format!("'{cell}' is not numeric"),
    })?;
    Ok(if value.is_nan() { 0.0 } else { value })
}

fn parse_id(cell: &str, column: &str, line_no: usize) -> EngineResult<i64> {
    let value = cell.parse::<f64>().ok().filter(|v| v.is_finite() && v.fract() == 0.0);
    value.map(|v| v as i64).ok_or_else(|| EngineError::Dataset {
        line:    line_no,
        message: format!("{column} '{cell}' is not an integer id"),
    })
}

// ── Validation & grouping ──────────────────────────────────────────

fn validate_persons(persons: &[Person], lines: &[usize], n_items: usize, n_passthrough: usize) -> EngineResult<()> {
    let mut ids = HashSet::with_capacity(persons.len());
    for (person, &line) in persons.iter().zip(lines) {
        if !ids.insert(person.idperson) {
            return Err(EngineError::Dataset {
                line,
                message: format!("duplicate idperson {}", person.idperson),
            });
        }
        if !person.weight.is_finite() || person.weight < 0.0 {
            return Err(EngineError::Dataset {
                line,
                message: format!("weight {} must be finite and non-negative", person.weight),
            });
        }
        if person.items.len() != n_items || person.passthrough.len() != n_passthrough {
            return Err(EngineError::Dataset {
                line,
                message: "row width does not match the column layout".to_string(),
            });
        }
    }
    Ok(())
}

/// Households in order of first appearance, each with exactly one head.
fn group_households(persons: &[Person], lines: &[usize]) -> EngineResult<(Vec<HouseholdGroup>, Vec<usize>)> {
    let mut index_of: HashMap<HouseholdId, usize> = HashMap::new();
    let mut members: Vec<(HouseholdId, Vec<usize>)> = Vec::new();
    let mut household_of = Vec::with_capacity(persons.len());

    for (i, person) in persons.iter().enumerate() {
        let h = *index_of.entry(person.idhh).or_insert_with(|| {
            members.push((person.idhh, Vec::new()));
            members.len() - 1
        });
        members[h].1.push(i);
        household_of.push(h);
    }

    let households = members
        .into_iter()
        .map(|(id, members)| {
            let heads: Vec<usize> = members.iter().copied().filter(|&i| persons[i].head).collect();
            match heads.as_slice() {
                [head] => Ok(HouseholdGroup { id, head: *head, members }),
                _ => Err(EngineError::Dataset {
                    line:    lines[members[0]],
                    message: format!("household {id} has {} heads, expected exactly one", heads.len()),
                }),
            }
        })
        .collect::<EngineResult<Vec<_>>>()?;

    Ok((households, household_of))
}

//! Household-type taxonomy used for poverty breakdowns.
//!
//! Structural tiers are mutually exclusive and cover every household
//! with at least one adult. Cross-cutting flags are independent.
//! Flags are computed per household from member counts, then shared
//! by every member.

use crate::{dataset::Person, types::Money};
use serde::{Deserialize, Serialize};

pub const CHILD_AGE_LIMIT: f64 = 18.0;
pub const ELDERLY_AGE: f64 = 65.0;
pub const YOUNG_CHILD_MAX_AGE: f64 = 2.0;

/// Member counts a household's flags are derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemberCounts {
    pub persons:         u32,
    pub adults:          u32,
    pub children:        u32,
    pub young_children:  u32,
    pub elderly:         u32,
    pub disabled:        f64,
    pub male_adults:     u32,
    pub informal_adults: u32,
    pub earnings:        Money,
}

impl MemberCounts {
    pub fn add(&mut self, person: &Person) {
        let adult = person.age >= CHILD_AGE_LIMIT;
        self.persons += 1;
        self.adults += u32::from(adult);
        self.children += u32::from(person.age < CHILD_AGE_LIMIT);
        self.young_children += u32::from(person.age <= YOUNG_CHILD_MAX_AGE);
        self.elderly += u32::from(person.age >= ELDERLY_AGE);
        self.disabled += person.disabled;
        self.male_adults += u32::from(adult && person.is_male());
        self.informal_adults += u32::from(adult && person.is_informal());
        self.earnings += person.original_income();
    }

    pub fn of<'a>(members: impl IntoIterator<Item = &'a Person>) -> Self {
        let mut counts = Self::default();
        for person in members {
            counts.add(person);
        }
        counts
    }
}

// ── Subgroups ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    HouseholdStructure,
    Vulnerable,
    Labour,
}

impl Section {
    pub fn key(self) -> &'static str {
        match self {
            Section::HouseholdStructure => "header_hh_structure",
            Section::Vulnerable         => "header_vulnerable",
            Section::Labour             => "header_labor",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Section::HouseholdStructure => "Household structure",
            Section::Vulnerable         => "Vulnerable households",
            Section::Labour             => "Labour market status",
        }
    }
}

/// One household-type subgroup. The discriminant is its bit in
/// `HouseholdFlags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subgroup {
    SinglePerson = 0,
    OneAdultWithChildren,
    TwoAdultsNoChildren,
    TwoAdultsOneTwoChildren,
    TwoAdultsThreeFourChildren,
    TwoAdultsFivePlusChildren,
    ThreePlusAdultsNoChildren,
    ThreePlusAdultsWithChildren,
    YoungChild,
    AtLeastOneElderly,
    AtLeastOneDisabled,
    NoMaleAdult,
    NoEarnings,
    InformalAdult,
    NoInformalAdults,
    WithChild,
}

impl Subgroup {
    /// Every subgroup, in reporting order.
    pub const ALL: [Subgroup; 16] = [
        Subgroup::SinglePerson,
        Subgroup::OneAdultWithChildren,
        Subgroup::TwoAdultsNoChildren,
        Subgroup::TwoAdultsOneTwoChildren,
        Subgroup::TwoAdultsThreeFourChildren,
        Subgroup::TwoAdultsFivePlusChildren,
        Subgroup::ThreePlusAdultsNoChildren,
        Subgroup::ThreePlusAdultsWithChildren,
        Subgroup::WithChild,
        Subgroup::YoungChild,
        Subgroup::AtLeastOneElderly,
        Subgroup::AtLeastOneDisabled,
        Subgroup::NoMaleAdult,
        Subgroup::NoEarnings,
        Subgroup::InformalAdult,
        Subgroup::NoInformalAdults,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Subgroup::SinglePerson                => "isSinglePersonHH",
            Subgroup::OneAdultWithChildren        => "is1AdultWithChildrenHH",
            Subgroup::TwoAdultsNoChildren         => "is2AdultsNoChildrenHH",
            Subgroup::TwoAdultsOneTwoChildren     => "is2Adults1_2ChildrenHH",
            Subgroup::TwoAdultsThreeFourChildren  => "is2Adults3_4ChildrenHH",
            Subgroup::TwoAdultsFivePlusChildren   => "is2Adults5plusChildrenHH",
            Subgroup::ThreePlusAdultsNoChildren   => "is3plusAdultsNoChildrenHH",
            Subgroup::ThreePlusAdultsWithChildren => "is3plusAdultsWithChildrenHH",
            Subgroup::YoungChild                  => "isYoungChildHH",
            Subgroup::AtLeastOneElderly           => "isAtLeastOneElderlyHH",
            Subgroup::AtLeastOneDisabled          => "isAtLeastOneDisabledHH",
            Subgroup::NoMaleAdult                 => "isNoMaleAdultHH",
            Subgroup::NoEarnings                  => "isNoTotalHHEarningsHH",
            Subgroup::InformalAdult               => "isInformalAdultHH",
            Subgroup::NoInformalAdults            => "isNoInformalAdultsHH",
            Subgroup::WithChild                   => "isHHWithChild",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Subgroup::SinglePerson                => "Single person",
            Subgroup::OneAdultWithChildren        => "Single parent",
            Subgroup::TwoAdultsNoChildren         => "2 adults without children",
            Subgroup::TwoAdultsOneTwoChildren     => "2 adults with 1-2 children",
            Subgroup::TwoAdultsThreeFourChildren  => "2 adults with 3-4 children",
            Subgroup::TwoAdultsFivePlusChildren   => "2 adults with 5+ children",
            Subgroup::ThreePlusAdultsNoChildren   => "3+ adults without children",
            Subgroup::ThreePlusAdultsWithChildren => "3+ adults with children",
            Subgroup::YoungChild                  => "HH with young child (0-2)",
            Subgroup::AtLeastOneElderly           => "HH with elderly member",
            Subgroup::AtLeastOneDisabled          => "HH with disabled member",
            Subgroup::NoMaleAdult                 => "HH with no male adults",
            Subgroup::NoEarnings                  => "HH with no labour income",
            Subgroup::InformalAdult               => "HH with informal adult(s)",
            Subgroup::NoInformalAdults            => "HH with no informal adults",
            Subgroup::WithChild                   => "HH with children",
        }
    }

    /// Reporting section. Every subgroup is reported under exactly one.
    pub fn section(self) -> Section {
        use Subgroup::*;
        match self {
            SinglePerson | OneAdultWithChildren | TwoAdultsNoChildren | TwoAdultsOneTwoChildren
            | TwoAdultsThreeFourChildren | TwoAdultsFivePlusChildren | ThreePlusAdultsNoChildren
            | ThreePlusAdultsWithChildren => Section::HouseholdStructure,
            WithChild | YoungChild | AtLeastOneElderly | AtLeastOneDisabled | NoMaleAdult => Section::Vulnerable,
            NoEarnings | InformalAdult | NoInformalAdults => Section::Labour,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.key() == key)
    }

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

// ── Flags ──────────────────────────────────────────────────────────

/// Set of subgroups a household belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HouseholdFlags(u32);

impl HouseholdFlags {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, group: Subgroup) -> bool {
        self.0 & group.bit() != 0
    }

    pub fn insert(&mut self, group: Subgroup) {
        self.0 |= group.bit();
    }

    pub fn iter(self) -> impl Iterator<Item = Subgroup> {
        Subgroup::ALL.into_iter().filter(move |g| self.contains(*g))
    }

    pub fn from_counts(c: &MemberCounts) -> Self {
        use Subgroup::*;
        let mut flags = Self::empty();
        let mut set = |group: Subgroup, on: bool| {
            if on {
                flags.insert(group);
            }
        };

        set(SinglePerson, c.persons == 1);
        set(OneAdultWithChildren, c.adults == 1 && c.children >= 1);
        set(TwoAdultsNoChildren, c.adults == 2 && c.children == 0);
        set(TwoAdultsOneTwoChildren, c.adults == 2 && (1..=2).contains(&c.children));
        set(TwoAdultsThreeFourChildren, c.adults == 2 && (3..=4).contains(&c.children));
        set(TwoAdultsFivePlusChildren, c.adults == 2 && c.children >= 5);
        set(ThreePlusAdultsNoChildren, c.adults >= 3 && c.children == 0);
        set(ThreePlusAdultsWithChildren, c.adults >= 3 && c.children >= 1);

        set(YoungChild, c.young_children > 0);
        set(AtLeastOneElderly, c.elderly > 0);
        set(AtLeastOneDisabled, c.disabled > 0.0);
        set(NoMaleAdult, c.male_adults == 0);
        set(NoEarnings, c.earnings <= 0.0);
        set(InformalAdult, c.informal_adults > 0);
        set(NoInformalAdults, c.informal_adults == 0);
        set(WithChild, c.children > 0);
        flags
    }

    pub fn of_household<'a>(members: impl IntoIterator<Item = &'a Person>) -> Self {
        Self::from_counts(&MemberCounts::of(members))
    }
}

use crate::types::{Field, Record};
use std::collections::BTreeSet;
use std::fmt;

/// Label offered first in the quarter picker; selects every period.
pub const ALL_PERIODS_LABEL: &str = "전체";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PeriodSelection {
    #[default]
    All,
    /// Explicit codes. An empty set matches nothing.
    Only(BTreeSet<String>),
}

impl PeriodSelection {
    pub fn single(code: &str) -> Self {
        PeriodSelection::Only(BTreeSet::from([code.to_string()]))
    }

    /// Parse picker input: the all-label (or `all`) selects every period,
    /// anything else is a comma-separated list of codes.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input == ALL_PERIODS_LABEL || input.eq_ignore_ascii_case("all") {
            return PeriodSelection::All;
        }
        PeriodSelection::Only(split_list(input))
    }

    fn matches(&self, period: Option<&str>) -> bool {
        match self {
            PeriodSelection::All => true,
            PeriodSelection::Only(codes) => period.map_or(false, |p| codes.contains(p)),
        }
    }
}

/// Current user choices. Empty district-type and category sets apply no
/// filter on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub periods: PeriodSelection,
    pub district_types: BTreeSet<String>,
    pub categories: BTreeSet<String>,
}

impl FilterSelection {
    pub fn all() -> Self {
        FilterSelection::default()
    }

    pub fn with_periods(mut self, periods: PeriodSelection) -> Self {
        self.periods = periods;
        self
    }

    pub fn with_district_types<I: IntoIterator<Item = String>>(mut self, types: I) -> Self {
        self.district_types = types.into_iter().collect();
        self
    }

    pub fn with_categories<I: IntoIterator<Item = String>>(mut self, categories: I) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    pub fn matches(&self, r: &Record) -> bool {
        self.periods.matches(r.period_code.as_deref())
            && member_or_unfiltered(&self.district_types, r.district_type.as_deref())
            && member_or_unfiltered(&self.categories, r.category.as_deref())
    }
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |s: &BTreeSet<String>| {
            if s.is_empty() {
                ALL_PERIODS_LABEL.to_string()
            } else {
                s.iter().cloned().collect::<Vec<_>>().join(", ")
            }
        };
        let periods = match &self.periods {
            PeriodSelection::All => ALL_PERIODS_LABEL.to_string(),
            PeriodSelection::Only(codes) if codes.is_empty() => "(none)".to_string(),
            PeriodSelection::Only(codes) => codes.iter().cloned().collect::<Vec<_>>().join(", "),
        };
        write!(
            f,
            "분기: {} | 상권유형: {} | 업종: {}",
            periods,
            join(&self.district_types),
            join(&self.categories)
        )
    }
}

fn member_or_unfiltered(set: &BTreeSet<String>, value: Option<&str>) -> bool {
    set.is_empty() || value.map_or(false, |v| set.contains(v))
}

/// Stable filter: keeps the input order and borrows, never copies, rows.
pub fn apply<'a, I>(records: I, selection: &FilterSelection) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records.into_iter().filter(|r| selection.matches(r)).collect()
}

/// Distinct non-missing values of a text field, sorted as text.
pub fn distinct_values<'a, I>(records: I, field: Field) -> Vec<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    let set: BTreeSet<&str> = records.into_iter().filter_map(|r| r.text(field)).collect();
    set.into_iter().map(str::to_string).collect()
}

/// Quarter picker entries: the all-label first, then codes in text order.
pub fn period_options(records: &[Record]) -> Vec<String> {
    let mut opts = vec![ALL_PERIODS_LABEL.to_string()];
    opts.extend(distinct_values(records, Field::PeriodCode));
    opts
}

pub fn split_list(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

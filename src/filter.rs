use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    columns::Dimension,
    data::TxnType,
    loader::{SalesRecord, SalesTable, distinct_values},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TypeFilter {
    #[default]
    Both,
    Sale,
    Return,
}

impl TypeFilter {
    fn matches(self, txn_type: &TxnType) -> bool {
        match self {
            TypeFilter::Both => true,
            TypeFilter::Sale => *txn_type == TxnType::Sale,
            TypeFilter::Return => *txn_type == TxnType::Return,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BOTH" | "ALL" => Ok(TypeFilter::Both),
            "SALE" => Ok(TypeFilter::Sale),
            "RETURN" => Ok(TypeFilter::Return),
            other => Err(format!(
                "Unknown type '{other}' (expected BOTH, SALE or RETURN)"
            )),
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeFilter::Both => "BOTH",
            TypeFilter::Sale => "SALE",
            TypeFilter::Return => "RETURN",
        })
    }
}

/// Inclusive on both ends. A range whose start is after its end matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Fills whichever bound is missing from the table's own min/max.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        table: &SalesTable,
    ) -> Option<DateRange> {
        if start.is_none() && end.is_none() {
            return None;
        }
        let (min, max) = table
            .date_bounds()
            .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        Some(DateRange::new(start.unwrap_or(min), end.unwrap_or(max)))
    }
}

/// The user's current selection. An empty set for a dimension means no
/// restriction on it; all criteria are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Criteria {
    /// `None` spans the whole table.
    pub date_range: Option<DateRange>,
    pub txn_type: TypeFilter,
    pub channel: BTreeSet<String>,
    pub salesman: BTreeSet<String>,
    pub category: BTreeSet<String>,
    pub sub_category: BTreeSet<String>,
    pub part_no: BTreeSet<String>,
}

impl Criteria {
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_type(mut self, txn_type: TypeFilter) -> Self {
        self.txn_type = txn_type;
        self
    }

    pub fn with_values<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection_mut(dimension)
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn selection(&self, dimension: Dimension) -> &BTreeSet<String> {
        match dimension {
            Dimension::Channel => &self.channel,
            Dimension::Salesman => &self.salesman,
            Dimension::Category => &self.category,
            Dimension::SubCategory => &self.sub_category,
            Dimension::PartNo => &self.part_no,
        }
    }

    pub fn selection_mut(&mut self, dimension: Dimension) -> &mut BTreeSet<String> {
        match dimension {
            Dimension::Channel => &mut self.channel,
            Dimension::Salesman => &mut self.salesman,
            Dimension::Category => &mut self.category,
            Dimension::SubCategory => &mut self.sub_category,
            Dimension::PartNo => &mut self.part_no,
        }
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        if let Some(range) = &self.date_range
            && !range.contains(record.date)
        {
            return false;
        }
        if !self.txn_type.matches(&record.txn_type) {
            return false;
        }
        Dimension::ALL.into_iter().all(|dimension| {
            let selected = self.selection(dimension);
            selected.is_empty() || selected.contains(record.dimension(dimension))
        })
    }
}

/// Scope of the fast-moving SKU ranking. It is configured independently of
/// the global [`Criteria`] and always restricted to `SALE` rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkuCriteria {
    pub date_range: Option<DateRange>,
    pub category: BTreeSet<String>,
    pub sub_category: BTreeSet<String>,
    pub channel: BTreeSet<String>,
}

impl SkuCriteria {
    pub fn to_criteria(&self) -> Criteria {
        Criteria {
            date_range: self.date_range,
            txn_type: TypeFilter::Sale,
            channel: self.channel.clone(),
            category: self.category.clone(),
            sub_category: self.sub_category.clone(),
            ..Criteria::default()
        }
    }
}

/// Non-owning selection of rows from a [`SalesTable`].
#[derive(Debug, Clone, Default)]
pub struct FilteredTable<'a> {
    rows: Vec<&'a SalesRecord>,
}

impl<'a> FilteredTable<'a> {
    pub fn all(table: &'a SalesTable) -> Self {
        Self {
            rows: table.records().iter().collect(),
        }
    }

    pub fn rows(&self) -> &[&'a SalesRecord] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a SalesRecord> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn distinct(&self, dimension: Dimension) -> Vec<String> {
        distinct_values(self.iter(), dimension)
    }
}

pub fn apply<'a>(table: &'a SalesTable, criteria: &Criteria) -> FilteredTable<'a> {
    FilteredTable {
        rows: table
            .records()
            .iter()
            .filter(|record| criteria.matches(record))
            .collect(),
    }
}

use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Transaction type after upper-casing and trimming. Values outside
/// `SALE`/`RETURN` are kept verbatim so a `BOTH` view still counts them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TxnType {
    Sale,
    Return,
    Other(String),
}

impl TxnType {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_uppercase();
        match normalized.as_str() {
            "SALE" => TxnType::Sale,
            "RETURN" => TxnType::Return,
            _ => TxnType::Other(normalized),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TxnType::Sale => "SALE",
            TxnType::Return => "RETURN",
            TxnType::Other(label) => label,
        }
    }
}

impl From<String> for TxnType {
    fn from(value: String) -> Self {
        TxnType::parse(&value)
    }
}

impl From<TxnType> for String {
    fn from(value: TxnType) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];
const DAY_FIRST_SHORT_YEAR_FORMATS: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];
const DAY_FIRST_SHORT_YEAR_DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%y %H:%M:%S",
    "%d/%m/%y %H:%M",
    "%d-%m-%y %H:%M:%S",
    "%d-%m-%y %H:%M",
    "%d.%m.%y %H:%M:%S",
    "%d.%m.%y %H:%M",
];
const DAY_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parses a calendar date with day-first semantics (`DD/MM/YYYY`). ISO dates
/// and a trailing time of day are also accepted; the time is discarded.
pub fn parse_day_first_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let date_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);
    if has_short_year(date_part) {
        return DAY_FIRST_SHORT_YEAR_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
            .or_else(|| {
                DAY_FIRST_SHORT_YEAR_DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                    .map(|dt| dt.date())
            });
    }
    DAY_FIRST_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DAY_FIRST_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
}

// `%Y` happily reads "25" as year 25, so two-digit years are routed to `%y`.
fn has_short_year(value: &str) -> bool {
    let mut parts = value.split(['/', '-', '.']);
    let (Some(day), Some(month), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    day.len() <= 2
        && month.len() <= 2
        && year.len() == 2
        && year.bytes().all(|b| b.is_ascii_digit())
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Parses a numeric cell. Returns `None` for empty or unparseable input so the
/// caller decides the substitute.
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

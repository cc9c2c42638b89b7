//! Loading and normalizing a sales export.
//!
//! [`load`] is the single place that establishes the table's guarantees:
//!
//! - headers are trimmed and renamed through [`ColumnAliases`];
//! - `Type` is upper-cased and trimmed;
//! - `Value` and `Qty` are numeric, with unparseable cells replaced by zero;
//! - `RETURN` rows carry `Value = -abs(Value)`;
//! - every row has a valid day-first `Date` (rows without one are dropped);
//! - `Month` is the first day of the row's month.
//!
//! Everything downstream assumes these hold without re-checking.

use std::{
    collections::{BTreeMap, BTreeSet},
    io::Read,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    columns::{ColumnAliases, Dimension, Field},
    data::{TxnType, month_start, parse_day_first_date, parse_decimal},
    error::LoadError,
    io_utils,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub month: NaiveDate,
    pub txn_type: TxnType,
    pub value: Decimal,
    pub qty: Decimal,
    pub channel: String,
    pub salesman: String,
    pub category: String,
    pub sub_category: String,
    pub part_no: String,
    /// Columns outside the canonical set, keyed by their trimmed header.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl SalesRecord {
    pub fn dimension(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Channel => &self.channel,
            Dimension::Salesman => &self.salesman,
            Dimension::Category => &self.category,
            Dimension::SubCategory => &self.sub_category,
            Dimension::PartNo => &self.part_no,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Rows discarded because their `Date` could not be parsed.
    pub dropped_rows: usize,
    pub coerced_values: usize,
    pub coerced_quantities: usize,
    /// Optional canonical columns the export did not provide.
    pub missing_columns: Vec<Field>,
}

#[derive(Debug, Clone, Default)]
pub struct SalesTable {
    source: Option<PathBuf>,
    headers: Vec<String>,
    records: Vec<SalesRecord>,
    report: LoadReport,
}

impl SalesTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a table from already-normalized records.
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        let headers = Field::ALL.iter().map(|f| f.name().to_string()).collect();
        let report = LoadReport {
            rows_read: records.len(),
            rows_kept: records.len(),
            ..LoadReport::default()
        };
        Self {
            source: None,
            headers,
            records,
            report,
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest `Date`, the default range of every date filter.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    /// Sorted distinct non-empty values of `dimension`, used as filter options.
    pub fn distinct(&self, dimension: Dimension) -> Vec<String> {
        distinct_values(self.records.iter(), dimension)
    }
}

pub(crate) fn distinct_values<'a>(
    records: impl Iterator<Item = &'a SalesRecord>,
    dimension: Dimension,
) -> Vec<String> {
    records
        .map(|r| r.dimension(dimension))
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    pub aliases: ColumnAliases,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            aliases: ColumnAliases::default(),
        }
    }
}

/// Result of [`load_or_empty`]: a table plus the condition that emptied it, if any.
#[derive(Debug)]
pub struct LoadOutcome {
    pub table: SalesTable,
    pub warning: Option<LoadError>,
}

pub fn load(path: &Path, options: &LoadOptions) -> Result<SalesTable, LoadError> {
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    info!(
        "Loading '{}' with delimiter '{}'",
        path.display(),
        io_utils::printable_delimiter(delimiter)
    );
    let reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let mut table = normalize(reader, path, options)?;
    table.source = Some(path.to_path_buf());
    Ok(table)
}

/// Like [`load`], but a missing source yields an empty table and the
/// `SourceNotFound` condition instead of an error.
pub fn load_or_empty(path: &Path, options: &LoadOptions) -> Result<LoadOutcome, LoadError> {
    match load(path, options) {
        Ok(table) => Ok(LoadOutcome {
            table,
            warning: None,
        }),
        Err(err) if err.is_source_not_found() => {
            debug!("{err}; continuing with an empty table");
            Ok(LoadOutcome {
                table: SalesTable::empty(),
                warning: Some(err),
            })
        }
        Err(err) => Err(err),
    }
}

/// Normalizes CSV content from any reader. `label` names the source in errors.
pub fn load_from_reader<R: Read>(
    reader: R,
    label: &Path,
    options: &LoadOptions,
) -> Result<SalesTable, LoadError> {
    let delimiter = io_utils::resolve_input_delimiter(label, options.delimiter);
    normalize(io_utils::open_csv_reader(reader, delimiter), label, options)
}

struct ColumnLayout {
    positions: BTreeMap<Field, usize>,
    extras: Vec<(usize, String)>,
}

impl ColumnLayout {
    fn resolve(headers: &[String], aliases: &ColumnAliases) -> Self {
        let mut positions = BTreeMap::new();
        let mut extras = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            match aliases.resolve(header) {
                Some(field) if !positions.contains_key(&field) => {
                    positions.insert(field, idx);
                }
                Some(field) => {
                    warn!("Ignoring duplicate '{field}' column at position {}", idx + 1);
                }
                None => extras.push((idx, header.trim().to_string())),
            }
        }
        Self { positions, extras }
    }

    fn cell<'a>(&self, row: &'a [String], field: Field) -> &'a str {
        self.positions
            .get(&field)
            .and_then(|idx| row.get(*idx))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

fn normalize<R: Read>(
    mut reader: csv::Reader<R>,
    path: &Path,
    options: &LoadOptions,
) -> Result<SalesTable, LoadError> {
    let encoding = options.encoding;
    let raw_headers = reader
        .byte_headers()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            row: 1,
            source,
        })?
        .clone();
    let raw_headers =
        io_utils::decode_record(&raw_headers, encoding).ok_or_else(|| LoadError::Decode {
            path: path.to_path_buf(),
            row: 1,
            encoding: encoding.name(),
        })?;
    let layout = ColumnLayout::resolve(&raw_headers, &options.aliases);

    if let Some(field) = Field::ALL
        .into_iter()
        .find(|f| f.is_required() && !layout.positions.contains_key(f))
    {
        return Err(LoadError::MissingColumn(field.name(), path.to_path_buf()));
    }
    let mut report = LoadReport {
        missing_columns: Field::ALL
            .into_iter()
            .filter(|f| !layout.positions.contains_key(f))
            .collect(),
        ..LoadReport::default()
    };
    if !report.missing_columns.is_empty() {
        warn!(
            "Columns {:?} not found in '{}'; using empty values",
            report
                .missing_columns
                .iter()
                .map(|f| f.name())
                .collect::<Vec<_>>(),
            path.display()
        );
    }

    let headers = raw_headers
        .iter()
        .map(|h| options.aliases.normalize_header(h))
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let row_number = row_idx + 2;
        let record = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            row: row_number,
            source,
        })?;
        let decoded =
            io_utils::decode_record(&record, encoding).ok_or_else(|| LoadError::Decode {
                path: path.to_path_buf(),
                row: row_number,
                encoding: encoding.name(),
            })?;
        report.rows_read += 1;
        match normalize_row(&layout, &decoded, &mut report) {
            Some(normalized) => records.push(normalized),
            None => debug!("Dropping row {row_number}: unparseable date"),
        }
    }
    report.rows_kept = records.len();

    if report.dropped_rows > 0 {
        warn!(
            "Dropped {} row(s) with unparseable dates from '{}'",
            report.dropped_rows,
            path.display()
        );
    }
    info!(
        "Loaded {} of {} row(s) from '{}'",
        report.rows_kept,
        report.rows_read,
        path.display()
    );

    Ok(SalesTable {
        source: None,
        headers,
        records,
        report,
    })
}

fn normalize_row(
    layout: &ColumnLayout,
    row: &[String],
    report: &mut LoadReport,
) -> Option<SalesRecord> {
    let Some(date) = parse_day_first_date(layout.cell(row, Field::Date)) else {
        report.dropped_rows += 1;
        return None;
    };
    let txn_type = TxnType::parse(layout.cell(row, Field::Type));

    let raw_value = layout.cell(row, Field::Value);
    let mut value = parse_decimal(raw_value).unwrap_or_else(|| {
        if !raw_value.trim().is_empty() {
            report.coerced_values += 1;
        }
        Decimal::ZERO
    });
    if txn_type == TxnType::Return {
        value = -value.abs();
    }

    let raw_qty = layout.cell(row, Field::Qty);
    let qty = parse_decimal(raw_qty).unwrap_or_else(|| {
        if !raw_qty.trim().is_empty() {
            report.coerced_quantities += 1;
        }
        Decimal::ZERO
    });

    let extra = layout
        .extras
        .iter()
        .map(|(idx, name)| (name.clone(), row.get(*idx).cloned().unwrap_or_default()))
        .collect();

    Some(SalesRecord {
        date,
        month: month_start(date),
        txn_type,
        value,
        qty,
        channel: layout.cell(row, Field::Channel).to_string(),
        salesman: layout.cell(row, Field::Salesman).to_string(),
        category: layout.cell(row, Field::Category).to_string(),
        sub_category: layout.cell(row, Field::SubCategory).to_string(),
        part_no: layout.cell(row, Field::PartNo).to_string(),
        extra,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(contents: &str) -> SalesTable {
        load_from_reader(
            contents.as_bytes(),
            Path::new("inline.csv"),
            &LoadOptions::default(),
        )
        .expect("load inline csv")
    }

    fn dec(value: &str) -> Decimal {
        value.parse().expect("decimal literal")
    }

    #[test]
    fn renames_aliased_headers_and_keeps_unknown_columns() {
        let table = load_str(
            " CHANNEL ,Sales Executive,Category,Sub Category,Part Number,Type,Amount,Qty,Date,Region\n\
             Retail,Asha,Tyres,Radial,P-1,sale,100,5,01/03/2025,North\n",
        );
        assert_eq!(
            table.headers(),
            &[
                "Channel",
                "Salesman",
                "Category",
                "SubCategory",
                "PartNo",
                "Type",
                "Value",
                "Qty",
                "Date",
                "Region"
            ]
        );
        let row = &table.records()[0];
        assert_eq!(row.channel, "Retail");
        assert_eq!(row.salesman, "Asha");
        assert_eq!(row.sub_category, "Radial");
        assert_eq!(row.part_no, "P-1");
        assert_eq!(row.txn_type, TxnType::Sale);
        assert_eq!(row.extra.get("Region").map(String::as_str), Some("North"));
        assert!(table.report().missing_columns.is_empty());
    }

    #[test]
    fn returns_are_forced_negative() {
        let table = load_str(
            "Date,Type,Value,Qty\n\
             01/03/2025,RETURN,20,1\n\
             02/03/2025, return ,-35.5,1\n\
             03/03/2025,SALE,-7,1\n",
        );
        let values = table.records().iter().map(|r| r.value).collect::<Vec<_>>();
        assert_eq!(values, vec![dec("-20"), dec("-35.5"), dec("-7")]);
    }

    #[test]
    fn unparseable_numbers_become_zero() {
        let table = load_str(
            "Date,Type,Value,Qty\n\
             01/03/2025,SALE,abc,\n\
             01/03/2025,SALE,,x\n",
        );
        assert!(table.records().iter().all(|r| r.value.is_zero()));
        assert!(table.records().iter().all(|r| r.qty.is_zero()));
        assert_eq!(table.report().coerced_values, 1);
        assert_eq!(table.report().coerced_quantities, 1);
    }

    #[test]
    fn invalid_dates_are_dropped_and_counted() {
        let table = load_str(
            "Date,Type,Value,Qty\n\
             01/03/2025,SALE,1,1\n\
             32/13/2025,SALE,1,1\n\
             ,SALE,1,1\n",
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.report().rows_read, 3);
        assert_eq!(table.report().dropped_rows, 2);
    }

    #[test]
    fn month_is_first_of_month() {
        let table = load_str("Date,Type,Value\n17/11/2024,SALE,1\n");
        let row = &table.records()[0];
        assert_eq!(row.month, NaiveDate::from_ymd_opt(2024, 11, 1).unwrap());
        assert!(row.month <= row.date);
    }

    #[test]
    fn missing_optional_columns_default_to_empty() {
        let table = load_str("Date,Type,Value\n01/03/2025,SALE,10\n");
        let row = &table.records()[0];
        assert!(row.qty.is_zero());
        assert_eq!(row.channel, "");
        assert!(table.report().missing_columns.contains(&Field::Qty));
        assert!(table.report().missing_columns.contains(&Field::PartNo));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = load_from_reader(
            "Date,Value\n01/03/2025,10\n".as_bytes(),
            Path::new("inline.csv"),
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("Type", _)));
    }

    #[test]
    fn date_bounds_and_distinct_values() {
        let table = load_str(
            "Date,Type,Value,Channel\n\
             05/01/2025,SALE,1,Online\n\
             01/01/2025,SALE,1,Retail\n\
             09/02/2025,SALE,1,Online\n\
             10/02/2025,SALE,1,\n",
        );
        assert_eq!(
            table.date_bounds(),
            Some((
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 2, 10).unwrap()
            ))
        );
        assert_eq!(table.distinct(Dimension::Channel), vec!["Online", "Retail"]);
        assert_eq!(SalesTable::empty().date_bounds(), None);
    }

    #[test]
    fn load_or_empty_recovers_from_missing_source() {
        let outcome = load_or_empty(
            Path::new("no/such/dir/RawData.csv"),
            &LoadOptions::default(),
        )
        .expect("missing source is recoverable");
        assert!(outcome.table.is_empty());
        assert!(
            outcome
                .warning
                .as_ref()
                .is_some_and(LoadError::is_source_not_found)
        );
    }
}

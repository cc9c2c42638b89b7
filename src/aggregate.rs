//! Grouped sums and rankings over a filtered view.
//!
//! Every function here is pure and total: an empty view produces zero totals
//! or an empty result, never an error. Sums saturate at the `Decimal` bounds
//! instead of overflowing.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    columns::Dimension,
    data::TxnType,
    filter::FilteredTable,
};

pub const DEFAULT_TOP_SKUS: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub net_revenue: Decimal,
    pub sale_value: Decimal,
    /// Never positive, since returns are stored negated.
    pub return_value: Decimal,
    pub sale_volume: Decimal,
}

fn accumulate(total: &mut Decimal, amount: Decimal) {
    *total = total.saturating_add(amount);
}

pub fn kpis(view: &FilteredTable<'_>) -> Kpis {
    view.iter().fold(Kpis::default(), |mut acc, record| {
        accumulate(&mut acc.net_revenue, record.value);
        match record.txn_type {
            TxnType::Sale => {
                accumulate(&mut acc.sale_value, record.value);
                accumulate(&mut acc.sale_volume, record.qty);
            }
            TxnType::Return => accumulate(&mut acc.return_value, record.value),
            TxnType::Other(_) => {}
        }
        acc
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareSlice {
    pub key: String,
    pub magnitude: Decimal,
    /// Percentage of [`Share::total`], rounded to two places.
    pub percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Share {
    pub dimension: Dimension,
    pub total: Decimal,
    pub slices: Vec<ShareSlice>,
}

impl Share {
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Magnitude of activity per group: the sum of `abs(Value)` of its rows, so
/// returns add to a group's share rather than cancelling sales.
pub fn share_by(view: &FilteredTable<'_>, dimension: Dimension) -> Share {
    let mut groups: BTreeMap<&str, Decimal> = BTreeMap::new();
    for record in view.iter() {
        accumulate(
            groups.entry(record.dimension(dimension)).or_default(),
            record.value.abs(),
        );
    }
    let total = groups
        .values()
        .fold(Decimal::ZERO, |total, magnitude| total.saturating_add(*magnitude));
    let slices = groups
        .into_iter()
        .map(|(key, magnitude)| ShareSlice {
            key: key.to_string(),
            magnitude,
            percent: percent_of(magnitude, total),
        })
        .collect();
    Share {
        dimension,
        total,
        slices,
    }
}

// Dividing first keeps the intermediate at most 1, so large magnitudes cannot
// overflow the multiplication.
fn percent_of(part: Decimal, total: Decimal) -> Decimal {
    part.checked_div(total)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|percent| percent.round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub month: NaiveDate,
    pub txn_type: TxnType,
    pub value: Decimal,
}

/// Signed `Value` per (month, type), ascending by month. Months without rows
/// are absent rather than zero-filled.
pub fn monthly_trend(view: &FilteredTable<'_>) -> Vec<TrendPoint> {
    let mut groups: BTreeMap<(NaiveDate, &TxnType), Decimal> = BTreeMap::new();
    for record in view.iter() {
        accumulate(
            groups.entry((record.month, &record.txn_type)).or_default(),
            record.value,
        );
    }
    groups
        .into_iter()
        .map(|((month, txn_type), value)| TrendPoint {
            month,
            txn_type: txn_type.clone(),
            value,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesmanTotal {
    pub salesman: String,
    pub value: Decimal,
}

/// Net `Value` per salesman, ascending so a horizontal bar chart puts the top
/// performer last. Equal totals are ordered by name.
pub fn salesman_performance(view: &FilteredTable<'_>) -> Vec<SalesmanTotal> {
    let mut groups: HashMap<&str, Decimal> = HashMap::new();
    for record in view.iter() {
        accumulate(
            groups.entry(record.salesman.as_str()).or_default(),
            record.value,
        );
    }
    groups
        .into_iter()
        .sorted_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(salesman, value)| SalesmanTotal {
            salesman: salesman.to_string(),
            value,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkuRank {
    pub part_no: String,
    pub category: String,
    pub sub_category: String,
    pub qty: Decimal,
}

/// Units sold per (PartNo, Category, SubCategory), highest first, keeping at
/// most `limit` rows (`0` keeps all). Ties are broken by PartNo, Category and
/// SubCategory ascending, so the cut at `limit` is deterministic.
pub fn fast_moving_skus(view: &FilteredTable<'_>, limit: usize) -> Vec<SkuRank> {
    let mut groups: BTreeMap<(&str, &str, &str), Decimal> = BTreeMap::new();
    for record in view.iter().filter(|r| r.txn_type == TxnType::Sale) {
        let key = (
            record.part_no.as_str(),
            record.category.as_str(),
            record.sub_category.as_str(),
        );
        accumulate(groups.entry(key).or_default(), record.qty);
    }
    // Stable sort over key-ordered input keeps the ascending key tie-break.
    let mut ranked = groups.into_iter().collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    if limit > 0 {
        ranked.truncate(limit);
    }
    ranked
        .into_iter()
        .map(|((part_no, category, sub_category), qty)| SkuRank {
            part_no: part_no.to_string(),
            category: category.to_string(),
            sub_category: sub_category.to_string(),
            qty,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filter::{self, Criteria},
        loader::{SalesRecord, SalesTable},
    };

    fn dec(value: &str) -> Decimal {
        value.parse().expect("decimal literal")
    }

    fn record(date: &str, txn_type: TxnType, value: &str, qty: &str) -> SalesRecord {
        let date = crate::data::parse_day_first_date(date).expect("valid date");
        SalesRecord {
            date,
            month: crate::data::month_start(date),
            txn_type,
            value: dec(value),
            qty: dec(qty),
            channel: "Retail".to_string(),
            salesman: "Asha".to_string(),
            category: "A".to_string(),
            sub_category: "S".to_string(),
            part_no: "P-1".to_string(),
            extra: Default::default(),
        }
    }

    fn scenario() -> SalesTable {
        SalesTable::from_records(vec![
            record("01/03/2025", TxnType::Sale, "100", "5"),
            record("02/03/2025", TxnType::Return, "-20", "1"),
        ])
    }

    #[test]
    fn kpis_split_sales_and_returns() {
        let table = scenario();
        let view = filter::apply(&table, &Criteria::default());
        let totals = kpis(&view);
        assert_eq!(totals.net_revenue, dec("80"));
        assert_eq!(totals.sale_value, dec("100"));
        assert_eq!(totals.return_value, dec("-20"));
        assert_eq!(totals.sale_volume, dec("5"));
    }

    #[test]
    fn kpis_of_empty_view_are_zero() {
        let table = SalesTable::empty();
        let view = filter::apply(&table, &Criteria::default());
        assert_eq!(kpis(&view), Kpis::default());
        assert!(monthly_trend(&view).is_empty());
        assert!(salesman_performance(&view).is_empty());
        assert!(fast_moving_skus(&view, 10).is_empty());
        assert!(share_by(&view, Dimension::Category).is_empty());
    }

    #[test]
    fn share_uses_absolute_values() {
        let table = scenario();
        let view = filter::apply(&table, &Criteria::default());
        let share = share_by(&view, Dimension::Category);
        assert_eq!(share.total, dec("120"));
        assert_eq!(share.slices.len(), 1);
        assert_eq!(share.slices[0].key, "A");
        assert_eq!(share.slices[0].magnitude, dec("120"));
        assert_eq!(share.slices[0].percent, dec("100"));
    }

    #[test]
    fn trend_keeps_sign_and_orders_by_month() {
        let table = SalesTable::from_records(vec![
            record("15/04/2025", TxnType::Sale, "40", "1"),
            record("01/03/2025", TxnType::Sale, "100", "5"),
            record("20/03/2025", TxnType::Return, "-20", "1"),
            record("21/03/2025", TxnType::Sale, "10", "1"),
        ]);
        let view = filter::apply(&table, &Criteria::default());
        let trend = monthly_trend(&view);
        let flattened = trend
            .iter()
            .map(|p| (p.month.to_string(), p.txn_type.label().to_string(), p.value))
            .collect::<Vec<_>>();
        assert_eq!(
            flattened,
            vec![
                ("2025-03-01".to_string(), "SALE".to_string(), dec("110")),
                ("2025-03-01".to_string(), "RETURN".to_string(), dec("-20")),
                ("2025-04-01".to_string(), "SALE".to_string(), dec("40")),
            ]
        );
    }

    #[test]
    fn salesman_performance_is_ascending() {
        let mut rows = vec![
            record("01/03/2025", TxnType::Sale, "50", "1"),
            record("01/03/2025", TxnType::Sale, "300", "1"),
            record("01/03/2025", TxnType::Sale, "10", "1"),
        ];
        rows[0].salesman = "Bilal".to_string();
        rows[1].salesman = "Chen".to_string();
        rows[2].salesman = "Asha".to_string();
        let table = SalesTable::from_records(rows);
        let view = filter::apply(&table, &Criteria::default());
        let names = salesman_performance(&view)
            .into_iter()
            .map(|s| s.salesman)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Asha", "Bilal", "Chen"]);
    }

    #[test]
    fn fast_moving_skus_rank_sale_quantity_with_deterministic_ties() {
        let mut rows = Vec::new();
        for (part, qty) in [("P-3", "5"), ("P-1", "4"), ("P-2", "9"), ("P-1", "1")] {
            let mut row = record("01/03/2025", TxnType::Sale, "1", qty);
            row.part_no = part.to_string();
            rows.push(row);
        }
        let mut returned = record("01/03/2025", TxnType::Return, "-1", "50");
        returned.part_no = "P-9".to_string();
        rows.push(returned);
        let table = SalesTable::from_records(rows);
        let view = filter::apply(&table, &Criteria::default());

        let ranked = fast_moving_skus(&view, 2);
        let parts = ranked
            .iter()
            .map(|r| (r.part_no.as_str(), r.qty))
            .collect::<Vec<_>>();
        assert_eq!(parts, vec![("P-2", dec("9")), ("P-1", dec("5"))]);

        let all = fast_moving_skus(&view, 0);
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].part_no, "P-3");
    }

    #[test]
    fn extreme_amounts_saturate_instead_of_overflowing() {
        let table = SalesTable::from_records(vec![record(
            "01/03/2025",
            TxnType::Sale,
            "1000000000000000000000000000",
            "1",
        )]);
        let view = filter::apply(&table, &Criteria::default());
        let share = share_by(&view, Dimension::Category);
        assert_eq!(share.slices[0].percent, dec("100"));

        let table = SalesTable::from_records(vec![
            record("01/03/2025", TxnType::Sale, "50000000000000000000000000000", "1"),
            record("02/03/2025", TxnType::Sale, "50000000000000000000000000000", "1"),
        ]);
        let view = filter::apply(&table, &Criteria::default());
        let totals = kpis(&view);
        assert_eq!(totals.net_revenue, Decimal::MAX);
        assert_eq!(totals.sale_value, Decimal::MAX);
        assert_eq!(share_by(&view, Dimension::Channel).total, Decimal::MAX);
        assert_eq!(monthly_trend(&view)[0].value, Decimal::MAX);
        assert_eq!(salesman_performance(&view)[0].value, Decimal::MAX);
    }
}

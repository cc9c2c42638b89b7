//! Text and JSON rendering of a [`DashboardView`].

use std::fmt::Write as _;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::{
    aggregate::Share,
    columns::Dimension,
    dashboard::DashboardView,
    loader::SalesTable,
    table::{Align, render_aligned},
};

pub const NO_DATA: &str = "No data for selected filters";
const BLANK: &str = "(blank)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Summary,
    Share,
    Trend,
    Salesmen,
    FastSku,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Summary,
        Section::Share,
        Section::Trend,
        Section::Salesmen,
        Section::FastSku,
    ];
}

/// `1234.5` → `1,234.50`.
pub fn format_amount(value: Decimal) -> String {
    group_thousands(&format!("{:.2}", value.round_dp(2)))
}

pub fn format_currency(currency: &str, value: Decimal) -> String {
    format!("{currency} {}", format_amount(value))
}

/// Whole units with thousands separators.
pub fn format_volume(value: Decimal) -> String {
    group_thousands(&format!("{:.0}", value.round_dp(0)))
}

fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };
    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, digit) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if grouped.chars().all(|c| c == '0' || c == ',')
        && fraction.is_none_or(|f| f.chars().all(|c| c == '0'))
    {
        ""
    } else {
        sign
    };
    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}

fn label(key: &str) -> String {
    if key.is_empty() {
        BLANK.to_string()
    } else {
        key.to_string()
    }
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn render_text(view: &DashboardView, sections: &[Section], currency: &str) -> String {
    let mut output = String::new();
    for (idx, section) in sections.iter().enumerate() {
        if idx > 0 {
            output.push('\n');
        }
        match section {
            Section::Summary => render_summary(&mut output, view, currency),
            Section::Share => {
                render_share(&mut output, "Category Share", &view.category_share);
                output.push('\n');
                render_share(&mut output, "Channel Share", &view.channel_share);
            }
            Section::Trend => render_trend(&mut output, view),
            Section::Salesmen => render_salesmen(&mut output, view),
            Section::FastSku => render_fast_sku(&mut output, view),
        }
    }
    output
}

fn render_summary(output: &mut String, view: &DashboardView, currency: &str) {
    let _ = writeln!(output, "Summary ({} row(s))", view.rows);
    let kpis = &view.kpis;
    let rows = vec![
        vec![
            "Net Revenue".to_string(),
            format_currency(currency, kpis.net_revenue),
        ],
        vec![
            "Sale Value".to_string(),
            format_currency(currency, kpis.sale_value),
        ],
        vec![
            "Return Value".to_string(),
            format_currency(currency, kpis.return_value),
        ],
        vec!["Sale Volume".to_string(), format_volume(kpis.sale_volume)],
    ];
    output.push_str(&render_aligned(
        &headers(&["metric", "value"]),
        &rows,
        &[Align::Left, Align::Right],
    ));
}

fn render_share(output: &mut String, title: &str, share: &Share) {
    let _ = writeln!(output, "{title}");
    if share.is_empty() {
        let _ = writeln!(output, "{NO_DATA}");
        return;
    }
    let rows = share
        .slices
        .iter()
        .map(|slice| {
            vec![
                label(&slice.key),
                format_amount(slice.magnitude),
                format!("{:.2}%", slice.percent),
            ]
        })
        .collect::<Vec<_>>();
    let key_header = match share.dimension {
        Dimension::Category => "category",
        Dimension::Channel => "channel",
        Dimension::Salesman => "salesman",
        Dimension::SubCategory => "sub category",
        Dimension::PartNo => "part no",
    };
    output.push_str(&render_aligned(
        &headers(&[key_header, "magnitude", "share"]),
        &rows,
        &[Align::Left, Align::Right, Align::Right],
    ));
}

fn render_trend(output: &mut String, view: &DashboardView) {
    let _ = writeln!(output, "Monthly Trend");
    if view.monthly_trend.is_empty() {
        let _ = writeln!(output, "{NO_DATA}");
        return;
    }
    let rows = view
        .monthly_trend
        .iter()
        .map(|point| {
            vec![
                point.month.format("%Y-%m").to_string(),
                label(point.txn_type.label()),
                format_amount(point.value),
            ]
        })
        .collect::<Vec<_>>();
    output.push_str(&render_aligned(
        &headers(&["month", "type", "value"]),
        &rows,
        &[Align::Left, Align::Left, Align::Right],
    ));
}

fn render_salesmen(output: &mut String, view: &DashboardView) {
    let _ = writeln!(output, "Sales Executive Performance");
    if view.salesman_performance.is_empty() {
        let _ = writeln!(output, "{NO_DATA}");
        return;
    }
    let rows = view
        .salesman_performance
        .iter()
        .map(|s| vec![label(&s.salesman), format_amount(s.value)])
        .collect::<Vec<_>>();
    output.push_str(&render_aligned(
        &headers(&["salesman", "value"]),
        &rows,
        &[Align::Left, Align::Right],
    ));
}

fn render_fast_sku(output: &mut String, view: &DashboardView) {
    let _ = writeln!(output, "Fast Moving SKU");
    if view.fast_moving_skus.is_empty() {
        let _ = writeln!(output, "{NO_DATA}");
        return;
    }
    let rows = view
        .fast_moving_skus
        .iter()
        .enumerate()
        .map(|(idx, sku)| {
            vec![
                (idx + 1).to_string(),
                label(&sku.part_no),
                label(&sku.category),
                label(&sku.sub_category),
                format_volume(sku.qty),
            ]
        })
        .collect::<Vec<_>>();
    output.push_str(&render_aligned(
        &headers(&["#", "part no", "category", "sub category", "qty"]),
        &rows,
        &[Align::Right, Align::Left, Align::Left, Align::Left, Align::Right],
    ));
}

/// JSON object holding the requested sections, keyed by section name.
pub fn render_json(view: &DashboardView, sections: &[Section]) -> serde_json::Result<String> {
    let mut object = Map::new();
    object.insert("rows".to_string(), JsonValue::from(view.rows));
    for section in sections {
        match section {
            Section::Summary => {
                object.insert("summary".to_string(), serde_json::to_value(view.kpis)?);
            }
            Section::Share => {
                object.insert(
                    "category_share".to_string(),
                    serde_json::to_value(&view.category_share)?,
                );
                object.insert(
                    "channel_share".to_string(),
                    serde_json::to_value(&view.channel_share)?,
                );
            }
            Section::Trend => {
                object.insert(
                    "monthly_trend".to_string(),
                    serde_json::to_value(&view.monthly_trend)?,
                );
            }
            Section::Salesmen => {
                object.insert(
                    "salesman_performance".to_string(),
                    serde_json::to_value(&view.salesman_performance)?,
                );
            }
            Section::FastSku => {
                object.insert(
                    "fast_moving_skus".to_string(),
                    serde_json::to_value(&view.fast_moving_skus)?,
                );
            }
        }
    }
    serde_json::to_string_pretty(&JsonValue::Object(object))
}

/// Distinct filter values per dimension, one table row per value.
pub fn render_options(table: &SalesTable) -> String {
    if table.is_empty() {
        return format!("{NO_DATA}\n");
    }
    let mut rows = Vec::new();
    for dimension in Dimension::ALL {
        for value in table.distinct(dimension) {
            rows.push(vec![dimension.name().to_string(), value]);
        }
    }
    if let Some((start, end)) = table.date_bounds() {
        rows.push(vec!["Date".to_string(), format!("{start} .. {end}")]);
    }
    render_aligned(&headers(&["column", "value"]), &rows, &[])
}

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{data::parse_day_first_date, filter::TypeFilter, io_utils::parse_delimiter};

#[derive(Debug, Parser)]
#[command(author, version, about = "Filter a sales export and report KPIs, trends and rankings", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render every dashboard section
    Report(ViewArgs),
    /// Net revenue, sale value, return value and sale volume
    Summary(ViewArgs),
    /// Category and channel share of absolute transaction value
    Share(ViewArgs),
    /// Signed value per month and transaction type
    Trend(ViewArgs),
    /// Net value per sales executive, ascending
    Salesmen(ViewArgs),
    /// Top SKUs by units sold within the SKU scope
    FastSku(ViewArgs),
    /// List the distinct values available to each filter
    Options(OptionsArgs),
    /// Interactive session reading filter commands from stdin
    Explore(ExploreArgs),
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Sales export to read (defaults to the configured source, then RawData.csv)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// YAML configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Currency label for amounts (defaults to OMR)
    #[arg(long)]
    pub currency: Option<String>,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// First date to include, DD/MM/YYYY (defaults to the earliest date)
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,
    /// Last date to include, DD/MM/YYYY (defaults to the latest date)
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,
    /// Transaction type: both, sale or return
    #[arg(long = "type", default_value = "both", value_parser = parse_type_filter)]
    pub txn_type: TypeFilter,
    /// Channels to include (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',', action = clap::ArgAction::Append)]
    pub channel: Vec<String>,
    /// Sales executives to include
    #[arg(long, value_delimiter = ',', action = clap::ArgAction::Append)]
    pub salesman: Vec<String>,
    /// Categories to include
    #[arg(long, value_delimiter = ',', action = clap::ArgAction::Append)]
    pub category: Vec<String>,
    /// Sub-categories to include
    #[arg(long = "sub-category", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub sub_category: Vec<String>,
    /// Part numbers to include
    #[arg(long = "part-no", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub part_no: Vec<String>,
}

#[derive(Debug, Args)]
pub struct SkuArgs {
    /// First date of the fast-moving SKU window
    #[arg(long = "sku-start", value_parser = parse_date)]
    pub sku_start: Option<NaiveDate>,
    /// Last date of the fast-moving SKU window
    #[arg(long = "sku-end", value_parser = parse_date)]
    pub sku_end: Option<NaiveDate>,
    /// Categories for the fast-moving SKU ranking
    #[arg(long = "sku-category", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub sku_category: Vec<String>,
    /// Sub-categories for the fast-moving SKU ranking
    #[arg(long = "sku-sub-category", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub sku_sub_category: Vec<String>,
    /// Channels for the fast-moving SKU ranking
    #[arg(long = "sku-channel", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub sku_channel: Vec<String>,
    /// Number of SKUs to list (0 = all, defaults to 10)
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    #[command(flatten)]
    pub sku: SkuArgs,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ExploreArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Number of SKUs to list (0 = all, defaults to 10)
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    parse_day_first_date(value).ok_or_else(|| format!("'{value}' is not a DD/MM/YYYY date"))
}

pub fn parse_type_filter(value: &str) -> Result<TypeFilter, String> {
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_view_arguments() {
        let cli = Cli::try_parse_from([
            "sales-dashboard",
            "report",
            "-i",
            "sales.csv",
            "--start",
            "01/03/2025",
            "--type",
            "sale",
            "--channel",
            "Retail,Online",
            "--channel",
            "Wholesale",
            "--sku-category",
            "Tyres",
            "--top",
            "5",
            "--format",
            "json",
        ])
        .expect("parse cli");
        let Commands::Report(args) = cli.command else {
            panic!("expected report command");
        };
        assert_eq!(args.source.input, Some(PathBuf::from("sales.csv")));
        assert_eq!(args.filters.start, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(args.filters.txn_type, TypeFilter::Sale);
        assert_eq!(args.filters.channel, vec!["Retail", "Online", "Wholesale"]);
        assert_eq!(args.sku.sku_category, vec!["Tyres"]);
        assert_eq!(args.sku.top, Some(5));
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn rejects_invalid_dates_and_types() {
        assert!(Cli::try_parse_from(["sales-dashboard", "summary", "--start", "32/13/2025"]).is_err());
        assert!(Cli::try_parse_from(["sales-dashboard", "summary", "--type", "refund"]).is_err());
    }
}

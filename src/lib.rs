pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod columns;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod filter;
pub mod io_utils;
pub mod loader;
pub mod report;
pub mod session;
pub mod table;

use std::{
    collections::BTreeMap,
    env,
    io::{self, Write},
    path::PathBuf,
    sync::OnceLock,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, error, info};

use crate::{
    cli::{Cli, Commands, ExploreArgs, FilterArgs, OptionsArgs, OutputFormat, SkuArgs, SourceArgs, ViewArgs},
    columns::Dimension,
    config::DashboardConfig,
    dashboard::DashboardRequest,
    filter::{Criteria, DateRange, SkuCriteria},
    loader::{LoadOptions, SalesTable},
    report::Section,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sales_dashboard", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Report(args) => handle_view(&args, &Section::ALL),
        Commands::Summary(args) => handle_view(&args, &[Section::Summary]),
        Commands::Share(args) => handle_view(&args, &[Section::Share]),
        Commands::Trend(args) => handle_view(&args, &[Section::Trend]),
        Commands::Salesmen(args) => handle_view(&args, &[Section::Salesmen]),
        Commands::FastSku(args) => handle_view(&args, &[Section::FastSku]),
        Commands::Options(args) => handle_options(&args),
        Commands::Explore(args) => handle_explore(&args),
    }
}

/// Configuration, input path and loader options resolved from the command line.
struct SourceContext {
    config: DashboardConfig,
    input: PathBuf,
    options: LoadOptions,
    currency: String,
}

impl SourceContext {
    fn resolve(args: &SourceArgs) -> Result<Self> {
        let config = match &args.config {
            Some(path) => DashboardConfig::load(path)
                .with_context(|| format!("Loading configuration from {path:?}"))?,
            None => DashboardConfig::default(),
        };
        let input = args
            .input
            .clone()
            .unwrap_or_else(|| config.source().to_path_buf());
        let options = config
            .load_options(args.delimiter, args.input_encoding.as_deref())
            .context("Resolving loader options")?;
        let currency = args
            .currency
            .clone()
            .unwrap_or_else(|| config.currency().to_string());
        Ok(Self {
            config,
            input,
            options,
            currency,
        })
    }

    /// Loads the table, turning a missing source into an empty table plus an
    /// error-level log line.
    fn load(&self) -> Result<SalesTable> {
        let outcome = loader::load_or_empty(&self.input, &self.options)
            .with_context(|| format!("Loading sales data from {:?}", self.input))?;
        if let Some(warning) = &outcome.warning {
            error!("{warning}; showing an empty dashboard");
        }
        Ok(outcome.table)
    }
}

fn build_request(
    filters: &FilterArgs,
    sku: &SkuArgs,
    top: usize,
    table: &SalesTable,
) -> DashboardRequest {
    let criteria = Criteria {
        date_range: DateRange::resolve(filters.start, filters.end, table),
        txn_type: filters.txn_type,
        ..Criteria::default()
    }
    .with_values(Dimension::Channel, filters.channel.iter().cloned())
    .with_values(Dimension::Salesman, filters.salesman.iter().cloned())
    .with_values(Dimension::Category, filters.category.iter().cloned())
    .with_values(Dimension::SubCategory, filters.sub_category.iter().cloned())
    .with_values(Dimension::PartNo, filters.part_no.iter().cloned());
    let sku = SkuCriteria {
        date_range: DateRange::resolve(sku.sku_start, sku.sku_end, table),
        category: sku.sku_category.iter().cloned().collect(),
        sub_category: sku.sku_sub_category.iter().cloned().collect(),
        channel: sku.sku_channel.iter().cloned().collect(),
    };
    DashboardRequest { criteria, sku, top }
}

fn handle_view(args: &ViewArgs, sections: &[Section]) -> Result<()> {
    let context = SourceContext::resolve(&args.source)?;
    let table = context.load()?;
    let top = args.sku.top.unwrap_or_else(|| context.config.top());
    let request = build_request(&args.filters, &args.sku, top, &table);
    debug!("Dashboard request: {request:?}");
    let view = dashboard::compute(&table, &request);
    info!("Computed dashboard over {} of {} row(s)", view.rows, table.len());
    let rendered = match args.format {
        OutputFormat::Table => report::render_text(&view, sections, &context.currency),
        OutputFormat::Json => {
            let mut json = report::render_json(&view, sections).context("Serializing report")?;
            json.push('\n');
            json
        }
    };
    write_stdout(&rendered)
}

fn handle_options(args: &OptionsArgs) -> Result<()> {
    let context = SourceContext::resolve(&args.source)?;
    let table = context.load()?;
    let rendered = match args.format {
        OutputFormat::Table => report::render_options(&table),
        OutputFormat::Json => {
            let options = Dimension::ALL
                .into_iter()
                .map(|d| (d.name(), table.distinct(d)))
                .collect::<BTreeMap<_, _>>();
            let mut json =
                serde_json::to_string_pretty(&options).context("Serializing filter options")?;
            json.push('\n');
            json
        }
    };
    write_stdout(&rendered)
}

fn handle_explore(args: &ExploreArgs) -> Result<()> {
    let context = SourceContext::resolve(&args.source)?;
    let top = args.top.unwrap_or_else(|| context.config.top());
    let (mut session, notice) = session::Session::open(
        &context.input,
        context.options.clone(),
        &context.currency,
        top,
    )
    .with_context(|| format!("Loading sales data from {:?}", context.input))?;
    if let Some(notice) = notice {
        error!("{notice}; starting with an empty dashboard");
    }
    info!(
        "Exploring {} row(s) from {:?}; type 'help' for commands",
        session.table().len(),
        context.input
    );
    let stdin = io::stdin();
    let stdout = io::stdout();
    session::run(&mut session, stdin.lock(), stdout.lock())
}

fn write_stdout(rendered: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .context("Writing report")?;
    stdout.flush().context("Flushing report")
}

//! Line-oriented interactive session.
//!
//! Each command updates the session's filter state and triggers a full
//! recomputation of the dashboard before the next line is read. The loaded
//! table is shared read-only through the [`TableCache`].

use std::{
    collections::BTreeSet,
    io::{BufRead, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, info};

use crate::{
    cache::TableCache,
    columns::Dimension,
    dashboard::{self, DashboardRequest, DashboardView},
    data::parse_day_first_date,
    error::LoadError,
    filter::{DateRange, TypeFilter},
    loader::{LoadOptions, SalesTable},
    report::{self, Section},
};

pub const HELP: &str = "\
commands:
  start <DD/MM/YYYY>|-         set or clear the start date
  end <DD/MM/YYYY>|-           set or clear the end date
  type both|sale|return        restrict transaction type
  channel|salesman|category|sub-category|part-no [v1,v2,...]
                               select values (no values clears the selection)
  sku-start|sku-end <date>|-   fast-moving SKU date window
  sku-channel|sku-category|sku-sub-category [v1,...]
                               fast-moving SKU selections
  top <n>                      fast-moving SKU limit (0 = all)
  clear                        reset every filter
  show [summary|share|trend|salesmen|fast-sku]
  options                      list filter values
  reload                       re-read the source file
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(Option<NaiveDate>),
    End(Option<NaiveDate>),
    Type(TypeFilter),
    Select(Dimension, BTreeSet<String>),
    SkuStart(Option<NaiveDate>),
    SkuEnd(Option<NaiveDate>),
    SkuSelect(Dimension, BTreeSet<String>),
    Top(usize),
    Clear,
    Show(Vec<Section>),
    Options,
    Reload,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let command = match word.to_ascii_lowercase().as_str() {
            "start" => Command::Start(parse_optional_date(rest)?),
            "end" => Command::End(parse_optional_date(rest)?),
            "type" => Command::Type(rest.parse()?),
            "channel" => Command::Select(Dimension::Channel, parse_values(rest)),
            "salesman" => Command::Select(Dimension::Salesman, parse_values(rest)),
            "category" => Command::Select(Dimension::Category, parse_values(rest)),
            "sub-category" => Command::Select(Dimension::SubCategory, parse_values(rest)),
            "part-no" => Command::Select(Dimension::PartNo, parse_values(rest)),
            "sku-start" => Command::SkuStart(parse_optional_date(rest)?),
            "sku-end" => Command::SkuEnd(parse_optional_date(rest)?),
            "sku-channel" => Command::SkuSelect(Dimension::Channel, parse_values(rest)),
            "sku-category" => Command::SkuSelect(Dimension::Category, parse_values(rest)),
            "sku-sub-category" => {
                Command::SkuSelect(Dimension::SubCategory, parse_values(rest))
            }
            "top" => Command::Top(
                rest.parse()
                    .map_err(|_| format!("'{rest}' is not a row count"))?,
            ),
            "clear" => Command::Clear,
            "show" => Command::Show(parse_sections(rest)?),
            "options" => Command::Options,
            "reload" => Command::Reload,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("Unknown command '{other}' (try 'help')")),
        };
        Ok(command)
    }
}

fn parse_optional_date(raw: &str) -> Result<Option<NaiveDate>, String> {
    match raw {
        "" | "-" => Ok(None),
        value => parse_day_first_date(value)
            .map(Some)
            .ok_or_else(|| format!("'{value}' is not a DD/MM/YYYY date")),
    }
}

fn parse_values(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_sections(raw: &str) -> Result<Vec<Section>, String> {
    if raw.is_empty() {
        return Ok(Section::ALL.to_vec());
    }
    raw.split([',', ' '])
        .filter(|s| !s.is_empty())
        .map(|name| match name {
            "summary" => Ok(Section::Summary),
            "share" => Ok(Section::Share),
            "trend" => Ok(Section::Trend),
            "salesmen" => Ok(Section::Salesmen),
            "fast-sku" => Ok(Section::FastSku),
            other => Err(format!("Unknown section '{other}'")),
        })
        .collect()
}

pub struct Session {
    source: PathBuf,
    options: LoadOptions,
    cache: TableCache,
    table: Arc<SalesTable>,
    currency: String,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    sku_start: Option<NaiveDate>,
    sku_end: Option<NaiveDate>,
    request: DashboardRequest,
    default_top: usize,
}

impl Session {
    /// Opens a session on `source`. A missing file leaves the session with an
    /// empty table; the returned notice describes the condition.
    pub fn open(
        source: &Path,
        options: LoadOptions,
        currency: &str,
        top: usize,
    ) -> Result<(Self, Option<String>), LoadError> {
        let mut session = Self {
            source: source.to_path_buf(),
            options,
            cache: TableCache::new(),
            table: Arc::new(SalesTable::empty()),
            currency: currency.to_string(),
            start: None,
            end: None,
            sku_start: None,
            sku_end: None,
            request: DashboardRequest {
                top,
                ..DashboardRequest::default()
            },
            default_top: top,
        };
        let notice = session.reload()?;
        Ok((session, notice))
    }

    fn reload(&mut self) -> Result<Option<String>, LoadError> {
        match self.cache.get_or_load(&self.source, &self.options) {
            Ok(table) => {
                self.table = table;
                Ok(None)
            }
            Err(err) if err.is_source_not_found() => {
                debug!("{err}");
                self.table = Arc::new(SalesTable::empty());
                Ok(Some(format!("{err}")))
            }
            Err(err) => Err(err),
        }
    }

    pub fn table(&self) -> &SalesTable {
        &self.table
    }

    pub fn request(&self) -> &DashboardRequest {
        &self.request
    }

    /// Recomputes the dashboard from the current table and filter state.
    pub fn view(&mut self) -> DashboardView {
        self.request.criteria.date_range = DateRange::resolve(self.start, self.end, &self.table);
        self.request.sku.date_range = DateRange::resolve(self.sku_start, self.sku_end, &self.table);
        dashboard::compute(&self.table, &self.request)
    }

    /// Applies `command` and returns the text to show, or `None` to quit.
    pub fn execute(&mut self, command: Command) -> Result<Option<String>, LoadError> {
        let sections: &[Section] = match command {
            Command::Quit => return Ok(None),
            Command::Help => return Ok(Some(HELP.to_string())),
            Command::Options => return Ok(Some(report::render_options(&self.table))),
            Command::Show(sections) => {
                let view = self.view();
                return Ok(Some(report::render_text(&view, &sections, &self.currency)));
            }
            Command::Reload => {
                self.cache.invalidate(&self.source);
                if let Some(notice) = self.reload()? {
                    return Ok(Some(notice));
                }
                info!("Reloaded {} row(s)", self.table.len());
                &[Section::Summary]
            }
            Command::Start(date) => {
                self.start = date;
                &[Section::Summary]
            }
            Command::End(date) => {
                self.end = date;
                &[Section::Summary]
            }
            Command::Type(txn_type) => {
                self.request.criteria.txn_type = txn_type;
                &[Section::Summary]
            }
            Command::Select(dimension, values) => {
                *self.request.criteria.selection_mut(dimension) = values;
                &[Section::Summary]
            }
            Command::SkuStart(date) => {
                self.sku_start = date;
                &[Section::FastSku]
            }
            Command::SkuEnd(date) => {
                self.sku_end = date;
                &[Section::FastSku]
            }
            Command::SkuSelect(dimension, values) => {
                let target = match dimension {
                    Dimension::Channel => &mut self.request.sku.channel,
                    Dimension::Category => &mut self.request.sku.category,
                    Dimension::SubCategory => &mut self.request.sku.sub_category,
                    Dimension::Salesman | Dimension::PartNo => {
                        return Ok(Some(format!("{dimension} is not a fast-moving SKU filter")));
                    }
                };
                *target = values;
                &[Section::FastSku]
            }
            Command::Top(top) => {
                self.request.top = top;
                &[Section::FastSku]
            }
            Command::Clear => {
                self.start = None;
                self.end = None;
                self.sku_start = None;
                self.sku_end = None;
                self.request = DashboardRequest {
                    top: self.default_top,
                    ..DashboardRequest::default()
                };
                &[Section::Summary]
            }
        };
        let view = self.view();
        Ok(Some(report::render_text(&view, sections, &self.currency)))
    }
}

/// Reads commands from `input` until end of input or `quit`.
pub fn run<R: BufRead, W: Write>(session: &mut Session, input: R, mut output: W) -> Result<()> {
    for line in input.lines() {
        let line = line.context("Reading command")?;
        if line.trim().is_empty() {
            continue;
        }
        let text = match Command::parse(&line) {
            Ok(command) => match session.execute(command)? {
                Some(text) => text,
                None => break,
            },
            Err(message) => message,
        };
        writeln!(output, "{}", text.trim_end()).context("Writing output")?;
        output.flush().context("Flushing output")?;
    }
    Ok(())
}

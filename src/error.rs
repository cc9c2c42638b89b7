//! Typed errors surfaced by the loader and configuration layers.
//!
//! Recoverable data problems (unparseable numbers, unparseable dates) are not
//! represented here: the loader coerces or drops them and reports counts in
//! [`crate::loader::LoadReport`].

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("required column '{name}' is missing from {path}", name = .0, path = .1.display())]
    MissingColumn(&'static str, PathBuf),
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing CSV in {} at row {row}: {source}", path.display())]
    Csv {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error("failed to decode {} at row {row} as {encoding}", path.display())]
    Decode {
        path: PathBuf,
        row: usize,
        encoding: &'static str,
    },
}

impl LoadError {
    pub fn is_source_not_found(&self) -> bool {
        matches!(self, LoadError::SourceNotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unknown column '{target}' for alias '{alias}'")]
    UnknownAliasTarget { alias: String, target: String },
    #[error("unknown encoding '{0}'")]
    UnknownEncoding(String),
    #[error("invalid delimiter: {0}")]
    InvalidDelimiter(String),
}

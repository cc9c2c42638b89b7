//! Optional YAML configuration for the dashboard.
//!
//! ```yaml
//! source: exports/RawData.csv
//! delimiter: ";"
//! encoding: windows-1252
//! currency: OMR
//! top: 10
//! aliases:
//!   Sku: PartNo
//! ```
//!
//! Every field is optional; command-line flags take precedence.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    aggregate::DEFAULT_TOP_SKUS,
    columns::ColumnAliases,
    error::ConfigError,
    io_utils,
    loader::LoadOptions,
};

pub const DEFAULT_SOURCE: &str = "RawData.csv";
pub const DEFAULT_CURRENCY: &str = "OMR";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub source: Option<PathBuf>,
    pub delimiter: Option<String>,
    pub encoding: Option<String>,
    pub currency: Option<String>,
    pub top: Option<usize>,
    pub aliases: BTreeMap<String, String>,
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn source(&self) -> &Path {
        self.source
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_SOURCE))
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn top(&self) -> usize {
        self.top.unwrap_or(DEFAULT_TOP_SKUS)
    }

    /// Loader options from this config, with explicit overrides winning.
    pub fn load_options(
        &self,
        delimiter: Option<u8>,
        encoding: Option<&str>,
    ) -> Result<LoadOptions, ConfigError> {
        let delimiter = match (delimiter, self.delimiter.as_deref()) {
            (Some(explicit), _) => Some(explicit),
            (None, Some(configured)) => {
                Some(io_utils::parse_delimiter(configured).map_err(ConfigError::InvalidDelimiter)?)
            }
            (None, None) => None,
        };
        let encoding = io_utils::resolve_encoding(encoding.or(self.encoding.as_deref()))?;
        Ok(LoadOptions {
            delimiter,
            encoding,
            aliases: ColumnAliases::with_extra(&self.aliases)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::Field;

    #[test]
    fn empty_config_uses_defaults() {
        let config = DashboardConfig::from_yaml_str("").unwrap();
        assert_eq!(config.source(), Path::new("RawData.csv"));
        assert_eq!(config.currency(), "OMR");
        assert_eq!(config.top(), 10);
        let options = config.load_options(None, None).unwrap();
        assert_eq!(options.delimiter, None);
        assert_eq!(options.encoding.name(), "UTF-8");
    }

    #[test]
    fn parses_all_fields() {
        let config = DashboardConfig::from_yaml_str(
            "source: data/export.tsv\n\
             delimiter: tab\n\
             encoding: windows-1252\n\
             currency: USD\n\
             top: 5\n\
             aliases:\n  Sku: PartNo\n",
        )
        .unwrap();
        assert_eq!(config.source(), Path::new("data/export.tsv"));
        assert_eq!(config.currency(), "USD");
        assert_eq!(config.top(), 5);
        let options = config.load_options(None, None).unwrap();
        assert_eq!(options.delimiter, Some(b'\t'));
        assert_eq!(options.encoding.name(), "windows-1252");
        assert_eq!(options.aliases.resolve("Sku"), Some(Field::PartNo));
    }

    #[test]
    fn explicit_overrides_win() {
        let config = DashboardConfig::from_yaml_str("delimiter: ';'\nencoding: latin1\n").unwrap();
        let options = config.load_options(Some(b'|'), Some("utf-8")).unwrap();
        assert_eq!(options.delimiter, Some(b'|'));
        assert_eq!(options.encoding.name(), "UTF-8");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(DashboardConfig::from_yaml_str("colour: red\n").is_err());
    }

    #[test]
    fn invalid_delimiter_is_reported() {
        let config = DashboardConfig::from_yaml_str("delimiter: '::'\n").unwrap();
        let err = config.load_options(None, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDelimiter(_)));
    }
}

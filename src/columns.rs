//! Canonical sales columns and the alias table consulted once per load.
//!
//! Source exports disagree on header spelling (`CHANNEL` vs `Channel`,
//! `Amount` vs `Value`). [`ColumnAliases`] maps every accepted spelling to a
//! [`Field`]; headers it does not recognize pass through unchanged.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Date,
    Type,
    Value,
    Qty,
    Channel,
    Salesman,
    Category,
    SubCategory,
    PartNo,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Date,
        Field::Type,
        Field::Value,
        Field::Qty,
        Field::Channel,
        Field::Salesman,
        Field::Category,
        Field::SubCategory,
        Field::PartNo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Date => "Date",
            Field::Type => "Type",
            Field::Value => "Value",
            Field::Qty => "Qty",
            Field::Channel => "Channel",
            Field::Salesman => "Salesman",
            Field::Category => "Category",
            Field::SubCategory => "SubCategory",
            Field::PartNo => "PartNo",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Columns whose absence makes the export unusable.
    pub fn is_required(self) -> bool {
        matches!(self, Field::Date | Field::Type | Field::Value)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Text columns a user can filter or group on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Channel,
    Salesman,
    Category,
    SubCategory,
    PartNo,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Channel,
        Dimension::Salesman,
        Dimension::Category,
        Dimension::SubCategory,
        Dimension::PartNo,
    ];

    pub fn field(self) -> Field {
        match self {
            Dimension::Channel => Field::Channel,
            Dimension::Salesman => Field::Salesman,
            Dimension::Category => Field::Category,
            Dimension::SubCategory => Field::SubCategory,
            Dimension::PartNo => Field::PartNo,
        }
    }

    pub fn name(self) -> &'static str {
        self.field().name()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed source-header renames. Matching is case-sensitive.
pub const DEFAULT_ALIASES: &[(&str, Field)] = &[
    ("CHANNEL", Field::Channel),
    ("Sales Executive", Field::Salesman),
    ("Sub Category", Field::SubCategory),
    ("Part Number", Field::PartNo),
    ("Amount", Field::Value),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAliases {
    aliases: BTreeMap<String, Field>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        let aliases = DEFAULT_ALIASES
            .iter()
            .map(|(alias, field)| (alias.to_string(), *field))
            .collect();
        Self { aliases }
    }
}

impl ColumnAliases {
    /// Extends the fixed table with `extra` (alias -> canonical name). Entries
    /// already present in the fixed table keep their original target.
    pub fn with_extra(extra: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let mut aliases = Self::default();
        for (alias, target) in extra {
            let field =
                Field::from_name(target).ok_or_else(|| ConfigError::UnknownAliasTarget {
                    alias: alias.clone(),
                    target: target.clone(),
                })?;
            aliases.aliases.entry(alias.clone()).or_insert(field);
        }
        Ok(aliases)
    }

    /// Resolves a raw header to its canonical field, trimming surrounding
    /// whitespace first.
    pub fn resolve(&self, header: &str) -> Option<Field> {
        let trimmed = header.trim();
        self.aliases
            .get(trimmed)
            .copied()
            .or_else(|| Field::from_name(trimmed))
    }

    /// Normalized header text: canonical name for known columns, trimmed
    /// original text otherwise.
    pub fn normalize_header(&self, header: &str) -> String {
        match self.resolve(header) {
            Some(field) => field.name().to_string(),
            None => header.trim().to_string(),
        }
    }
}

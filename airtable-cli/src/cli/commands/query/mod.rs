//! Arguments shared by the record commands

pub mod handler;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, ValueEnum};
use serde_json::Value;

use crate::api::{Direction, Fields, SortSpec};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Single-line JSON
    JsonCompact,
    /// One row per record, one column per field
    Csv,
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write results to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Relation to load into each record (repeatable)
    #[arg(long = "with")]
    pub with: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    /// Record type as named in the config
    #[arg(short, long)]
    pub table: String,

    /// Equality filter, as name=value (repeatable, combined with AND)
    #[arg(short, long = "where", conflicts_with = "formula")]
    pub wheres: Vec<KeyValue>,

    /// Raw filterByFormula expression
    #[arg(long)]
    pub formula: Option<String>,

    /// Sort key, as field[:asc|desc] (repeatable, applied in order)
    #[arg(short, long)]
    pub sort: Vec<SortArg>,

    /// Only return these fields
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Maximum number of records
    #[arg(short, long)]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// `name=value` argument.
///
/// The value is read as JSON when it parses (`3`, `true`, `["a","b"]`),
/// otherwise it is taken as a plain string.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: Value,
}

impl FromStr for KeyValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, raw) = s
            .split_once('=')
            .ok_or_else(|| format!("expected name=value, got '{}'", s))?;

        let key = key.trim();
        if key.is_empty() {
            return Err(format!("missing field name in '{}'", s));
        }

        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));

        Ok(Self {
            key: key.to_string(),
            value,
        })
    }
}

/// Collect `name=value` pairs into a field map, later pairs winning
pub fn to_fields(pairs: &[KeyValue]) -> Fields {
    let mut fields = Fields::new();
    for pair in pairs {
        fields.insert(pair.key.clone(), pair.value.clone());
    }
    fields
}

/// `field[:asc|desc]` argument
#[derive(Debug, Clone, PartialEq)]
pub struct SortArg(pub SortSpec);

impl FromStr for SortArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.rsplit_once(':') {
            Some((field, direction)) => (field, direction.parse::<Direction>()?),
            None => (s, Direction::Asc),
        };

        if field.is_empty() {
            return Err(format!("missing field name in '{}'", s));
        }

        Ok(Self(SortSpec::new(field, direction)))
    }
}

//! Configuration file and environment handling
//!
//! The registry is described by a TOML file:
//!
//! ```toml
//! api_key = "key..."
//! base_id = "app..."
//!
//! [tables]
//! contacts = "tblContacts"
//! projects = { base_id = "appOther", table_id = "tblProjects" }
//!
//! [relations.contacts]
//! company = { kind = "one", target = "companies", attribute = "Company" }
//! ```
//!
//! `AIRTABLE_API_KEY`, `AIRTABLE_BASE_ID` and `AIRTABLE_API_URL` (also read
//! from `.env`) take precedence over the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::api::{self, AirtableError, Connection, Registry, RelationDef, TableConfig, Transport};

pub const ENV_API_KEY: &str = "AIRTABLE_API_KEY";
pub const ENV_BASE_ID: &str = "AIRTABLE_BASE_ID";
pub const ENV_API_URL: &str = "AIRTABLE_API_URL";

/// A table binding as written in the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableEntry {
    /// Table id in the shared base
    Id(String),
    /// Table with its own base and/or key; missing parts fall back to the
    /// shared values
    Detailed {
        table_id: String,
        #[serde(default)]
        base_id: Option<String>,
        #[serde(default)]
        api_key: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_id: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub tables: IndexMap<String, TableEntry>,
    /// Owner record type → relation name → definition
    #[serde(default)]
    pub relations: IndexMap<String, IndexMap<String, RelationDef>>,
}

impl Config {
    /// `<config dir>/airtable-cli/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("airtable-cli").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `path` is None.
    ///
    /// An explicit path must exist; a missing default file yields an empty
    /// config so environment variables alone can drive the CLI.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file does not exist: {}", path.display());
                }
                path.to_path_buf()
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(
            "Loaded {} table(s) from {}",
            config.tables.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn from_toml(content: &str) -> api::Result<Self> {
        toml::from_str(content).map_err(|e| AirtableError::InvalidConfiguration(e.to_string()))
    }

    /// Let `lookup` override the shared key, base and API root
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup(ENV_API_KEY) {
            self.api_key = Some(api_key);
        }
        if let Some(base_id) = lookup(ENV_BASE_ID) {
            self.base_id = Some(base_id);
        }
        if let Some(api_url) = lookup(ENV_API_URL) {
            self.api_url = Some(api_url);
        }
    }

    /// Apply `.env` and process environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        self.apply_overrides(|name| std::env::var(name).ok().filter(|v| !v.is_empty()));
    }

    fn table_config(&self, record_type: &str, entry: &TableEntry) -> api::Result<TableConfig> {
        match entry {
            TableEntry::Id(table_id) => Ok(TableConfig::Table(table_id.clone())),
            TableEntry::Detailed {
                table_id,
                base_id: None,
                api_key: None,
            } => Ok(TableConfig::Table(table_id.clone())),
            TableEntry::Detailed {
                table_id,
                base_id,
                api_key,
            } => {
                let api_key = api_key.as_ref().or(self.api_key.as_ref()).ok_or_else(|| {
                    AirtableError::InvalidConfiguration(format!(
                        "Table [{}] needs an api key",
                        record_type
                    ))
                })?;
                let base_id = base_id.as_ref().or(self.base_id.as_ref()).ok_or_else(|| {
                    AirtableError::InvalidConfiguration(format!(
                        "Table [{}] needs a base id",
                        record_type
                    ))
                })?;
                Ok(TableConfig::Connection(Connection::new(
                    api_key, base_id, table_id,
                )))
            }
        }
    }

    /// Freeze this config into a registry using `transport`, or the HTTP
    /// transport when None
    pub fn to_registry(&self, transport: Option<Arc<dyn Transport>>) -> api::Result<Registry> {
        let mut builder = Registry::builder();

        if let Some(api_key) = &self.api_key {
            builder = builder.api_key(api_key);
        }
        if let Some(base_id) = &self.base_id {
            builder = builder.base_id(base_id);
        }
        if let Some(api_url) = &self.api_url {
            builder = builder.api_url(api_url);
        }
        if let Some(transport) = transport {
            builder = builder.transport(transport);
        }

        for (record_type, entry) in &self.tables {
            builder = builder.table_config(record_type, self.table_config(record_type, entry)?);
        }

        for (owner, relations) in &self.relations {
            for (name, definition) in relations {
                builder = builder.relation(owner, name, definition.clone());
            }
        }

        builder.build()
    }
}

//! Record type → connection registry
//!
//! Built once at startup through [`RegistryBuilder`], then passed by
//! reference to everything that needs to reach a table. Nothing in a built
//! registry can change, so it can be shared freely across tasks.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use super::connection::Connection;
use super::constants::API_URL;
use super::error::{AirtableError, Result};
use super::model::RelationKind;
use super::query::QueryBuilder;
use super::transport::{HttpTransport, Transport};

/// How a record type is bound to its table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableConfig {
    /// Table id within the shared base, using the shared api key
    Table(String),
    /// Fully specified connection
    Connection(Connection),
}

/// A named relation declared on a record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDef {
    pub kind: RelationKind,
    /// Record type of the related rows
    pub target: String,
    /// Linked-record field on the owning row holding the foreign ids
    pub attribute: String,
}

impl RelationDef {
    pub fn one(target: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::One,
            target: target.into(),
            attribute: attribute.into(),
        }
    }

    pub fn many(target: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::Many,
            target: target.into(),
            attribute: attribute.into(),
        }
    }
}

/// Collects table bindings before they are frozen into a [`Registry`]
#[derive(Debug)]
pub struct RegistryBuilder {
    api_key: Option<String>,
    base_id: Option<String>,
    api_url: String,
    tables: IndexMap<String, TableConfig>,
    relations: HashMap<String, IndexMap<String, RelationDef>>,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_id: None,
            api_url: API_URL.to_string(),
            tables: IndexMap::new(),
            relations: HashMap::new(),
            transport: None,
        }
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Api key shared by every table registered by id
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Base shared by every table registered by id
    pub fn base_id(mut self, base_id: impl Into<String>) -> Self {
        self.base_id = Some(base_id.into());
        self
    }

    /// Override the API root (proxies, local test servers)
    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Bind a record type to a table of the shared base
    pub fn table(mut self, record_type: impl Into<String>, table_id: impl Into<String>) -> Self {
        self.tables
            .insert(record_type.into(), TableConfig::Table(table_id.into()));
        self
    }

    /// Bind a record type to an explicit connection
    pub fn connection(mut self, record_type: impl Into<String>, connection: Connection) -> Self {
        self.tables
            .insert(record_type.into(), TableConfig::Connection(connection));
        self
    }

    pub fn table_config(mut self, record_type: impl Into<String>, config: TableConfig) -> Self {
        self.tables.insert(record_type.into(), config);
        self
    }

    /// Declare a named relation on `owner`
    pub fn relation(
        mut self,
        owner: impl Into<String>,
        name: impl Into<String>,
        definition: RelationDef,
    ) -> Self {
        self.relations
            .entry(owner.into())
            .or_default()
            .insert(name.into(), definition);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Resolve every binding into a connection.
    ///
    /// Fails when a table is registered by id but no shared api key or base
    /// id was provided.
    pub fn build(self) -> Result<Registry> {
        let mut connections = HashMap::with_capacity(self.tables.len());

        for (record_type, config) in self.tables {
            let connection = match config {
                TableConfig::Connection(connection) => connection,
                TableConfig::Table(table_id) => {
                    let api_key = self.api_key.as_deref().ok_or_else(|| {
                        AirtableError::InvalidConfiguration(format!(
                            "Table [{}] needs a shared api key",
                            record_type
                        ))
                    })?;
                    let base_id = self.base_id.as_deref().ok_or_else(|| {
                        AirtableError::InvalidConfiguration(format!(
                            "Table [{}] needs a shared base id",
                            record_type
                        ))
                    })?;
                    Connection::new(api_key, base_id, table_id)
                }
            };
            debug!(
                "Registered [{}] -> {}/{}",
                record_type,
                connection.base_id(),
                connection.table_id()
            );
            connections.insert(record_type, Arc::new(connection));
        }

        Ok(Registry {
            api_url: self.api_url,
            connections,
            relations: self.relations,
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(HttpTransport::new())),
        })
    }
}

/// Read-only lookup of connections and relation declarations
#[derive(Debug)]
pub struct Registry {
    api_url: String,
    connections: HashMap<String, Arc<Connection>>,
    relations: HashMap<String, IndexMap<String, RelationDef>>,
    transport: Arc<dyn Transport>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Connection bound to `record_type`
    pub fn connection(&self, record_type: &str) -> Result<Arc<Connection>> {
        self.connections
            .get(record_type)
            .cloned()
            .ok_or_else(|| AirtableError::ConfigurationMissing(record_type.to_string()))
    }

    /// Start a query against the table bound to `record_type`
    pub fn query(&self, record_type: &str) -> Result<QueryBuilder<'_>> {
        QueryBuilder::new(self, record_type)
    }

    pub fn relation_def(&self, record_type: &str, name: &str) -> Result<&RelationDef> {
        self.relations
            .get(record_type)
            .and_then(|relations| relations.get(name))
            .ok_or_else(|| AirtableError::UnknownRelation {
                record_type: record_type.to_string(),
                name: name.to_string(),
            })
    }

    /// Relation names declared on `record_type`, in declaration order
    pub fn relation_names(&self, record_type: &str) -> Vec<&str> {
        self.relations
            .get(record_type)
            .map(|relations| relations.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Registered record types, sorted
    pub fn record_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.connections.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }
}

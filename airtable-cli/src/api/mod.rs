//! Airtable Web API Module
//!
//! A record-mapping client for Airtable tables: a [`Registry`] binds record
//! types to tables, a [`QueryBuilder`] filters, sorts, paginates and writes
//! rows, and every row comes back as a [`Record`].

pub mod connection;
pub mod constants;
pub mod error;
pub mod model;
pub mod query;
pub mod registry;
pub mod transport;

pub use connection::Connection;
pub use error::{AirtableError, Result};
pub use model::{Fields, Related, Record, Relation, RelationKind};
pub use query::{Direction, ListPage, QueryBuilder, SortSpec, UpdateMethod};
pub use registry::{Registry, RegistryBuilder, RelationDef, TableConfig};
pub use transport::{ApiRequest, HttpTransport, Method, Transport};

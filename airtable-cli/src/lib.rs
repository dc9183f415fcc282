//! Record-mapping client for Airtable tables, plus the `airtable-cli`
//! command-line front end.
//!
//! ```no_run
//! use airtable_cli::api::{Registry, RelationDef};
//!
//! # async fn demo() -> airtable_cli::api::Result<()> {
//! let registry = Registry::builder()
//!     .api_key("key...")
//!     .base_id("app...")
//!     .table("contacts", "tblContacts")
//!     .table("companies", "tblCompanies")
//!     .relation("contacts", "company", RelationDef::one("companies", "Company"))
//!     .build()?;
//!
//! let contacts = registry
//!     .query("contacts")?
//!     .where_eq("Status", "active")
//!     .order_by_asc("Name")
//!     .get()
//!     .await?;
//!
//! for mut contact in contacts {
//!     contact.load(&registry, &["company"]).await?;
//!     println!("{:?}", contact.to_map());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod config;

pub use api::{AirtableError, QueryBuilder, Record, Registry};

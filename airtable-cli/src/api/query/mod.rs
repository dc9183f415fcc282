//! Airtable Query Builder Module
//!
//! Provides a fluent API for building and executing list/read/write calls
//! against one Airtable table. Filters are expressed in Airtable's formula
//! language, see [`filters`].

pub mod builder;
pub mod filters;
pub mod orderby;
pub mod result;

pub use builder::{QueryBuilder, UpdateMethod};
pub use orderby::{Direction, SortSpec};
pub use result::ListPage;

//! Records returned by and sent to a table

pub mod record;
pub mod relation;

pub use record::{Fields, Record};
pub use relation::{Related, Relation, RelationKind};

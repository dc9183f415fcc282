//! Subcommands

pub mod query;

use clap::Subcommand;

pub use query::{KeyValue, OutputArgs, OutputFormat, QueryArgs, SortArg};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List every matching record, following pagination
    Get(QueryArgs),

    /// Show the first matching record
    First(QueryArgs),

    /// Fetch one record by id
    Find {
        /// Record type as named in the config
        #[arg(short, long)]
        table: String,
        id: String,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Create a record
    Create {
        #[arg(short, long)]
        table: String,
        /// Field to set, as name=value (repeatable)
        #[arg(long = "set", required = true)]
        set: Vec<KeyValue>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Update a record by id
    Update {
        #[arg(short, long)]
        table: String,
        id: String,
        #[arg(long = "set", required = true)]
        set: Vec<KeyValue>,
        /// Replace the whole record (PUT) instead of patching it
        #[arg(long)]
        replace: bool,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Return the record matching --match, creating it if missing
    FirstOrCreate {
        #[arg(short, long)]
        table: String,
        /// Field the record is looked up by, as name=value (repeatable)
        #[arg(long = "match", required = true)]
        matching: Vec<KeyValue>,
        /// Extra field used only when creating
        #[arg(long = "set")]
        set: Vec<KeyValue>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Bring the record matching --match in line with --set, creating it if missing
    UpdateOrCreate {
        #[arg(short, long)]
        table: String,
        #[arg(long = "match", required = true)]
        matching: Vec<KeyValue>,
        #[arg(long = "set")]
        set: Vec<KeyValue>,
        #[command(flatten)]
        output: OutputArgs,
    },
}

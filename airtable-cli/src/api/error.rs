//! Error type shared by every Airtable API operation

/// Result alias used throughout the API module
pub type Result<T, E = AirtableError> = std::result::Result<T, E>;

/// Errors raised by the registry, the query builder and the HTTP transport.
///
/// An absent row is never an error: `first`, `find` and `get` report it as
/// `None` or an empty collection.
#[derive(Debug, thiserror::Error)]
pub enum AirtableError {
    /// The record type has no registered connection
    #[error("Table [{0}] configuration is missing")]
    ConfigurationMissing(String),

    /// Registry or configuration file is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The API answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// No relation with this name is declared for the record type
    #[error("Relation [{name}] is not declared for [{record_type}]")]
    UnknownRelation { record_type: String, name: String },

    /// The record has no id, so it cannot be addressed remotely
    #[error("Record of type [{0}] has not been saved yet")]
    UnsavedRecord(String),
}

impl AirtableError {
    /// Whether this is a 404 response
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}

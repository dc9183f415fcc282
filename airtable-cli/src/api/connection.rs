//! Per-table routing and authentication

use serde::{Deserialize, Serialize};

/// Everything needed to address one remote table.
///
/// Immutable once built; builders for the same record type share it
/// through an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    api_key: String,
    base_id: String,
    table_id: String,
}

impl Connection {
    pub fn new(
        api_key: impl Into<String>,
        base_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_id: base_id.into(),
            table_id: table_id.into(),
        }
    }

    /// Bearer token sent with every request
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// `{api_url}/{baseId}/{tableId}`
    pub fn resource_url(&self, api_url: &str) -> String {
        format!(
            "{}/{}/{}",
            api_url.trim_end_matches('/'),
            self.base_id,
            self.table_id
        )
    }

    /// URL of a single row within the table
    pub fn record_url(&self, api_url: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.resource_url(api_url),
            urlencoding::encode(id)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_url() {
        let connection = Connection::new("key", "appBase", "tblTable");
        assert_eq!(
            connection.resource_url("https://api.airtable.com/v0"),
            "https://api.airtable.com/v0/appBase/tblTable"
        );
        // Trailing slash on the API root is tolerated
        assert_eq!(
            connection.resource_url("http://localhost:8080/v0/"),
            "http://localhost:8080/v0/appBase/tblTable"
        );
    }

    #[test]
    fn test_record_url_encodes_id() {
        let connection = Connection::new("key", "appBase", "tblTable");
        assert_eq!(
            connection.record_url("https://api.airtable.com/v0", "rec1"),
            "https://api.airtable.com/v0/appBase/tblTable/rec1"
        );
        assert_eq!(
            connection.record_url("https://api.airtable.com/v0", "a b/c"),
            "https://api.airtable.com/v0/appBase/tblTable/a%20b%2Fc"
        );
    }
}

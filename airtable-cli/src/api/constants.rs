//! Airtable Web API constants

/// Default API root, `{API_URL}/{baseId}/{tableId}` addresses a table
pub const API_URL: &str = "https://api.airtable.com/v0";

/// Query parameter names understood by the list endpoint
pub mod params {
    pub const FILTER_BY_FORMULA: &str = "filterByFormula";
    pub const MAX_RECORDS: &str = "maxRecords";
    pub const PAGE_SIZE: &str = "pageSize";
    pub const OFFSET: &str = "offset";
    pub const FIELDS: &str = "fields[]";
}

//! List endpoint response pages

use serde::Deserialize;
use serde_json::Value;

use crate::api::error::{AirtableError, Result};

/// One page of the list endpoint: `{"records": [...], "offset": "..."}`
#[derive(Debug, Clone, Deserialize)]
pub struct ListPage {
    #[serde(default)]
    pub records: Vec<Value>,
    /// Continuation token, absent on the last page
    #[serde(default)]
    pub offset: Option<String>,
}

impl ListPage {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| AirtableError::Decode(format!("invalid list page: {}", e)))
    }

    pub fn has_more(&self) -> bool {
        self.offset.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_with_offset() {
        let page = ListPage::from_value(json!({
            "records": [{"id": "rec1", "fields": {}}],
            "offset": "itr1/rec1"
        }))
        .unwrap();
        assert_eq!(page.records.len(), 1);
        assert!(page.has_more());
    }

    #[test]
    fn test_last_page() {
        let page = ListPage::from_value(json!({"records": []})).unwrap();
        assert!(page.records.is_empty());
        assert!(!page.has_more());
    }

    #[test]
    fn test_invalid_page() {
        let result = ListPage::from_value(json!({"records": "nope"}));
        assert!(matches!(result, Err(AirtableError::Decode(_))));
    }
}

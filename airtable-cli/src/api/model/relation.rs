//! Linked-record relations
//!
//! A relation declaration on a record produces a [`Relation`]: a query
//! builder already filtered to the linked record ids, tagged with whether it
//! collapses to one record or many.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::Record;
use crate::api::error::Result;
use crate::api::query::{QueryBuilder, filters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// Resolved with `first()`
    One,
    /// Resolved with `get()`
    Many,
}

/// A relation ready to be resolved
#[derive(Debug, Clone)]
pub struct Relation<'r> {
    kind: RelationKind,
    builder: QueryBuilder<'r>,
    foreign_ids: Vec<String>,
}

impl<'r> Relation<'r> {
    /// `RECORD_ID() = '<id>'`
    pub fn has_one(builder: QueryBuilder<'r>, foreign_id: Option<String>) -> Self {
        let foreign_ids: Vec<String> = foreign_id.into_iter().collect();
        let builder = match foreign_ids.first() {
            Some(id) => builder.filter_by_formula(filters::record_id_equals(id)),
            None => builder,
        };
        Self {
            kind: RelationKind::One,
            builder,
            foreign_ids,
        }
    }

    /// `OR(RECORD_ID() = 'id1', RECORD_ID() = 'id2', ...)`
    pub fn has_many(builder: QueryBuilder<'r>, foreign_ids: Vec<String>) -> Self {
        let builder = if foreign_ids.is_empty() {
            builder
        } else {
            builder.filter_by_formula(filters::any_record_id(&foreign_ids))
        };
        Self {
            kind: RelationKind::Many,
            builder,
            foreign_ids,
        }
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn builder(&self) -> &QueryBuilder<'r> {
        &self.builder
    }

    /// Take the builder to refine it further (select, sort, limit)
    pub fn into_builder(self) -> QueryBuilder<'r> {
        self.builder
    }

    pub fn foreign_ids(&self) -> &[String] {
        &self.foreign_ids
    }

    /// Run the query. An empty link field resolves without a request.
    pub async fn resolve(self) -> Result<Related> {
        match self.kind {
            RelationKind::One if self.foreign_ids.is_empty() => Ok(Related::One(None)),
            RelationKind::One => Ok(Related::One(self.builder.first().await?)),
            RelationKind::Many if self.foreign_ids.is_empty() => Ok(Related::Many(Vec::new())),
            RelationKind::Many => Ok(Related::Many(self.builder.get().await?)),
        }
    }
}

/// A resolved relation
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    One(Option<Record>),
    Many(Vec<Record>),
}

impl Related {
    pub fn kind(&self) -> RelationKind {
        match self {
            Self::One(_) => RelationKind::One,
            Self::Many(_) => RelationKind::Many,
        }
    }

    pub fn as_one(&self) -> Option<&Record> {
        match self {
            Self::One(record) => record.as_ref(),
            Self::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> &[Record] {
        match self {
            Self::One(_) => &[],
            Self::Many(records) => records,
        }
    }

    /// Field map for one, list of field maps for many
    pub fn to_value(&self) -> Value {
        match self {
            Self::One(Some(record)) => Value::Object(record.to_map()),
            Self::One(None) => Value::Null,
            Self::Many(records) => Value::Array(
                records
                    .iter()
                    .map(|record| Value::Object(record.to_map()))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::registry::Registry;
    use crate::api::transport::MockTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn registry(transport: &Arc<MockTransport>) -> Registry {
        Registry::builder()
            .api_key("key")
            .base_id("appBase")
            .table("companies", "tblCompanies")
            .transport(transport.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn test_has_many_formula() {
        let transport = Arc::new(MockTransport::new());
        let registry = registry(&transport);

        let relation = Relation::has_many(
            registry.query("companies").unwrap(),
            vec!["r1".to_string(), "r2".to_string()],
        );
        assert_eq!(relation.kind(), RelationKind::Many);
        assert_eq!(
            relation.builder().filter_formula().as_deref(),
            Some("OR(RECORD_ID() = 'r1', RECORD_ID() = 'r2')")
        );
    }

    #[test]
    fn test_has_one_formula() {
        let transport = Arc::new(MockTransport::new());
        let registry = registry(&transport);

        let relation = Relation::has_one(
            registry.query("companies").unwrap(),
            Some("recCompany".to_string()),
        );
        assert_eq!(relation.kind(), RelationKind::One);
        assert_eq!(
            relation.builder().filter_formula().as_deref(),
            Some("RECORD_ID() = 'recCompany'")
        );
    }

    #[tokio::test]
    async fn test_resolve_one_uses_first() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({
            "records": [{"id": "recCompany", "fields": {"Name": "Acme"}}]
        }));
        let registry = registry(&transport);

        let related = Relation::has_one(
            registry.query("companies").unwrap(),
            Some("recCompany".to_string()),
        )
        .resolve()
        .await
        .unwrap();

        assert_eq!(related.as_one().and_then(Record::id), Some("recCompany"));
        assert_eq!(transport.requests()[0].query_param("pageSize"), Some("1"));
    }

    #[tokio::test]
    async fn test_resolve_many_uses_get() {
        let transport = Arc::new(MockTransport::new());
        transport
            .push_json(json!({"records": [{"id": "r1", "fields": {"Name": "A"}}], "offset": "next"}))
            .push_json(json!({"records": [{"id": "r2", "fields": {"Name": "B"}}]}));
        let registry = registry(&transport);

        let related = Relation::has_many(
            registry.query("companies").unwrap(),
            vec!["r1".to_string(), "r2".to_string()],
        )
        .resolve()
        .await
        .unwrap();

        assert_eq!(related.as_many().len(), 2);
        assert_eq!(
            related.to_value(),
            json!([{"Name": "A"}, {"Name": "B"}])
        );
    }

    #[tokio::test]
    async fn test_empty_links_resolve_without_request() {
        let transport = Arc::new(MockTransport::new());
        let registry = registry(&transport);

        let one = Relation::has_one(registry.query("companies").unwrap(), None)
            .resolve()
            .await
            .unwrap();
        let many = Relation::has_many(registry.query("companies").unwrap(), Vec::new())
            .resolve()
            .await
            .unwrap();

        assert_eq!(one, Related::One(None));
        assert_eq!(one.to_value(), Value::Null);
        assert_eq!(many, Related::Many(Vec::new()));
        assert_eq!(transport.request_count(), 0);
    }
}

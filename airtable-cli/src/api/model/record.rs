//! One row of a table

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::relation::{Related, Relation, RelationKind};
use crate::api::error::{AirtableError, Result};
use crate::api::query::UpdateMethod;
use crate::api::registry::Registry;

/// Field name → value, in the order the API returned them
pub type Fields = Map<String, Value>;

/// A row of a registered record type.
///
/// `id` and `created_time` are only set for rows that came from the API.
/// Changes made with the setters stay local until written with
/// [`update`](Self::update) or a query builder.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    record_type: String,
    id: Option<String>,
    created_time: Option<DateTime<Utc>>,
    fields: Fields,
    relations: IndexMap<String, Related>,
}

impl Record {
    /// Unsaved record with these fields
    pub fn new(record_type: impl Into<String>, fields: Fields) -> Self {
        Self {
            record_type: record_type.into(),
            id: None,
            created_time: None,
            fields,
            relations: IndexMap::new(),
        }
    }

    /// Build from either a row payload (`{"id", "createdTime", "fields"}`)
    /// or a bare field map.
    pub fn from_payload(record_type: &str, payload: Value) -> Result<Self> {
        let Value::Object(mut payload) = payload else {
            return Err(AirtableError::Decode(format!(
                "expected a [{}] row object, got {}",
                record_type, payload
            )));
        };

        let Some(fields) = payload.remove("fields") else {
            return Ok(Self::new(record_type, payload));
        };

        let fields = match fields {
            Value::Object(fields) => fields,
            other => {
                return Err(AirtableError::Decode(format!(
                    "expected [{}] fields to be an object, got {}",
                    record_type, other
                )));
            }
        };

        let id = payload
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string);

        let created_time = match payload.get("createdTime").and_then(Value::as_str) {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map_err(|e| {
                        AirtableError::Decode(format!("invalid createdTime '{}': {}", raw, e))
                    })?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        Ok(Self {
            record_type: record_type.to_string(),
            id,
            created_time,
            fields,
            relations: IndexMap::new(),
        })
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        self.created_time
    }

    /// Whether this record was read from (or written to) the API
    pub fn exists(&self) -> bool {
        self.id.is_some()
    }

    pub fn attributes(&self) -> &Fields {
        &self.fields
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// First item of a list-valued field (linked records, attachments)
    pub fn first_attribute(&self, key: &str) -> Option<&Value> {
        match self.fields.get(key)? {
            Value::Array(items) => items.first(),
            _ => None,
        }
    }

    pub fn contains_attribute(&self, key: &str) -> bool {
        self.fields.get(key).is_some_and(|value| !value.is_null())
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove_attribute(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    /// Record ids held by a linked-record field.
    ///
    /// A single string is treated as a one-element list.
    pub fn foreign_ids(&self, attribute: &str) -> Vec<String> {
        match self.fields.get(attribute) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(id)) => vec![id.clone()],
            _ => Vec::new(),
        }
    }

    /// Relation to the single `record_type` row linked from `attribute`
    pub fn has_one<'r>(
        &self,
        registry: &'r Registry,
        record_type: &str,
        attribute: &str,
    ) -> Result<Relation<'r>> {
        let foreign_id = self.foreign_ids(attribute).into_iter().next();
        Ok(Relation::has_one(registry.query(record_type)?, foreign_id))
    }

    /// Relation to every `record_type` row linked from `attribute`
    pub fn has_many<'r>(
        &self,
        registry: &'r Registry,
        record_type: &str,
        attribute: &str,
    ) -> Result<Relation<'r>> {
        Ok(Relation::has_many(
            registry.query(record_type)?,
            self.foreign_ids(attribute),
        ))
    }

    /// The relation registered as `name` for this record's type
    pub fn relation<'r>(&self, registry: &'r Registry, name: &str) -> Result<Relation<'r>> {
        let definition = registry.relation_def(&self.record_type, name)?;
        match definition.kind {
            RelationKind::One => self.has_one(registry, &definition.target, &definition.attribute),
            RelationKind::Many => {
                self.has_many(registry, &definition.target, &definition.attribute)
            }
        }
    }

    /// Resolve the relation registered as `name`
    pub async fn resolve(&self, registry: &Registry, name: &str) -> Result<Related> {
        self.relation(registry, name)?.resolve().await
    }

    /// Resolve relations now and keep them for [`to_map`](Self::to_map)
    pub async fn load<S: AsRef<str>>(
        &mut self,
        registry: &Registry,
        names: &[S],
    ) -> Result<&mut Self> {
        for name in names {
            let name = name.as_ref();
            let related = self.resolve(registry, name).await?;
            self.relations.insert(name.to_string(), related);
        }
        Ok(self)
    }

    pub fn loaded(&self, name: &str) -> Option<&Related> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> &IndexMap<String, Related> {
        &self.relations
    }

    /// PATCH `attributes` onto this row and return the stored result
    pub async fn update(&self, registry: &Registry, attributes: Fields) -> Result<Record> {
        let id = self
            .id()
            .ok_or_else(|| AirtableError::UnsavedRecord(self.record_type.clone()))?;
        registry
            .query(&self.record_type)?
            .update(id, attributes, UpdateMethod::Patch)
            .await
    }

    /// Fields merged with loaded relations, each serialized to field maps
    pub fn to_map(&self) -> Fields {
        let mut map = self.fields.clone();
        for (name, related) in &self.relations {
            map.insert(name.clone(), related.to_value());
        }
        map
    }

    /// Row payload shape, `{"id", "createdTime", "fields"}`, with loaded
    /// relations folded into `fields`
    pub fn to_payload(&self) -> Value {
        let mut payload = Map::new();
        if let Some(id) = &self.id {
            payload.insert("id".to_string(), Value::String(id.clone()));
        }
        if let Some(created_time) = &self.created_time {
            payload.insert(
                "createdTime".to_string(),
                Value::String(created_time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            );
        }
        payload.insert("fields".to_string(), Value::Object(self.to_map()));
        Value::Object(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::registry::RelationDef;
    use crate::api::transport::{Method, MockTransport};
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn registry(transport: &Arc<MockTransport>) -> Registry {
        Registry::builder()
            .api_key("key")
            .base_id("appBase")
            .table("contacts", "tblContacts")
            .table("companies", "tblCompanies")
            .table("projects", "tblProjects")
            .relation("contacts", "company", RelationDef::one("companies", "Company"))
            .relation("contacts", "projects", RelationDef::many("projects", "Projects"))
            .transport(transport.clone())
            .build()
            .unwrap()
    }

    fn contact() -> Record {
        Record::from_payload(
            "contacts",
            json!({
                "id": "recContact",
                "createdTime": "2024-01-01T00:00:00.000Z",
                "fields": {
                    "Name": "Alice",
                    "Company": ["recCompany"],
                    "Projects": ["recP1", "recP2"]
                }
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_from_full_payload() {
        let record = Record::from_payload(
            "contacts",
            json!({"id": "rec1", "createdTime": "2024-01-01T00:00:00Z", "fields": {"Name": "A"}}),
        )
        .unwrap();

        assert_eq!(record.id(), Some("rec1"));
        assert_eq!(record.attribute("Name"), Some(&json!("A")));
        assert_eq!(
            record.created_time(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(record.exists());
    }

    #[test]
    fn test_from_bare_fields() {
        let record = Record::from_payload("contacts", json!({"Name": "A"})).unwrap();

        assert_eq!(record.id(), None);
        assert_eq!(record.created_time(), None);
        assert_eq!(record.attribute("Name"), Some(&json!("A")));
        assert!(!record.exists());
    }

    #[test]
    fn test_invalid_payloads() {
        assert!(matches!(
            Record::from_payload("contacts", json!("rec1")),
            Err(AirtableError::Decode(_))
        ));
        assert!(matches!(
            Record::from_payload("contacts", json!({"id": "rec1", "fields": []})),
            Err(AirtableError::Decode(_))
        ));
        assert!(matches!(
            Record::from_payload(
                "contacts",
                json!({"id": "rec1", "createdTime": "yesterday", "fields": {}})
            ),
            Err(AirtableError::Decode(_))
        ));
    }

    #[test]
    fn test_field_order_is_preserved() {
        let record = Record::from_payload(
            "contacts",
            json!({"id": "rec1", "fields": {"Zeta": 1, "Alpha": 2, "Mid": 3}}),
        )
        .unwrap();
        let keys: Vec<_> = record.attributes().keys().cloned().collect();
        assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_attribute_accessors() {
        let mut record = contact();

        assert_eq!(record.first_attribute("Projects"), Some(&json!("recP1")));
        assert_eq!(record.first_attribute("Name"), None);
        assert_eq!(record.first_attribute("Missing"), None);

        record.set_attribute("Status", "active");
        assert_eq!(record.attribute("Status"), Some(&json!("active")));
        assert!(record.contains_attribute("Status"));

        assert_eq!(record.remove_attribute("Status"), Some(json!("active")));
        assert!(!record.contains_attribute("Status"));
    }

    #[test]
    fn test_declared_relations() {
        let transport = Arc::new(MockTransport::new());
        let registry = registry(&transport);
        let record = contact();

        let company = record.relation(&registry, "company").unwrap();
        assert_eq!(company.kind(), RelationKind::One);
        assert_eq!(company.builder().record_type(), "companies");
        assert_eq!(
            company.builder().filter_formula().as_deref(),
            Some("RECORD_ID() = 'recCompany'")
        );

        let projects = record.relation(&registry, "projects").unwrap();
        assert_eq!(projects.kind(), RelationKind::Many);
        assert_eq!(
            projects.builder().filter_formula().as_deref(),
            Some("OR(RECORD_ID() = 'recP1', RECORD_ID() = 'recP2')")
        );

        assert!(matches!(
            record.relation(&registry, "manager"),
            Err(AirtableError::UnknownRelation { .. })
        ));
    }

    #[test]
    fn test_relation_to_unregistered_type() {
        let transport = Arc::new(MockTransport::new());
        let registry = registry(&transport);

        let result = contact().has_one(&registry, "invoices", "Invoice");
        assert!(matches!(result, Err(AirtableError::ConfigurationMissing(_))));
    }

    #[tokio::test]
    async fn test_load_and_to_map() {
        let transport = Arc::new(MockTransport::new());
        transport
            .push_json(json!({"records": [{"id": "recCompany", "fields": {"Name": "Acme"}}]}))
            .push_json(json!({"records": [
                {"id": "recP1", "fields": {"Title": "One"}},
                {"id": "recP2", "fields": {"Title": "Two"}}
            ]}));
        let registry = registry(&transport);

        let mut record = contact();
        record.load(&registry, &["company", "projects"]).await.unwrap();

        assert_eq!(
            record.loaded("company").and_then(Related::as_one).and_then(Record::id),
            Some("recCompany")
        );
        assert_eq!(
            Value::Object(record.to_map()),
            json!({
                "Name": "Alice",
                "Company": ["recCompany"],
                "Projects": ["recP1", "recP2"],
                "company": {"Name": "Acme"},
                "projects": [{"Title": "One"}, {"Title": "Two"}]
            })
        );

        let requests = transport.requests();
        assert_eq!(
            requests[0].url,
            "https://api.airtable.com/v0/appBase/tblCompanies"
        );
        assert_eq!(
            requests[1].query_param("filterByFormula"),
            Some("OR(RECORD_ID() = 'recP1', RECORD_ID() = 'recP2')")
        );
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(json!({"id": "recContact", "fields": {"Name": "Bob"}}));
        let registry = registry(&transport);

        let unsaved = Record::new("contacts", Fields::new());
        let err = unsaved.update(&registry, Fields::new()).await.unwrap_err();
        assert!(matches!(err, AirtableError::UnsavedRecord(_)));

        let mut changes = Fields::new();
        changes.insert("Name".to_string(), json!("Bob"));
        let updated = contact().update(&registry, changes).await.unwrap();
        assert_eq!(updated.attribute("Name"), Some(&json!("Bob")));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Patch);
        assert_eq!(
            requests[0].url,
            "https://api.airtable.com/v0/appBase/tblContacts/recContact"
        );
    }

    #[test]
    fn test_to_payload() {
        let record = contact();
        assert_eq!(
            record.to_payload(),
            json!({
                "id": "recContact",
                "createdTime": "2024-01-01T00:00:00.000Z",
                "fields": {
                    "Name": "Alice",
                    "Company": ["recCompany"],
                    "Projects": ["recP1", "recP2"]
                }
            })
        );
    }
}

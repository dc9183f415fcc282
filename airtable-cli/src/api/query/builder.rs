//! Fluent query builder bound to one record type

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, trace};
use serde_json::{Value, json};

use super::filters;
use super::orderby::{Direction, SortSpec};
use super::result::ListPage;
use crate::api::connection::Connection;
use crate::api::constants::params;
use crate::api::error::{AirtableError, Result};
use crate::api::model::{Fields, Record};
use crate::api::registry::Registry;
use crate::api::transport::{ApiRequest, Method};

/// Write verb used by [`QueryBuilder::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateMethod {
    /// Only the given fields change
    #[default]
    Patch,
    /// Fields not given are cleared
    Put,
}

impl UpdateMethod {
    fn http_method(self) -> Method {
        match self {
            Self::Patch => Method::Patch,
            Self::Put => Method::Put,
        }
    }
}

/// Accumulates selection, filter, sort and limit state for one table and
/// runs it.
///
/// A raw formula and equality clauses are mutually exclusive: setting one
/// clears the other.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'r> {
    registry: &'r Registry,
    record_type: String,
    connection: Arc<Connection>,
    filter_formula: Option<String>,
    wheres: IndexMap<String, String>,
    selects: Vec<String>,
    orders: Vec<SortSpec>,
    limit: Option<usize>,
}

impl<'r> QueryBuilder<'r> {
    /// Look up the connection for `record_type` right away, failing with
    /// `ConfigurationMissing` if it is not registered.
    pub fn new(registry: &'r Registry, record_type: &str) -> Result<Self> {
        let connection = registry.connection(record_type)?;
        Ok(Self {
            registry,
            record_type: record_type.to_string(),
            connection,
            filter_formula: None,
            wheres: IndexMap::new(),
            selects: Vec::new(),
            orders: Vec::new(),
            limit: None,
        })
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Only return these fields (list queries only)
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selects = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Filter with a raw formula, dropping any `where_eq` clauses
    pub fn filter_by_formula(mut self, formula: impl Into<String>) -> Self {
        self.filter_formula = Some(formula.into());
        self.wheres.clear();
        self
    }

    /// Add an `{attribute} = 'value'` clause, dropping any raw formula
    pub fn where_eq(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_where(attribute.into(), value.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.orders.push(SortSpec::new(field, direction));
        self
    }

    pub fn order_by_asc(self, field: impl Into<String>) -> Self {
        self.order_by(field, Direction::Asc)
    }

    pub fn order_by_desc(self, field: impl Into<String>) -> Self {
        self.order_by(field, Direction::Desc)
    }

    /// Cap the number of records returned across all pages
    pub fn limit(mut self, value: usize) -> Self {
        self.limit = Some(value);
        self
    }

    pub fn take(self, value: usize) -> Self {
        self.limit(value)
    }

    fn push_where(&mut self, attribute: String, value: String) {
        self.filter_formula = None;
        self.wheres.insert(attribute, value);
    }

    /// The `filterByFormula` parameter this query sends, if any; an empty
    /// raw formula counts as unset
    pub fn filter_formula(&self) -> Option<String> {
        if let Some(formula) = self.filter_formula.as_ref().filter(|f| !f.is_empty()) {
            return Some(formula.clone());
        }
        if self.wheres.is_empty() {
            return None;
        }

        Some(filters::and(
            self.wheres
                .iter()
                .map(|(attribute, value)| filters::equals(attribute, value)),
        ))
    }

    /// Sort keys in the order they were added
    pub fn sort(&self) -> &[SortSpec] {
        &self.orders
    }

    pub fn selects(&self) -> &[String] {
        &self.selects
    }

    pub fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    fn push_filter_and_sort(&self, query: &mut Vec<(String, String)>) {
        if let Some(formula) = self.filter_formula() {
            query.push((params::FILTER_BY_FORMULA.to_string(), formula));
        }
        for (index, spec) in self.orders.iter().enumerate() {
            query.extend(spec.to_params(index));
        }
    }

    fn first_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        self.push_filter_and_sort(&mut query);
        query.push((params::MAX_RECORDS.to_string(), "1".to_string()));
        query.push((params::PAGE_SIZE.to_string(), "1".to_string()));
        query
    }

    fn list_query(&self) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = self
            .selects
            .iter()
            .map(|field| (params::FIELDS.to_string(), field.clone()))
            .collect();
        self.push_filter_and_sort(&mut query);
        if let Some(limit) = self.limit {
            query.push((params::MAX_RECORDS.to_string(), limit.to_string()));
        }
        query
    }

    fn table_request(&self, method: Method) -> ApiRequest {
        ApiRequest::new(
            method,
            self.connection.resource_url(self.registry.api_url()),
            self.connection.api_key(),
        )
    }

    fn record_request(&self, method: Method, id: &str) -> ApiRequest {
        ApiRequest::new(
            method,
            self.connection.record_url(self.registry.api_url(), id),
            self.connection.api_key(),
        )
    }

    async fn send(&self, request: ApiRequest) -> Result<Value> {
        debug!(
            "[{}] {} {}",
            self.record_type,
            request.method.as_str(),
            request.url
        );
        self.registry.transport().send(request).await
    }

    fn hydrate(&self, row: Value) -> Result<Record> {
        Record::from_payload(&self.record_type, row)
    }

    fn hydrate_optional(&self, row: Option<Value>) -> Result<Option<Record>> {
        match row {
            None | Some(Value::Null) => Ok(None),
            Some(row) => self.hydrate(row).map(Some),
        }
    }

    /// First matching record, or `None` when nothing matches
    pub async fn first(&self) -> Result<Option<Record>> {
        let request = self.table_request(Method::Get).with_query(self.first_query());
        let page = ListPage::from_value(self.send(request).await?)?;
        self.hydrate_optional(page.records.into_iter().next())
    }

    /// Fetch one record by id; a 404 is reported as `None`
    pub async fn find(&self, id: &str) -> Result<Option<Record>> {
        match self.send(self.record_request(Method::Get, id)).await {
            Ok(row) => self.hydrate_optional(Some(row)),
            Err(err) if err.is_not_found() => {
                debug!("[{}] record {} not found", self.record_type, id);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// All matching records, following continuation tokens until the API
    /// stops returning one. Rows keep page arrival order.
    pub async fn get(&self) -> Result<Vec<Record>> {
        let query = self.list_query();
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut page_query = query.clone();
            if let Some(token) = offset.take() {
                page_query.push((params::OFFSET.to_string(), token));
            }

            let request = self.table_request(Method::Get).with_query(page_query);
            let page = ListPage::from_value(self.send(request).await?)?;
            pages += 1;
            trace!(
                "[{}] page {} returned {} rows",
                self.record_type,
                pages,
                page.records.len()
            );

            for row in page.records {
                records.push(self.hydrate(row)?);
            }

            match page.offset {
                Some(token) => offset = Some(token),
                None => break,
            }
        }

        debug!(
            "[{}] fetched {} records over {} page(s)",
            self.record_type,
            records.len(),
            pages
        );
        Ok(records)
    }

    /// Create a row with these fields
    pub async fn create(&self, fields: Fields) -> Result<Record> {
        let request = self
            .table_request(Method::Post)
            .with_body(json!({ "fields": fields }));
        let row = self.send(request).await?;
        self.hydrate(row)
    }

    /// Write `attributes` to the row `id`
    pub async fn update(
        &self,
        id: &str,
        attributes: Fields,
        method: UpdateMethod,
    ) -> Result<Record> {
        let request = self
            .record_request(method.http_method(), id)
            .with_body(json!({ "fields": attributes }));
        let row = self.send(request).await?;
        self.hydrate(row)
    }

    /// Return the first row matching `attributes`, or create one from
    /// `attributes` merged with `values`.
    ///
    /// Check-then-act: concurrent callers can both miss and both create.
    pub async fn first_or_create(mut self, attributes: Fields, values: Fields) -> Result<Record> {
        for (key, value) in &attributes {
            self.push_where(key.clone(), filters::literal(value));
        }

        if let Some(record) = self.first().await? {
            return Ok(record);
        }

        self.create(merge(attributes, values)).await
    }

    /// Find the row matching `attributes` and bring it in line with
    /// `values`, or create it.
    ///
    /// When any value differs, a single PATCH writes the whole merged field
    /// set. When none differs, no request is made. Same race caveat as
    /// [`first_or_create`](Self::first_or_create).
    pub async fn update_or_create(mut self, attributes: Fields, values: Fields) -> Result<Record> {
        for (key, value) in &attributes {
            self.push_where(key.clone(), filters::literal(value));
        }

        let Some(record) = self.first().await? else {
            return self.create(merge(attributes, values)).await;
        };

        let changed = values
            .iter()
            .find(|(key, value)| record.attribute(key) != Some(*value));

        if let Some((key, _)) = changed {
            let id = record
                .id()
                .ok_or_else(|| AirtableError::UnsavedRecord(self.record_type.clone()))?;
            debug!("[{}] {} changed on {}, patching", self.record_type, key, id);
            return self
                .update(id, merge(attributes, values), UpdateMethod::Patch)
                .await;
        }

        Ok(record)
    }
}

/// `attributes` overlaid with `values`; keys keep their first position
fn merge(attributes: Fields, values: Fields) -> Fields {
    let mut merged = attributes;
    for (key, value) in values {
        merged.insert(key, value);
    }
    merged
}

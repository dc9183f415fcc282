//! HTTP transport seam
//!
//! The query builder never talks to `reqwest` directly. It hands an
//! [`ApiRequest`] to a [`Transport`], which either returns the decoded JSON
//! body of a 2xx response or an error. [`HttpTransport`] is the real
//! implementation; tests script responses through `MockTransport`.

pub mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpTransport;
#[cfg(test)]
pub use mock::MockTransport;

use async_trait::async_trait;
use serde_json::Value;

use super::error::Result;

/// HTTP verbs used by the Airtable record endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Put => "PUT",
        }
    }
}

/// A fully resolved request against one table
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    /// Bearer token
    pub token: String,
    /// Query parameters in the order they are sent
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            token: token.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first query parameter with this name
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Sends requests and decodes successful responses.
///
/// Implementations must turn non-2xx responses into
/// [`AirtableError::Http`](super::AirtableError::Http) and must not retry.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn send(&self, request: ApiRequest) -> Result<Value>;
}

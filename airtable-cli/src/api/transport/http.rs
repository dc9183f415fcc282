//! `reqwest`-backed transport

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use super::{ApiRequest, Method, Transport};
use crate::api::error::{AirtableError, Result};

/// Transport that performs real HTTP calls
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, timeouts, custom TLS)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Put => reqwest::Method::PUT,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .bearer_auth(&request.token);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!("{} {} -> {}", request.method.as_str(), request.url, status);

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!("Failed to read error body for {}: {}", request.url, e);
                    String::new()
                }
            };
            return Err(AirtableError::Http {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            AirtableError::Decode(format!("invalid response body from {}: {}", request.url, e))
        })
    }
}

/// Pull the human readable part out of an Airtable error body.
///
/// The API answers either `{"error": "NOT_FOUND"}` or
/// `{"error": {"type": "...", "message": "..."}}`; anything else is
/// returned as-is.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    match value.get("error") {
        Some(Value::String(kind)) => kind.clone(),
        Some(Value::Object(error)) => {
            let kind = error.get("type").and_then(Value::as_str);
            let message = error.get("message").and_then(Value::as_str);
            match (kind, message) {
                (Some(kind), Some(message)) => format!("{}: {}", kind, message),
                (Some(kind), None) => kind.to_string(),
                (None, Some(message)) => message.to_string(),
                (None, None) => body.to_string(),
            }
        }
        _ => body.to_string(),
    }
}

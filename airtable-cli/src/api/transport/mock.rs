//! Scripted transport for tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ApiRequest, Transport};
use crate::api::error::{AirtableError, Result};

/// Replays queued responses in order and records every request it sees
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<std::result::Result<Value, (u16, String)>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a 2xx response body
    pub fn push_json(&self, body: Value) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(body));
        self
    }

    /// Queue a non-2xx response
    pub fn push_error(&self, status: u16, message: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err((status, message.to_string())));
        self
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        self.requests.lock().unwrap().push(request.clone());

        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(body)) => Ok(body),
            Some(Err((status, message))) => Err(AirtableError::Http { status, message }),
            None => Err(AirtableError::Decode(format!(
                "no scripted response for {} {}",
                request.method.as_str(),
                request.url
            ))),
        }
    }
}

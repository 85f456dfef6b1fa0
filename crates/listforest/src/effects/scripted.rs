use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{status_error, RequestSpec, ResponseBody, Transport};
use crate::error::{ForestError, Result};

/// In-memory transport that answers requests from a queue, in order.
///
/// Every request is recorded, answered or not. When the queue runs dry the
/// request fails with a transport error naming it.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ResponseBody>>>,
    requests: Mutex<Vec<RequestSpec>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, response: Result<ResponseBody>) {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(response);
    }

    pub fn push_json(&self, value: Value) {
        self.push(Ok(ResponseBody::Json(value)));
    }

    pub fn push_empty(&self) {
        self.push(Ok(ResponseBody::Empty));
    }

    pub fn push_document(&self, html: impl Into<String>) {
        self.push(Ok(ResponseBody::Document { html: html.into() }));
    }

    pub fn push_error(&self, message: impl Into<String>) {
        self.push(Err(ForestError::Transport(message.into())));
    }

    /// Queues the failure a real transport would report for `status`.
    pub fn push_status(&self, status: u16, endpoint: &str, body: Option<Value>) {
        self.push(Err(status_error(status, endpoint, body.as_ref())));
    }

    pub fn with_json(self, value: Value) -> Self {
        self.push_json(value);
        self
    }

    pub fn with_empty(self) -> Self {
        self.push_empty();
        self
    }

    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.push_error(message);
        self
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<RequestSpec> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_request(&self) -> Option<RequestSpec> {
        self.requests().pop()
    }

    /// Queued responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, spec: RequestSpec) -> Result<ResponseBody> {
        tracing::debug!(method = %spec.method, endpoint = %spec.endpoint, "scripted request");
        let next = self
            .responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        let described = format!("{} {}", spec.method, spec.endpoint);
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(spec);
        next.unwrap_or_else(|| {
            Err(ForestError::Transport(format!(
                "No scripted response for {}",
                described
            )))
        })
    }
}

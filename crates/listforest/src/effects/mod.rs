//! # Effect Layer Contract
//!
//! The crate never talks to the network itself. Every command is described as
//! a [`RequestSpec`] and handed to a [`Transport`], which the embedding
//! application supplies. The transport owns everything below that line:
//! headers, tokens, cookies, retries (there are none by default).
//!
//! ## Responses
//!
//! A successful request yields a [`ResponseBody`], discriminated by content
//! type: JSON, an HTML document, or nothing. A failed request yields one
//! human-readable message in [`ForestError::Transport`]. Transports built on an
//! HTTP client can use [`status_error`] and [`response_from`] to produce
//! messages and bodies in the shape the commands expect.
//!
//! ## Testing
//!
//! [`scripted::ScriptedTransport`] replays queued responses and records every
//! request it was given.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::error::{ForestError, Result};

pub mod endpoints;
pub mod scripted;

pub use endpoints::Endpoints;
pub use scripted::ScriptedTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        write!(f, "{}", verb)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSpec {
    pub endpoint: String,
    pub method: Method,
    pub payload: Option<Value>,
    pub requires_auth: bool,
}

impl RequestSpec {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Get,
            payload: None,
            requires_auth: false,
        }
    }

    pub fn post(endpoint: impl Into<String>, payload: Value) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Post,
            payload: Some(payload),
            requires_auth: true,
        }
    }

    pub fn patch(endpoint: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Patch,
            payload,
            requires_auth: true,
        }
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Delete,
            payload: None,
            requires_auth: true,
        }
    }

    pub fn with_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    /// A server-rendered page rather than data.
    Document {
        html: String,
    },
    Empty,
}

impl ResponseBody {
    /// The JSON body, or a payload error naming what arrived instead.
    pub fn json(&self) -> Result<&Value> {
        match self {
            ResponseBody::Json(value) => Ok(value),
            ResponseBody::Document { .. } => Err(ForestError::Transport(
                "Expected JSON but received an HTML document".to_string(),
            )),
            ResponseBody::Empty => Err(ForestError::Transport(
                "Expected JSON but received an empty response".to_string(),
            )),
        }
    }
}

/// Carries one request to the server.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, spec: RequestSpec) -> Result<ResponseBody>;
}

/// Builds the failure message for a non-success HTTP status.
///
/// `body` is the parsed JSON error body, if any; its messages are joined into
/// one line.
pub fn status_error(status: u16, endpoint: &str, body: Option<&Value>) -> ForestError {
    let message = match status {
        404 => format!("Page not found: {}", endpoint),
        500 => format!("Internal server error: {}", endpoint),
        _ => match body.map(format_error_messages) {
            Some(joined) if !joined.is_empty() => joined,
            _ => format!("Request failed with status {}: {}", status, endpoint),
        },
    };
    ForestError::Transport(message)
}

/// Joins a server error body into one line.
///
/// `{"detail": "x"}` and `{"non_field_errors": ["x"]}` contribute their bare
/// messages; other fields are prefixed with the field name.
pub fn format_error_messages(body: &Value) -> String {
    fn messages(value: &Value) -> Vec<String> {
        match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(values) => values.iter().flat_map(messages).collect(),
            Value::Object(fields) => fields.values().flat_map(messages).collect(),
            Value::Null => Vec::new(),
            other => vec![other.to_string()],
        }
    }

    match body {
        Value::Object(fields) => fields
            .iter()
            .flat_map(|(field, value)| {
                let bare = field == "detail" || field == "non_field_errors";
                messages(value).into_iter().map(move |message| {
                    if bare {
                        message
                    } else {
                        format!("{}: {}", field, message)
                    }
                })
            })
            .collect::<Vec<_>>()
            .join(" "),
        other => messages(other).join(" "),
    }
}

/// Turns a successful response into a [`ResponseBody`] by content type.
pub fn response_from(content_type: &str, body: &str) -> Result<ResponseBody> {
    if content_type.contains("application/json") {
        let value = serde_json::from_str(body)
            .map_err(|e| ForestError::Transport(format!("Invalid JSON: {}", e)))?;
        Ok(ResponseBody::Json(value))
    } else if content_type.contains("text/html") {
        Ok(ResponseBody::Document {
            html: body.to_string(),
        })
    } else {
        Ok(ResponseBody::Empty)
    }
}

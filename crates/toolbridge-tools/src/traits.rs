//! Handler trait and upstream transport abstraction.
//!
//! Defines [`ToolHandler`], the contract every tool implements, and
//! [`UpstreamClient`], the single seam through which handlers reach external
//! services. Tests substitute the client to observe or forbid outbound calls.

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use toolbridge_core::ToolDescriptor;

use crate::errors::ToolError;
use crate::guard::WriteGuard;

// ─────────────────────────────────────────────────────────────────────────────
// Tool context
// ─────────────────────────────────────────────────────────────────────────────

/// Execution context passed to every handler invocation.
#[derive(Clone, Debug, Default)]
pub struct ToolContext {
    /// Correlation id supplied by the caller, if any.
    pub correlation_id: Option<String>,
    /// Process-wide write policy.
    pub guard: WriteGuard,
}

impl ToolContext {
    /// Create a context.
    pub fn new(correlation_id: Option<String>, guard: WriteGuard) -> Self {
        Self {
            correlation_id,
            guard,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ToolHandler trait
// ─────────────────────────────────────────────────────────────────────────────

/// One tool: a static descriptor plus an async invocation.
///
/// Handlers receive arguments that already passed schema validation. They
/// must resolve every failure to a [`ToolError`], make at most one logical
/// upstream call, and touch nothing but their client and the context.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name, description, input schema, and mutating flag.
    fn descriptor(&self) -> ToolDescriptor;

    /// Perform the tool's upstream operation.
    async fn invoke(&self, args: Map<String, Value>, ctx: &ToolContext)
    -> Result<Value, ToolError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Upstream transport
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP verbs used by the shipped handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// A single outbound HTTP request.
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamRequest {
    /// Verb.
    pub method: HttpMethod,
    /// Absolute URL without query string.
    pub url: String,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl UpstreamRequest {
    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// `GET url`
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// `POST url`
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add `Authorization: Bearer <token>`.
    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    /// Add a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of the first header named `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response from an upstream call.
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body parsed as JSON; non-JSON bodies become a string, empty ones `null`.
    pub body: Value,
}

impl UpstreamResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound HTTP transport used by every handler.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Send one request. Transport failures are errors; non-2xx responses are not.
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ToolError>;
}

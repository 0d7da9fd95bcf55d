//! In-memory upstream client that records requests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::errors::ToolError;
use crate::traits::{UpstreamClient, UpstreamRequest, UpstreamResponse};

/// Records every request and replies from a queue of canned responses.
///
/// When the queue is empty it answers `200 {}`.
#[derive(Default)]
pub struct RecordingClient {
    requests: Mutex<Vec<UpstreamRequest>>,
    responses: Mutex<VecDeque<UpstreamResponse>>,
}

impl RecordingClient {
    /// Create a client with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn push_response(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .push_back(UpstreamResponse { status, body });
    }

    /// Number of requests seen so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Copies of every request seen so far.
    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl UpstreamClient for RecordingClient {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ToolError> {
        self.requests.lock().push(request);
        Ok(self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| UpstreamResponse {
                status: 200,
                body: Value::Object(serde_json::Map::new()),
            }))
    }
}

//! Invocation dispatch: lookup, validate, invoke, normalize, broadcast.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use futures::FutureExt;
use serde_json::{Map, Value};
use toolbridge_core::logging::AUDIT_TARGET;
use toolbridge_core::{BridgeError, BroadcastEvent, InvocationRequest, InvocationResult};
use toolbridge_tools::{ToolContext, ToolRegistry, WriteGuard};
use tracing::{error, info, instrument, warn};

use crate::hub::BroadcastHub;
use crate::metrics::{TOOL_ERRORS_TOTAL, TOOL_INVOCATION_DURATION_SECONDS, TOOL_INVOCATIONS_TOTAL};

/// The single path every invocation takes, whichever transport it came from.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    hub: Arc<BroadcastHub>,
    guard: WriteGuard,
    timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new(
        registry: Arc<ToolRegistry>,
        hub: Arc<BroadcastHub>,
        guard: WriteGuard,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            hub,
            guard,
            timeout,
        }
    }

    /// The registry this dispatcher serves.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Run one invocation to completion.
    ///
    /// The result is computed once, published to the hub as `tool_result` or
    /// `tool_error`, then returned. Pre-dispatch rejections are published
    /// too. Never panics on handler failure.
    #[instrument(skip_all, fields(tool = %request.tool, correlation_id = ?request.correlation_id))]
    pub async fn invoke(&self, request: InvocationRequest) -> InvocationResult {
        let started = Instant::now();
        let InvocationRequest {
            tool,
            args,
            correlation_id,
        } = request;

        let result = self.execute(&tool, args, correlation_id.clone()).await;

        let _ = self
            .hub
            .publish(&BroadcastEvent::from_result(&tool, correlation_id, &result));
        record(&tool, &result, started.elapsed());
        result
    }

    async fn execute(
        &self,
        tool: &str,
        args: Map<String, Value>,
        correlation_id: Option<String>,
    ) -> InvocationResult {
        let Some(entry) = self.registry.lookup(tool) else {
            return Err(BridgeError::UnknownTool { tool: tool.into() });
        };
        let args = entry
            .validator()
            .validate(args)
            .map_err(|errors| BridgeError::Validation {
                tool: tool.into(),
                errors,
            })?;

        let ctx = ToolContext::new(correlation_id, self.guard);
        let call = AssertUnwindSafe(entry.handler().invoke(args, &ctx)).catch_unwind();
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(Ok(payload))) => Ok(payload),
            Ok(Ok(Err(e))) => Err(e.into_bridge(tool)),
            Ok(Err(_panic)) => {
                error!(tool, "tool handler panicked");
                Err(BridgeError::Internal {
                    tool: tool.into(),
                    message: "Tool handler failed unexpectedly".into(),
                })
            }
            Err(_elapsed) => {
                warn!(tool, timeout_ms = self.timeout.as_millis(), "tool invocation timed out");
                Err(BridgeError::Internal {
                    tool: tool.into(),
                    message: format!("Tool timed out after {}ms", self.timeout.as_millis()),
                })
            }
        }
    }
}

/// Emit one audit record on the `audit` target.
pub(crate) fn audit(action: &str, tool: Option<&str>, outcome: &str, elapsed: Duration) {
    info!(
        target: AUDIT_TARGET,
        ts = %Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        action,
        tool = tool.unwrap_or("-"),
        outcome,
        duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
    );
}

fn record(tool: &str, result: &InvocationResult, elapsed: Duration) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind().as_str(),
    };
    audit("tool.invoke", Some(tool), outcome, elapsed);

    // Unknown names come from callers; keep them out of label values.
    let label = match result {
        Err(BridgeError::UnknownTool { .. }) => "unknown".to_owned(),
        _ => tool.to_owned(),
    };
    ::metrics::counter!(TOOL_INVOCATIONS_TOTAL, "tool" => label.clone(), "outcome" => outcome)
        .increment(1);
    if let Err(e) = result {
        ::metrics::counter!(TOOL_ERRORS_TOTAL, "tool" => label.clone(), "kind" => e.kind().as_str())
            .increment(1);
    }
    ::metrics::histogram!(TOOL_INVOCATION_DURATION_SECONDS, "tool" => label)
        .record(elapsed.as_secs_f64());
}

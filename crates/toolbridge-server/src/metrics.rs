//! Prometheus metrics recorder and metric names.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the global Prometheus recorder.
///
/// Returns the handle used to render `/metrics`. Fails if a recorder is
/// already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Tool invocations (counter, labels: tool, outcome).
pub const TOOL_INVOCATIONS_TOTAL: &str = "tool_invocations_total";
/// Failed invocations (counter, labels: tool, kind).
pub const TOOL_ERRORS_TOTAL: &str = "tool_errors_total";
/// Invocation latency (histogram, labels: tool).
pub const TOOL_INVOCATION_DURATION_SECONDS: &str = "tool_invocation_duration_seconds";
/// Registered SSE subscribers (gauge).
pub const SSE_SUBSCRIBERS_ACTIVE: &str = "sse_subscribers_active";
/// Frames lost to full subscriber queues (counter).
pub const SSE_BROADCAST_DROPS_TOTAL: &str = "sse_broadcast_drops_total";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_recorder_renders() {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let output = handle.render();
        assert!(output.is_empty() || output.contains('\n'));
    }

    #[test]
    fn metric_names_are_snake_case() {
        for name in [
            TOOL_INVOCATIONS_TOTAL,
            TOOL_ERRORS_TOTAL,
            TOOL_INVOCATION_DURATION_SECONDS,
            SSE_SUBSCRIBERS_ACTIVE,
            SSE_BROADCAST_DROPS_TOTAL,
        ] {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
        }
    }
}

//! End-to-end tests against a real listener using `reqwest`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::timeout;
use toolbridge_server::{BridgeServer, ServerConfig};
use toolbridge_settings::UpstreamSettings;
use toolbridge_tools::providers::RecordingClient;
use toolbridge_tools::{UpstreamClient, WriteGuard, builtin_registry};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn boot(config: ServerConfig) -> (String, Arc<BridgeServer>, Arc<RecordingClient>) {
    let client = Arc::new(RecordingClient::new());
    let upstream: Arc<dyn UpstreamClient> = client.clone();
    let registry = builtin_registry(&UpstreamSettings::default(), upstream).unwrap();
    let server = Arc::new(BridgeServer::new(config, registry, WriteGuard::closed()));
    let addr = server.listen().await.unwrap();
    (format!("http://{addr}"), server, client)
}

/// Incremental SSE reader over a streaming response.
struct SseReader {
    response: reqwest::Response,
    buffer: String,
}

impl SseReader {
    /// Next `(event, data)` pair; comments are skipped.
    async fn next_event(&mut self) -> Option<(String, String)> {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let block: String = self.buffer.drain(..end + 2).collect();
                let mut event = String::from("message");
                let mut data = String::new();
                for line in block.lines() {
                    if let Some(v) = line.strip_prefix("event:") {
                        event = v.trim().to_owned();
                    } else if let Some(v) = line.strip_prefix("data:") {
                        data.push_str(v.trim_start());
                    }
                }
                if data.is_empty() && event == "message" {
                    continue;
                }
                return Some((event, data));
            }
            let chunk = self.response.chunk().await.ok()??;
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    }

    async fn expect(&mut self, name: &str) -> Value {
        loop {
            let (event, data) = timeout(TIMEOUT, self.next_event())
                .await
                .expect("timed out waiting for event")
                .expect("stream ended");
            if event == name {
                return serde_json::from_str(&data).unwrap();
            }
        }
    }
}

async fn open_stream(http: &reqwest::Client, base: &str) -> SseReader {
    let response = http.get(format!("{base}/sse")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );
    SseReader {
        response,
        buffer: String::new(),
    }
}

async fn wait_for_subscribers(server: &BridgeServer, expected: usize) {
    timeout(TIMEOUT, async {
        while server.hub().subscriber_count() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscriber count never settled");
}

#[tokio::test]
async fn stream_starts_with_comment_then_manifest() {
    let (base, server, _client) = boot(ServerConfig::default()).await;
    let http = reqwest::Client::new();
    let mut reader = open_stream(&http, &base).await;

    // The "ok" comment arrives before any event.
    while !reader.buffer.contains("\n\n") {
        let chunk = timeout(TIMEOUT, reader.response.chunk()).await.unwrap().unwrap().unwrap();
        reader.buffer.push_str(&String::from_utf8_lossy(&chunk));
    }
    let first = reader.buffer.lines().next().unwrap();
    assert!(first.starts_with(':') && first.contains("ok"), "{first}");

    let manifest = reader.expect("manifest").await;
    let tools = manifest["tools"].as_array().unwrap();
    assert_eq!(tools[0]["name"], "ping");
    assert!(tools.iter().any(|t| t["name"] == "discord.sendMessage" && t["mutating"] == true));
    assert!(tools[0]["input_schema"].is_object());

    server.shutdown().trigger();
}

#[tokio::test]
async fn invocation_is_broadcast_to_every_subscriber() {
    let (base, server, _client) = boot(ServerConfig::default()).await;
    let http = reqwest::Client::new();
    let mut a = open_stream(&http, &base).await;
    let mut b = open_stream(&http, &base).await;
    let _ = a.expect("manifest").await;
    let _ = b.expect("manifest").await;

    let direct: Value = http
        .post(format!("{base}/invoke"))
        .json(&json!({"tool": "ping", "args": {}, "stream_id": "corr-1"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(direct["pong"], true);

    for reader in [&mut a, &mut b] {
        let event = reader.expect("tool_result").await;
        assert_eq!(event["correlation_id"], "corr-1");
        assert_eq!(event["tool"], "ping");
        assert_eq!(event["payload"], direct);
    }

    server.shutdown().trigger();
}

#[tokio::test]
async fn blocked_write_is_broadcast_as_tool_error() {
    let (base, server, client) = boot(ServerConfig::default()).await;
    let http = reqwest::Client::new();
    let mut reader = open_stream(&http, &base).await;
    let _ = reader.expect("manifest").await;

    let resp = http
        .post(format!("{base}/invoke"))
        .json(&json!({"tool": "discord.sendMessage", "args": {"content": "hi"}, "stream_id": "w-1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let event = reader.expect("tool_error").await;
    assert_eq!(event["correlation_id"], "w-1");
    assert_eq!(event["payload"]["kind"], "write_disabled");
    assert_eq!(client.call_count(), 0);

    server.shutdown().trigger();
}

#[tokio::test]
async fn disconnected_subscriber_is_removed() {
    // Short keep-alive so the server notices the closed socket on its next write.
    let config = ServerConfig {
        keepalive_interval: Duration::from_millis(50),
        ..ServerConfig::default()
    };
    let (base, server, _client) = boot(config).await;
    let http = reqwest::Client::new();
    let mut keep = open_stream(&http, &base).await;
    let mut gone = open_stream(&http, &base).await;
    let _ = keep.expect("manifest").await;
    let _ = gone.expect("manifest").await;
    wait_for_subscribers(&server, 2).await;

    drop(gone);
    wait_for_subscribers(&server, 1).await;

    let health: Value = http
        .get(format!("{base}/healthz"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["subscribers"], 1);

    server.shutdown().trigger();
}

#[tokio::test]
async fn keepalive_pings_arrive() {
    let config = ServerConfig {
        keepalive_interval: Duration::from_millis(50),
        ..ServerConfig::default()
    };
    let (base, server, _client) = boot(config).await;
    let http = reqwest::Client::new();
    let mut reader = open_stream(&http, &base).await;
    let _ = reader.expect("manifest").await;

    let ping = reader.expect("ping").await;
    assert_eq!(ping, json!({}));

    server.shutdown().trigger();
}

#[tokio::test]
async fn shutdown_ends_open_streams() {
    let (base, server, _client) = boot(ServerConfig::default()).await;
    let http = reqwest::Client::new();
    let mut reader = open_stream(&http, &base).await;
    let _ = reader.expect("manifest").await;

    server.shutdown().trigger();
    let ended = timeout(TIMEOUT, async {
        while reader.next_event().await.is_some() {}
    })
    .await;
    assert!(ended.is_ok());
    wait_for_subscribers(&server, 0).await;
}

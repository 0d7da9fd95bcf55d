//! `/sse`: the subscriber stream and its method contract.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::{self, Stream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::hub::{BroadcastHub, Frame, run_keepalive};
use crate::server::AppState;

const ALLOW: &str = "GET,OPTIONS";

/// Removes the subscriber and stops its keep-alive when the response
/// stream is dropped.
struct Subscription {
    hub: Arc<BroadcastHub>,
    id: String,
    keepalive: CancellationToken,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.keepalive.cancel();
        self.hub.unsubscribe(&self.id);
    }
}

fn to_event(frame: &Frame) -> Event {
    Event::default().event(&frame.event).data(&frame.data)
}

/// `GET /sse`: `: ok`, then `manifest`, then broadcasts and pings until the
/// client goes away or the server shuts down.
pub async fn stream(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (conn, rx) = state.hub.subscribe();
    let _ = conn.send(state.manifest.clone());
    let _ = conn.activate();

    let keepalive = state.shutdown.child_token();
    let _ = tokio::spawn(run_keepalive(
        conn.clone(),
        state.hub.clone(),
        state.config.keepalive_interval,
        keepalive.clone(),
    ));
    let subscription = Subscription {
        hub: state.hub.clone(),
        id: conn.id.clone(),
        keepalive,
    };

    let hello = stream::once(async { Ok::<_, Infallible>(Event::default().comment("ok")) });
    let frames = ReceiverStream::new(rx).map(move |frame| {
        let _alive = &subscription;
        Ok::<_, Infallible>(to_event(&frame))
    });
    Sse::new(
        hello
            .chain(frames)
            .take_until(state.shutdown.clone().cancelled_owned()),
    )
}

/// `HEAD /sse`: stream headers, no body, no subscription.
pub async fn head() -> Response {
    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();
    let _ = headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    let _ = headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

/// `OPTIONS /sse`.
pub async fn options() -> Response {
    (StatusCode::NO_CONTENT, [(header::ALLOW, ALLOW)]).into_response()
}

/// `POST /sse`.
pub async fn post_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, ALLOW)],
        "Method Not Allowed",
    )
        .into_response()
}

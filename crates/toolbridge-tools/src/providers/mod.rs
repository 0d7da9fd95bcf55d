//! Concrete [`UpstreamClient`](crate::traits::UpstreamClient) implementations.

pub mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod recording;

pub use http::ReqwestUpstreamClient;
#[cfg(any(test, feature = "test-util"))]
pub use recording::RecordingClient;

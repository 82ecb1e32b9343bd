use thiserror::Error;

/// Transport-layer failures on connect, bind, send, or receive.
///
/// The `source` fields are boxed as a generic `std::error::Error` rather
/// than pinned to `zeromq::ZmqError` so that an in-memory transport (no
/// `zeromq` dependency at all) can report failures through the same
/// taxonomy as the real backend.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind router endpoint {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to connect dealer to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("send failed: {0}")]
    Send(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("receive failed: {0}")]
    Recv(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("expected a [identity, payload] frame pair, got {frame_count} frames")]
    UnexpectedFrameCount { frame_count: usize },
    #[error("transport is closed")]
    Closed,
}

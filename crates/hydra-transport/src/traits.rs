use async_trait::async_trait;

use crate::error::TransportError;

/// The router side of the dealer/router transport: binds one endpoint,
/// receives `[identity, payload]` frame pairs from any number of connected
/// dealers, and can reply to a specific identity.
///
/// The broker depends only on this trait, never on `zeromq` types
/// directly, so `hydra-test-support`'s in-memory transport is a drop-in
/// substitute in tests.
#[async_trait]
pub trait RouterTransport: Send + Sync + 'static {
    async fn bind(endpoint: &str) -> Result<Self, TransportError>
    where
        Self: Sized;

    /// Receives the next multipart frame group. A frame count other than
    /// two is a protocol-level curiosity, not a transport failure, so it is
    /// returned as `Ok` with the raw frames for the caller to judge -- the
    /// broker logs a frame-error diagnostic and moves on.
    async fn recv_multipart(&mut self) -> Result<(Vec<u8>, Vec<Vec<u8>>), TransportError>;

    async fn send_multipart(&mut self, identity: &[u8], payload: Vec<u8>)
        -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// The dealer side: connects to a router endpoint, sends single frames,
/// and receives single frames -- the identity framing is invisible to a
/// dealer.
#[async_trait]
pub trait DealerTransport: Send + Sync + 'static {
    async fn connect(endpoint: &str) -> Result<Self, TransportError>
    where
        Self: Sized;

    async fn send(&mut self, payload: Vec<u8>) -> Result<(), TransportError>;

    async fn recv(&mut self) -> Result<Vec<u8>, TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

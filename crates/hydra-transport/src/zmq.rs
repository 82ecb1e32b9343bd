use async_trait::async_trait;
use zeromq::prelude::*;
use zeromq::{DealerSocket, RouterSocket, ZmqMessage};

use crate::error::TransportError;
use crate::traits::{DealerTransport, RouterTransport};

/// ROUTER-socket transport backed by the pure-Rust `zeromq` crate.
///
/// Framing (zeromq-rs): a ROUTER `recv` prepends the peer identity as the
/// first frame; a ROUTER `send` expects identity as the first frame and
/// pops it before delivery. So a dealer sending a single payload frame
/// arrives here as exactly two frames: `[identity, payload]`.
pub struct ZmqRouterTransport {
    socket: RouterSocket,
}

#[async_trait]
impl RouterTransport for ZmqRouterTransport {
    async fn bind(endpoint: &str) -> Result<Self, TransportError> {
        let mut socket = RouterSocket::new();
        socket
            .bind(endpoint)
            .await
            .map_err(|source| TransportError::Bind {
                endpoint: endpoint.to_owned(),
                source: Box::new(source),
            })?;
        Ok(Self { socket })
    }

    async fn recv_multipart(&mut self) -> Result<(Vec<u8>, Vec<Vec<u8>>), TransportError> {
        let msg = self
            .socket
            .recv()
            .await
            .map_err(|e| TransportError::Recv(Box::new(e)))?;
        let mut frames: Vec<Vec<u8>> = msg.iter().map(|f| f.as_ref().to_vec()).collect();
        if frames.is_empty() {
            return Err(TransportError::UnexpectedFrameCount { frame_count: 0 });
        }
        let identity = frames.remove(0);
        Ok((identity, frames))
    }

    async fn send_multipart(
        &mut self,
        identity: &[u8],
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        let mut msg = ZmqMessage::from(identity.to_vec());
        msg.push_back(payload.into());
        self.socket
            .send(msg)
            .await
            .map_err(|e| TransportError::Send(Box::new(e)))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// DEALER-socket transport backed by `zeromq`. Identity framing is
/// invisible on the dealer side -- it sends and receives single payload
/// frames.
pub struct ZmqDealerTransport {
    socket: DealerSocket,
}

#[async_trait]
impl DealerTransport for ZmqDealerTransport {
    async fn connect(endpoint: &str) -> Result<Self, TransportError> {
        let mut socket = DealerSocket::new();
        socket
            .connect(endpoint)
            .await
            .map_err(|source| TransportError::Connect {
                endpoint: endpoint.to_owned(),
                source: Box::new(source),
            })?;
        Ok(Self { socket })
    }

    async fn send(&mut self, payload: Vec<u8>) -> Result<(), TransportError> {
        let msg = ZmqMessage::from(payload);
        self.socket
            .send(msg)
            .await
            .map_err(|e| TransportError::Send(Box::new(e)))
    }

    async fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        let msg = self
            .socket
            .recv()
            .await
            .map_err(|e| TransportError::Recv(Box::new(e)))?;
        let frames: Vec<_> = msg.iter().collect();
        let payload = frames
            .last()
            .ok_or(TransportError::UnexpectedFrameCount { frame_count: 0 })?;
        Ok(payload.as_ref().to_vec())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

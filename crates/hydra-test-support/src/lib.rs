//! An in-memory `RouterTransport`/`DealerTransport` pair, so broker and
//! peer integration tests can exercise real dealer/router semantics --
//! identity-tagged delivery, independent send/recv directions -- without a
//! live `zeromq` context or a socket.
//!
//! A process-wide registry maps an endpoint string to a shared hub;
//! `MockRouterTransport::bind` creates the hub, `MockDealerTransport::
//! connect` looks it up by the same string. Each dealer is assigned a
//! fresh identity on connect, mirroring a real ROUTER socket handing out
//! stable per-connection identities.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use hydra_transport::{DealerTransport, RouterTransport, TransportError};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Error)]
enum MockError {
    #[error("address {0:?} is already bound")]
    AlreadyBound(String),
    #[error("no router bound at {0:?}")]
    NotBound(String),
    #[error("peer has disconnected")]
    Disconnected,
}

struct Hub {
    router_tx: mpsc::UnboundedSender<(Vec<u8>, Vec<u8>)>,
    dealers: Mutex<HashMap<Vec<u8>, mpsc::UnboundedSender<Vec<u8>>>>,
}

fn registry() -> &'static Mutex<HashMap<String, Arc<Hub>>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, Arc<Hub>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Builds a fresh, collision-free endpoint string for a test, so tests
/// running concurrently in the same process never share a hub by
/// accident.
pub fn unique_endpoint(label: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("inproc://{label}-{n}")
}

/// The router side of an in-memory dealer/router pair.
pub struct MockRouterTransport {
    endpoint: String,
    inbound_rx: mpsc::UnboundedReceiver<(Vec<u8>, Vec<u8>)>,
    hub: Arc<Hub>,
}

#[async_trait]
impl RouterTransport for MockRouterTransport {
    async fn bind(endpoint: &str) -> Result<Self, TransportError> {
        let mut reg = registry().lock().expect("mock transport registry poisoned");
        if reg.contains_key(endpoint) {
            return Err(TransportError::Bind {
                endpoint: endpoint.to_owned(),
                source: Box::new(MockError::AlreadyBound(endpoint.to_owned())),
            });
        }
        let (router_tx, inbound_rx) = mpsc::unbounded_channel();
        let hub = Arc::new(Hub {
            router_tx,
            dealers: Mutex::new(HashMap::new()),
        });
        reg.insert(endpoint.to_owned(), Arc::clone(&hub));
        Ok(Self {
            endpoint: endpoint.to_owned(),
            inbound_rx,
            hub,
        })
    }

    async fn recv_multipart(&mut self) -> Result<(Vec<u8>, Vec<Vec<u8>>), TransportError> {
        match self.inbound_rx.recv().await {
            Some((identity, payload)) => Ok((identity, vec![payload])),
            None => Err(TransportError::Closed),
        }
    }

    async fn send_multipart(
        &mut self,
        identity: &[u8],
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        let dealers = self.hub.dealers.lock().expect("mock transport registry poisoned");
        let tx = dealers
            .get(identity)
            .ok_or_else(|| TransportError::Send(Box::new(MockError::Disconnected)))?;
        tx.send(payload)
            .map_err(|_| TransportError::Send(Box::new(MockError::Disconnected)))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        registry()
            .lock()
            .expect("mock transport registry poisoned")
            .remove(&self.endpoint);
        Ok(())
    }
}

/// The dealer side of an in-memory dealer/router pair.
pub struct MockDealerTransport {
    identity: Vec<u8>,
    hub: Arc<Hub>,
    inbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

#[async_trait]
impl DealerTransport for MockDealerTransport {
    async fn connect(endpoint: &str) -> Result<Self, TransportError> {
        let hub = {
            let reg = registry().lock().expect("mock transport registry poisoned");
            reg.get(endpoint)
                .cloned()
                .ok_or_else(|| TransportError::Connect {
                    endpoint: endpoint.to_owned(),
                    source: Box::new(MockError::NotBound(endpoint.to_owned())),
                })?
        };
        let identity = Uuid::new_v4().as_bytes().to_vec();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        hub.dealers
            .lock()
            .expect("mock transport registry poisoned")
            .insert(identity.clone(), inbound_tx);
        Ok(Self {
            identity,
            hub,
            inbound_rx,
        })
    }

    async fn send(&mut self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.hub
            .router_tx
            .send((self.identity.clone(), payload))
            .map_err(|_| TransportError::Send(Box::new(MockError::Disconnected)))
    }

    async fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        self.inbound_rx.recv().await.ok_or(TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.hub
            .dealers
            .lock()
            .expect("mock transport registry poisoned")
            .remove(&self.identity);
        Ok(())
    }
}

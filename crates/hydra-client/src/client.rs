use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hydra_protocol::{Data, Envelope, Message, MessageKind};
use hydra_transport::{DealerTransport, TransportError};
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ClientError;

type HandlerFn = Box<dyn Fn(Message) + Send + Sync>;
type PendingTable = Arc<Mutex<HashMap<String, oneshot::Sender<Result<Message, ClientError>>>>>;
type HandlerTable = Arc<RwLock<HashMap<MessageKind, HandlerFn>>>;

/// A connected session's background-task handles and the channel used to
/// hand it outbound bytes. Dropping this without calling `disconnect`
/// leaves the tasks running; `disconnect` aborts them explicitly.
struct ConnectedState {
    outbound_tx: mpsc::Sender<Vec<u8>>,
    io_handle: tokio::task::JoinHandle<()>,
    heartbeat_handle: tokio::task::JoinHandle<()>,
    alive: Arc<AtomicBool>,
}

/// The peer-side session over a dealer socket: connect/disconnect, fire-
/// and-forget sends, correlated request/response, and an unsolicited
/// message dispatch table keyed by kind.
///
/// A single background task owns the dealer socket for the lifetime of the
/// connection and is the only thing that ever calls into it; `send`,
/// `request`, and the heartbeat loop all hand it outbound bytes over a
/// channel instead of touching the socket themselves.
pub struct MQClient<D: DealerTransport> {
    config: ClientConfig,
    state: Mutex<Option<ConnectedState>>,
    pending: PendingTable,
    handlers: HandlerTable,
    _transport: PhantomData<D>,
}

impl<D: DealerTransport> MQClient<D> {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            state: Mutex::new(None),
            pending: Arc::new(Mutex::new(HashMap::new())),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            _transport: PhantomData,
        }
    }

    /// Opens the dealer socket, sends an initial heartbeat, and starts the
    /// background heartbeat and receive loops. A second call while already
    /// connected is a no-op.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let mut guard = self.state.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        self.config.validate()?;

        let socket = D::connect(&self.config.router_address).await?;
        let (outbound_tx, outbound_rx) = mpsc::channel::<Vec<u8>>(256);
        let alive = Arc::new(AtomicBool::new(true));

        let io_handle = tokio::spawn(Self::io_loop(
            socket,
            outbound_rx,
            Arc::clone(&self.pending),
            Arc::clone(&self.handlers),
            Arc::clone(&alive),
        ));

        let heartbeat_handle = tokio::spawn(Self::heartbeat_loop(
            outbound_tx.clone(),
            self.config.peer_type,
            self.config.resolved_client_id(),
            self.config.heartbeat_interval,
            Arc::clone(&alive),
        ));

        *guard = Some(ConnectedState {
            outbound_tx,
            io_handle,
            heartbeat_handle,
            alive,
        });
        drop(guard);

        self.send(Message::new(MessageKind::Heartbeat).with_client_id(self.config.resolved_client_id()))
            .await
    }

    /// Stops the background tasks, closes the socket, and resolves every
    /// still-pending `request()` call with `ClientError::Cancelled`.
    pub async fn disconnect(&self) {
        let mut guard = self.state.lock().await;
        if let Some(state) = guard.take() {
            state.alive.store(false, Ordering::Release);
            state.heartbeat_handle.abort();
            state.io_handle.abort();
        }
        drop(guard);

        let mut pending = self.pending.lock().await;
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(ClientError::Cancelled("disconnected".into())));
        }
    }

    /// Sends a message without waiting for a reply.
    pub async fn send(&self, message: Message) -> Result<(), ClientError> {
        let envelope = message.into_envelope(self.config.peer_type)?;
        let bytes = envelope.to_bytes()?;
        let guard = self.state.lock().await;
        let Some(state) = guard.as_ref() else {
            return Err(ClientError::Cancelled("not connected".into()));
        };
        state
            .outbound_tx
            .send(bytes)
            .await
            .map_err(|_| ClientError::Cancelled("receive loop has exited".into()))
    }

    /// Sends a message carrying a fresh request_id and awaits the reply
    /// correlated by that id, up to `timeout` -- or, when `timeout` is
    /// `None`, up to `config.request_timeout_default`. The pending slot is
    /// removed on every exit path, including timeout and send failure.
    pub async fn request(
        &self,
        kind: MessageKind,
        data: Option<Data>,
        timeout: Option<Duration>,
    ) -> Result<Message, ClientError> {
        let timeout = timeout.unwrap_or(self.config.request_timeout_default);
        let request_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id.clone(), tx);

        let mut message = Message::new(kind).with_request_id(request_id.clone());
        if let Some(data) = data {
            message = message.with_data(data);
        }

        if let Err(e) = self.send(message).await {
            self.pending.lock().await.remove(&request_id);
            return Err(e);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                self.pending.lock().await.remove(&request_id);
                Err(ClientError::Cancelled("pending request slot was dropped".into()))
            }
            Err(_) => {
                self.pending.lock().await.remove(&request_id);
                Err(ClientError::Timeout(timeout))
            }
        }
    }

    /// Installs (or replaces) the handler invoked for unsolicited inbound
    /// messages of the given kind -- anything without a matching pending
    /// `request_id`.
    pub async fn register_handler<F>(&self, kind: MessageKind, handler: F)
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        self.handlers.write().await.insert(kind, Box::new(handler));
    }

    /// Shorthand for a `ClientRegistryRequest`/`ClientRegistryResponse` round
    /// trip. `timeout` behaves as in [`Self::request`].
    pub async fn query_registry(&self, timeout: Option<Duration>) -> Result<Message, ClientError> {
        self.request(MessageKind::ClientRegistryRequest, None, timeout)
            .await
    }

    async fn heartbeat_loop(
        outbound_tx: mpsc::Sender<Vec<u8>>,
        peer_type: hydra_protocol::PeerType,
        client_id: String,
        interval: Duration,
        alive: Arc<AtomicBool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // the connect-time heartbeat already covered t=0
        loop {
            ticker.tick().await;
            if !alive.load(Ordering::Acquire) {
                break;
            }
            let message = Message::new(MessageKind::Heartbeat).with_client_id(client_id.clone());
            let envelope = match message.into_envelope(peer_type) {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "failed to build heartbeat envelope");
                    continue;
                }
            };
            let bytes = match envelope.to_bytes() {
                Ok(b) => b,
                Err(e) => {
                    warn!(error = %e, "failed to serialize heartbeat");
                    continue;
                }
            };
            if outbound_tx.send(bytes).await.is_err() {
                break;
            }
        }
    }

    async fn io_loop(
        mut socket: D,
        mut outbound_rx: mpsc::Receiver<Vec<u8>>,
        pending: PendingTable,
        handlers: HandlerTable,
        alive: Arc<AtomicBool>,
    ) {
        loop {
            tokio::select! {
                outgoing = outbound_rx.recv() => {
                    match outgoing {
                        Some(bytes) => {
                            if let Err(e) = socket.send(bytes).await {
                                warn!(error = %e, "dealer send failed");
                            }
                        }
                        None => break,
                    }
                }
                incoming = socket.recv() => {
                    match incoming {
                        Ok(bytes) => Self::handle_inbound(bytes, &pending, &handlers).await,
                        Err(e) => {
                            warn!(error = %e, "dealer recv failed; tearing down session");
                            alive.store(false, Ordering::Release);
                            let message = e.to_string();
                            let mut pending = pending.lock().await;
                            for (_, tx) in pending.drain() {
                                let source = std::io::Error::other(message.clone());
                                let err = TransportError::Recv(Box::new(source));
                                let _ = tx.send(Err(ClientError::Connection(err)));
                            }
                            break;
                        }
                    }
                }
            }
        }
        let _ = socket.close().await;
    }

    async fn handle_inbound(bytes: Vec<u8>, pending: &PendingTable, handlers: &HandlerTable) {
        let envelope: Envelope = match serde_json::from_slice(&bytes) {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "failed to parse inbound envelope; dropping");
                return;
            }
        };
        let message = Message::from_envelope(envelope);

        if let Some(request_id) = message.request_id.clone() {
            let mut pending = pending.lock().await;
            if let Some(tx) = pending.remove(&request_id) {
                let _ = tx.send(Ok(message));
                return;
            }
        }

        let handlers = handlers.read().await;
        if let Some(handler) = handlers.get(&message.kind) {
            handler(message);
        } else {
            debug!(kind = %message.kind, "no handler registered for unsolicited message; dropping");
        }
    }
}

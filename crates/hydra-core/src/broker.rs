use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use hydra_protocol::{Envelope, PeerType};
use hydra_transport::RouterTransport;
use serde_json::Value;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::BrokerConfig;
use crate::identity::PeerIdentity;
use crate::registry::Registry;
use crate::routing::{self, RouteAction};
use crate::validator;

/// Bounded grace period for awaiting background tasks on shutdown.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// The broker loop: owns the transport router endpoint and the registry,
/// runs accept-and-dispatch plus a periodic prune task, and never crashes
/// the loop on a single malformed input or downstream send failure.
pub struct Broker<T: RouterTransport> {
    transport: T,
    registry: Arc<Registry>,
    config: BrokerConfig,
    error_counts: Arc<RwLock<HashMap<PeerIdentity, u64>>>,
}

impl<T: RouterTransport> Broker<T> {
    pub fn new(transport: T, config: BrokerConfig) -> Self {
        let strict = false;
        Self {
            transport,
            registry: Arc::new(if strict {
                Registry::with_strict_client_ids(true)
            } else {
                Registry::new()
            }),
            config,
            error_counts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Exposes the registry, primarily so integration tests and an admin
    /// surface can inspect broker state without going through the wire.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Runs the accept-and-dispatch loop and the prune task concurrently
    /// until `shutdown` reports `true`. Both activities then stop
    /// accepting new work and the prune task is awaited with a bounded
    /// grace period; anything still running past that is abandoned.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let registry = Arc::clone(&self.registry);
        let timeout = self.config.client_timeout;
        let interval = self.config.heartbeat_check_interval;
        let prune_shutdown = shutdown.clone();

        let prune_task = tokio::spawn(async move {
            Self::prune_loop(registry, timeout, interval, prune_shutdown).await;
        });

        self.accept_loop(&mut shutdown).await;

        match tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, prune_task).await {
            Ok(Ok(())) => info!("prune task exited cleanly"),
            Ok(Err(e)) => error!(error = %e, "prune task panicked"),
            Err(_) => warn!("prune task did not exit within the shutdown grace period; abandoning"),
        }

        if let Err(e) = self.transport.close().await {
            warn!(error = %e, "error closing router transport on shutdown");
        }
    }

    async fn accept_loop(&mut self, shutdown: &mut watch::Receiver<bool>) {
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("broker accept loop stopping for shutdown");
                        break;
                    }
                }
                recv = self.transport.recv_multipart() => {
                    match recv {
                        Ok((identity_bytes, frames)) => {
                            self.handle_frames(identity_bytes, frames).await;
                        }
                        Err(e) => {
                            error!(error = %e, "router transport recv failed; stopping accept loop");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle_frames(&mut self, identity_bytes: Vec<u8>, frames: Vec<Vec<u8>>) {
        let identity = PeerIdentity(identity_bytes);

        if frames.len() != 1 {
            warn!(
                identity = %identity,
                frame_count = frames.len() + 1,
                "dropping envelope: expected exactly 2 multipart frames [identity, payload]"
            );
            self.count_error(&identity).await;
            return;
        }
        let payload = &frames[0];

        let value: Value = match serde_json::from_slice(payload) {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    identity = %identity,
                    error = %e,
                    body = %String::from_utf8_lossy(&payload[..payload.len().min(500)]),
                    "dropping envelope: JSON parse failed"
                );
                self.count_error(&identity).await;
                return;
            }
        };

        let envelope = match validator::validate(&value, payload, self.config.max_message_bytes) {
            Ok(e) => e,
            Err(diagnostic) => {
                warn!(
                    identity = %identity,
                    rule = %diagnostic.rule,
                    observed_fields = ?diagnostic.observed_fields,
                    body = %diagnostic.truncated_body,
                    "dropping envelope: validation failed"
                );
                self.count_error(&identity).await;
                return;
            }
        };

        let Some(sender_type) = PeerType::parse_inbound(&envelope.sender) else {
            unreachable!("validator already rejected senders outside ValidPeerTypes")
        };

        if let Err(e) = self
            .registry
            .observe(
                identity.clone(),
                sender_type,
                envelope.client_id.clone(),
                envelope.timestamp,
            )
            .await
        {
            warn!(identity = %identity, error = %e, "dropping envelope: registry rejected it");
            self.count_error(&identity).await;
            return;
        }

        let snapshot = self.registry.snapshot().await;
        let actions = routing::route(&envelope, &identity, &snapshot);
        for action in actions {
            self.dispatch(action).await;
        }
    }

    async fn dispatch(&mut self, action: RouteAction) {
        match action {
            RouteAction::None => {}
            RouteAction::Deliver { to, envelope } => {
                self.send_one(&to, &envelope).await;
            }
            RouteAction::Broadcast { to, envelope } => {
                // Best-effort per recipient: one failure must not abort the
                // rest.
                for recipient in to {
                    self.send_one(&recipient, &envelope).await;
                }
            }
        }
    }

    async fn send_one(&mut self, to: &PeerIdentity, envelope: &Envelope) {
        let bytes = match envelope.to_bytes() {
            Ok(b) => b,
            Err(e) => {
                error!(error = %e, "failed to serialize outbound envelope; dropping");
                return;
            }
        };
        if let Err(e) = self.transport.send_multipart(&to.0, bytes).await {
            // Transport send errors are logged, never cause eviction --
            // the peer will be evicted by the usual heartbeat rule if it's
            // actually gone.
            warn!(to = %to, error = %e, "send failed");
        } else {
            debug!(to = %to, elem = %envelope.elem, "sent");
        }
    }

    async fn count_error(&self, identity: &PeerIdentity) {
        let mut counts = self.error_counts.write().await;
        *counts.entry(identity.clone()).or_insert(0) += 1;
    }

    async fn prune_loop(
        registry: Arc<Registry>,
        timeout: Duration,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately; skip it
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("prune task stopping for shutdown");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let evicted = registry.prune(timeout).await;
                    if !evicted.is_empty() {
                        info!(count = evicted.len(), "pruned idle peers");
                    }
                }
            }
        }
    }
}

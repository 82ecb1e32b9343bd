use std::collections::HashMap;
use std::time::{Duration, Instant};

use hydra_protocol::{PeerCategory, PeerType};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::identity::PeerIdentity;

/// Identity -> PeerRecord entry. `effective_category` can diverge from
/// `declared_type.category()` only for a server-category peer displaced
/// by a newer one claiming the same role -- "last writer wins with
/// logging".
#[derive(Debug, Clone)]
struct PeerRecord {
    declared_type: PeerType,
    effective_category: PeerCategory,
    client_id: Option<String>,
    last_heartbeat_monotonic: Instant,
    last_heartbeat_wall: f64,
}

/// One entry of a registry snapshot, the shape serialized into
/// `client_registry_response`'s `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrySnapshotEntry {
    pub id: String,
    pub peer_type: String,
    pub last_heartbeat: f64,
}

/// A stable copy of the registry's contents at one instant, consumed by the
/// routing engine -- which never touches the live registry directly, so it
/// stays a pure function.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub entries: Vec<RegistrySnapshotEntry>,
    pub server_identity: Option<PeerIdentity>,
    pub client_identities: Vec<PeerIdentity>,
}

/// The concurrent peer registry. A single `RwLock` guards both the
/// identity->record map and the client_id->identity secondary index -- one
/// lock is enough since every operation here is short and non-blocking.
pub struct Registry {
    inner: RwLock<Inner>,
    strict_client_ids: bool,
}

#[derive(Default)]
struct Inner {
    peers: HashMap<PeerIdentity, PeerRecord>,
    by_client_id: HashMap<String, PeerIdentity>,
    primary_server: Option<PeerIdentity>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            strict_client_ids: false,
        }
    }

    /// When `strict` is true, `observe` rejects a `client_id` already bound
    /// to a *different* identity instead of silently re-binding it. Off by
    /// default.
    pub fn with_strict_client_ids(strict: bool) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            strict_client_ids: strict,
        }
    }

    /// Upserts a peer record. Refreshes `last_heartbeat` unconditionally.
    /// Logs on first registration. If `sender_type` is server-category and
    /// a *different* identity already holds the primary server slot, the
    /// old holder is demoted to client-category for routing purposes and
    /// the demotion is logged.
    pub async fn observe(
        &self,
        identity: PeerIdentity,
        sender_type: PeerType,
        client_id: Option<String>,
        wall_timestamp: f64,
    ) -> Result<(), crate::error::RegistrationError> {
        let mut inner = self.inner.write().await;

        if self.strict_client_ids {
            if let Some(ref cid) = client_id {
                if let Some(existing) = inner.by_client_id.get(cid) {
                    if existing != &identity {
                        return Err(crate::error::RegistrationError::DuplicateClientId {
                            client_id: cid.clone(),
                            existing: existing.to_string(),
                        });
                    }
                }
            }
        }

        let is_new = !inner.peers.contains_key(&identity);
        let category = sender_type
            .category()
            .expect("validator rejects inbound HydraRouter senders before this point");

        if category == PeerCategory::Server {
            if let Some(current) = inner.primary_server.clone() {
                if current != identity {
                    if let Some(displaced) = inner.peers.get_mut(&current) {
                        displaced.effective_category = PeerCategory::Client;
                    }
                    warn!(
                        displaced = %current,
                        new_server = %identity,
                        "duplicate server-category peer; last writer wins, \
                         displaced peer now treated as client for routing"
                    );
                }
            }
            inner.primary_server = Some(identity.clone());
        }

        if let Some(ref cid) = client_id {
            inner.by_client_id.insert(cid.clone(), identity.clone());
        }

        inner
            .peers
            .entry(identity.clone())
            .and_modify(|r| {
                r.declared_type = sender_type;
                r.effective_category = category;
                r.client_id = client_id.clone();
                r.last_heartbeat_monotonic = Instant::now();
                r.last_heartbeat_wall = wall_timestamp;
            })
            .or_insert_with(|| PeerRecord {
                declared_type: sender_type,
                effective_category: category,
                client_id,
                last_heartbeat_monotonic: Instant::now(),
                last_heartbeat_wall: wall_timestamp,
            });

        if is_new {
            info!(identity = %identity, peer_type = %sender_type, "peer registered");
        }
        Ok(())
    }

    pub async fn remove(&self, identity: &PeerIdentity) {
        let mut inner = self.inner.write().await;
        if let Some(record) = inner.peers.remove(identity) {
            if let Some(cid) = record.client_id {
                if inner.by_client_id.get(&cid) == Some(identity) {
                    inner.by_client_id.remove(&cid);
                }
            }
            if inner.primary_server.as_ref() == Some(identity) {
                inner.primary_server = None;
            }
            info!(identity = %identity, "peer removed");
        }
    }

    pub async fn by_category(&self, category: PeerCategory) -> Vec<PeerIdentity> {
        let inner = self.inner.read().await;
        inner
            .peers
            .iter()
            .filter(|(_, r)| r.effective_category == category)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub async fn server_identity(&self) -> Option<PeerIdentity> {
        self.inner.read().await.primary_server.clone()
    }

    /// Removes and returns every peer whose last heartbeat is older than
    /// `timeout`, logging each eviction.
    pub async fn prune(&self, timeout: Duration) -> Vec<PeerIdentity> {
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        let stale: Vec<PeerIdentity> = inner
            .peers
            .iter()
            .filter(|(_, r)| now.duration_since(r.last_heartbeat_monotonic) > timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for identity in &stale {
            if let Some(record) = inner.peers.remove(identity) {
                if let Some(cid) = record.client_id {
                    if inner.by_client_id.get(&cid) == Some(identity) {
                        inner.by_client_id.remove(&cid);
                    }
                }
                if inner.primary_server.as_ref() == Some(identity) {
                    inner.primary_server = None;
                }
            }
            warn!(identity = %identity, timeout_secs = timeout.as_secs_f64(), "evicted idle peer");
        }
        stale
    }

    /// A stable copy for the registry-query response and for the routing
    /// engine's snapshot input.
    pub async fn snapshot(&self) -> RegistrySnapshot {
        let inner = self.inner.read().await;
        let entries = inner
            .peers
            .iter()
            .map(|(id, r)| RegistrySnapshotEntry {
                id: r.client_id.clone().unwrap_or_else(|| id.hex()),
                peer_type: r.declared_type.to_string(),
                last_heartbeat: r.last_heartbeat_wall,
            })
            .collect();
        let client_identities = inner
            .peers
            .iter()
            .filter(|(_, r)| r.effective_category == PeerCategory::Client)
            .map(|(id, _)| id.clone())
            .collect();
        RegistrySnapshot {
            entries,
            server_identity: inner.primary_server.clone(),
            client_identities,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.peers.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

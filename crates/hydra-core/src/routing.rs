use hydra_protocol::{Envelope, PeerCategory, PeerType};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::RoutingError;
use crate::identity::PeerIdentity;
use crate::registry::RegistrySnapshot;

/// The router's own self-identification label, used as `sender` on every
/// envelope it synthesizes or relays on a server's behalf.
const ROUTER_LABEL: &str = "HydraRouter";

/// The outbound effect of routing one inbound envelope. `route` itself
/// performs no I/O -- it is a pure function over its three arguments, so
/// it is exhaustively unit-testable without a transport or a live
/// registry.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteAction {
    Deliver {
        to: PeerIdentity,
        envelope: Envelope,
    },
    /// Best-effort per-recipient; a send failure on one recipient must not
    /// abort delivery to the rest.
    Broadcast {
        to: Vec<PeerIdentity>,
        envelope: Envelope,
    },
    /// Heartbeats and dropped (invalid) envelopes produce no outbound
    /// message.
    None,
}

fn registry_response_envelope(request_id: Option<String>, snapshot: &RegistrySnapshot) -> Envelope {
    let peers: Vec<_> = snapshot
        .entries
        .iter()
        .map(|e| {
            json!({
                "id": e.id,
                "peer_type": e.peer_type,
                "last_heartbeat": e.last_heartbeat,
            })
        })
        .collect();
    let mut data = serde_json::Map::new();
    data.insert("peers".to_owned(), Value::Array(peers));
    Envelope {
        sender: ROUTER_LABEL.to_owned(),
        elem: "client_registry_response".to_owned(),
        timestamp: hydra_protocol::now_unix_seconds(),
        client_id: None,
        request_id,
        data: Some(data),
    }
}

fn no_server_error_envelope(original: &Envelope, sender_identity: &PeerIdentity) -> Envelope {
    let err = RoutingError {
        sender_identity: sender_identity.to_string(),
        elem: original.elem.clone(),
        request_id: original.request_id.clone(),
    };
    warn!(
        sender_identity = %sender_identity,
        elem = %original.elem,
        request_id = ?original.request_id,
        "{err}"
    );
    let mut data = serde_json::Map::new();
    data.insert(
        "reason".to_owned(),
        Value::String(RoutingError::REASON.to_owned()),
    );
    Envelope {
        sender: ROUTER_LABEL.to_owned(),
        elem: "error".to_owned(),
        timestamp: hydra_protocol::now_unix_seconds(),
        client_id: original.client_id.clone(),
        request_id: original.request_id.clone(),
        data: Some(data),
    }
}

/// Decides, for one already-validated envelope, what the broker should do
/// with it. `sender_identity` is the transport identity that produced
/// `envelope`; `snapshot` is the registry state at the moment of routing.
pub fn route(
    envelope: &Envelope,
    sender_identity: &PeerIdentity,
    snapshot: &RegistrySnapshot,
) -> Vec<RouteAction> {
    if PeerType::parse_inbound(&envelope.sender).is_none() {
        // Unreachable via the normal broker pipeline: the validator already
        // rejects envelopes whose sender isn't in ValidPeerTypes. Treated
        // as a no-op rather than panicking, since `route` must never crash
        // the broker loop on a single bad input.
        return vec![RouteAction::None];
    }

    if envelope.elem == "heartbeat" {
        return vec![RouteAction::None];
    }

    if envelope.elem == "client_registry_request" {
        let reply = registry_response_envelope(envelope.request_id.clone(), snapshot);
        return vec![RouteAction::Deliver {
            to: sender_identity.clone(),
            envelope: reply,
        }];
    }

    // The sender's *effective* category comes from the registry snapshot,
    // not from re-deriving it off the envelope's own declared label: a
    // displaced server-category peer keeps sending envelopes under its
    // original sender label, but the registry has already demoted it to
    // client-category (see `Registry::observe`'s "last writer wins"
    // policy). Routing on the label here would let the demoted peer keep
    // broadcasting alongside the new primary server -- exactly the
    // split-brain routing the registry's demotion is meant to prevent.
    let category = if snapshot.server_identity.as_ref() == Some(sender_identity) {
        PeerCategory::Server
    } else {
        PeerCategory::Client
    };

    match category {
        PeerCategory::Client => match &snapshot.server_identity {
            Some(server) => vec![RouteAction::Deliver {
                to: server.clone(),
                envelope: envelope.clone(),
            }],
            None => vec![RouteAction::Deliver {
                to: sender_identity.clone(),
                envelope: no_server_error_envelope(envelope, sender_identity),
            }],
        },
        PeerCategory::Server => {
            let recipients: Vec<PeerIdentity> = snapshot
                .client_identities
                .iter()
                .filter(|id| *id != sender_identity)
                .cloned()
                .collect();
            if recipients.is_empty() {
                // A zero-recipient broadcast is not an error, just nothing
                // to send.
                return vec![RouteAction::None];
            }
            vec![RouteAction::Broadcast {
                to: recipients,
                envelope: envelope.clone(),
            }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydra_protocol::now_unix_seconds;

    fn envelope(sender: &str, elem: &str, request_id: Option<&str>) -> Envelope {
        Envelope {
            sender: sender.to_owned(),
            elem: elem.to_owned(),
            timestamp: now_unix_seconds(),
            client_id: None,
            request_id: request_id.map(str::to_owned),
            data: None,
        }
    }

    fn id(n: u8) -> PeerIdentity {
        PeerIdentity(vec![n])
    }

    #[test]
    fn heartbeat_produces_no_outbound_action() {
        let env = envelope("SimpleClient", "heartbeat", None);
        let actions = route(&env, &id(1), &RegistrySnapshot::default());
        assert_eq!(actions, vec![RouteAction::None]);
    }

    #[test]
    fn client_request_without_a_server_gets_synthesized_error_with_same_request_id() {
        let env = envelope("SimpleClient", "square_request", Some("r1"));
        let actions = route(&env, &id(1), &RegistrySnapshot::default());
        match &actions[..] {
            [RouteAction::Deliver { to, envelope }] => {
                assert_eq!(*to, id(1));
                assert_eq!(envelope.sender, "HydraRouter");
                assert_eq!(envelope.elem, "error");
                assert_eq!(envelope.request_id.as_deref(), Some("r1"));
                let reason = envelope.data.as_ref().unwrap().get("reason").unwrap();
                assert_eq!(reason, "no server connected");
            }
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn client_request_with_a_server_forwards_unchanged() {
        let env = envelope("SimpleClient", "square_request", Some("r1"));
        let snapshot = RegistrySnapshot {
            server_identity: Some(id(9)),
            ..Default::default()
        };
        let actions = route(&env, &id(1), &snapshot);
        match &actions[..] {
            [RouteAction::Deliver { to, envelope }] => {
                assert_eq!(*to, id(9));
                assert_eq!(envelope.sender, "SimpleClient");
                assert_eq!(envelope.request_id.as_deref(), Some("r1"));
            }
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn server_message_broadcasts_to_clients_excluding_sender() {
        let env = envelope("HydraServer", "status_update", None);
        let snapshot = RegistrySnapshot {
            server_identity: Some(id(9)),
            client_identities: vec![id(1), id(2), id(9)],
            ..Default::default()
        };
        let actions = route(&env, &id(9), &snapshot);
        match &actions[..] {
            [RouteAction::Broadcast { to, envelope }] => {
                assert_eq!(to.len(), 2);
                assert!(to.contains(&id(1)));
                assert!(to.contains(&id(2)));
                assert!(!to.contains(&id(9)));
                assert_eq!(envelope.elem, "status_update");
            }
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn broadcast_with_no_recipients_is_not_an_error() {
        let env = envelope("HydraServer", "status_update", None);
        let snapshot = RegistrySnapshot {
            server_identity: Some(id(9)),
            client_identities: vec![id(9)],
            ..Default::default()
        };
        let actions = route(&env, &id(9), &snapshot);
        assert_eq!(actions, vec![RouteAction::None]);
    }

    #[test]
    fn a_demoted_server_is_routed_as_a_client_despite_its_declared_label() {
        // id(1) was the original HydraServer, now displaced by id(9); the
        // snapshot reflects the registry's demotion (id(1) no longer the
        // primary server, and is listed among client_identities instead),
        // but id(1)'s own envelope still carries sender = "HydraServer".
        // Routing must follow the snapshot, not the label, or id(1) and
        // id(9) would both broadcast -- split-brain.
        let env = envelope("HydraServer", "status_update", None);
        let snapshot = RegistrySnapshot {
            server_identity: Some(id(9)),
            client_identities: vec![id(1)],
            ..Default::default()
        };
        let actions = route(&env, &id(1), &snapshot);
        match &actions[..] {
            [RouteAction::Deliver { to, envelope }] => {
                assert_eq!(*to, id(9), "demoted peer's message should forward to the real server");
                assert_eq!(envelope.sender, "HydraServer");
            }
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn server_registry_request_is_answered_like_a_client_one() {
        let env = envelope("HydraServer", "client_registry_request", Some("q1"));
        let actions = route(&env, &id(9), &RegistrySnapshot::default());
        match &actions[..] {
            [RouteAction::Deliver { to, envelope }] => {
                assert_eq!(*to, id(9));
                assert_eq!(envelope.elem, "client_registry_response");
                assert_eq!(envelope.request_id.as_deref(), Some("q1"));
            }
            other => panic!("unexpected actions: {other:?}"),
        }
    }
}

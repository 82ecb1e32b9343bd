use std::fmt;

/// The coarse class of a peer, derived from its declared [`PeerType`].
///
/// Routing decisions only ever branch on category, never on the specific
/// label, so `HydraClient` and `SimpleClient` are indistinguishable to the
/// router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerCategory {
    Client,
    Server,
}

/// The closed set of peer-type labels recognized on the wire.
///
/// `HydraRouter` is the broker's own self-identification label, used as the
/// `sender` on synthesized/broadcast-relay envelopes. It is never a valid
/// `sender` on an *inbound* message -- see [`PeerType::category`], which
/// returns `None` for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerType {
    HydraClient,
    SimpleClient,
    HydraServer,
    SimpleServer,
    HydraRouter,
}

impl PeerType {
    pub const fn as_str(self) -> &'static str {
        match self {
            PeerType::HydraClient => "HydraClient",
            PeerType::SimpleClient => "SimpleClient",
            PeerType::HydraServer => "HydraServer",
            PeerType::SimpleServer => "SimpleServer",
            PeerType::HydraRouter => "HydraRouter",
        }
    }

    /// Parses a wire `sender` label. Returns `None` for anything outside
    /// the closed set, including `"HydraRouter"` when used as an inbound
    /// `sender` -- callers that need to accept the router label for other
    /// purposes (logging, self-identification) should match on the string
    /// directly.
    pub fn parse_inbound(label: &str) -> Option<Self> {
        match label {
            "HydraClient" => Some(PeerType::HydraClient),
            "SimpleClient" => Some(PeerType::SimpleClient),
            "HydraServer" => Some(PeerType::HydraServer),
            "SimpleServer" => Some(PeerType::SimpleServer),
            _ => None,
        }
    }

    pub const fn category(self) -> Option<PeerCategory> {
        match self {
            PeerType::HydraClient | PeerType::SimpleClient => Some(PeerCategory::Client),
            PeerType::HydraServer | PeerType::SimpleServer => Some(PeerCategory::Server),
            PeerType::HydraRouter => None,
        }
    }
}

impl fmt::Display for PeerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_and_hydra_clients_share_a_category() {
        assert_eq!(
            PeerType::HydraClient.category(),
            PeerType::SimpleClient.category()
        );
    }

    #[test]
    fn router_label_is_never_an_inbound_peer_type() {
        assert_eq!(PeerType::parse_inbound("HydraRouter"), None);
    }

    #[test]
    fn unknown_label_does_not_parse() {
        assert_eq!(PeerType::parse_inbound("Gremlin"), None);
    }
}

use std::fmt;

/// Opaque transport-assigned bytes uniquely naming a peer's connection.
/// Distinct from the peer-declared `client_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerIdentity(pub Vec<u8>);

impl PeerIdentity {
    pub fn hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl From<Vec<u8>> for PeerIdentity {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

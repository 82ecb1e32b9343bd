use serde::{Deserialize, Serialize};
use serde_json::Map as JsonMap;
use serde_json::Value;

/// The `data` payload: an open mapping from string to arbitrary JSON value,
/// or absent entirely. The broker never inspects it; the peer library
/// passes it through to handlers untouched.
pub type Data = JsonMap<String, Value>;

/// The single on-wire unit exchanged with the broker.
///
/// Field ordering on the wire is irrelevant; absent optional fields are
/// omitted rather than serialized as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub sender: String,
    pub elem: String,
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

impl Envelope {
    /// Serializes to a compact JSON byte vector, the unit sent as a single
    /// DEALER frame / ROUTER payload frame.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

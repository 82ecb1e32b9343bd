use std::time::Duration;

use hydra_protocol::PeerType;

use crate::error::ClientError;

/// Construction-time peer configuration. Unlike the broker binary,
/// `hydra-client` never reads the environment or argv itself -- only the
/// surrounding CLI binaries do.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub router_address: String,
    pub peer_type: PeerType,
    pub client_id: Option<String>,
    pub heartbeat_interval: Duration,
    pub request_timeout_default: Duration,
    pub max_message_bytes: usize,
}

impl ClientConfig {
    pub fn new(router_address: impl Into<String>, peer_type: PeerType) -> Self {
        Self {
            router_address: router_address.into(),
            peer_type,
            client_id: None,
            heartbeat_interval: Duration::from_secs_f64(5.0),
            request_timeout_default: Duration::from_secs_f64(10.0),
            max_message_bytes: 65536,
        }
    }

    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    #[must_use]
    pub fn with_request_timeout_default(mut self, timeout: Duration) -> Self {
        self.request_timeout_default = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.router_address.is_empty() {
            return Err(ClientError::Config("router_address must not be empty".into()));
        }
        if self.max_message_bytes == 0 {
            return Err(ClientError::Config("max_message_bytes must be nonzero".into()));
        }
        Ok(())
    }

    /// Generates a client_id when the application didn't supply one.
    pub fn resolved_client_id(&self) -> String {
        self.client_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }
}

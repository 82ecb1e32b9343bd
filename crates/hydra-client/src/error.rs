use std::time::Duration;

use hydra_protocol::FormatError;
use hydra_transport::TransportError;
use thiserror::Error;

/// Peer-side error taxonomy. `Format`/`Connection` wrap the lower-level
/// error types from `hydra-protocol`/`hydra-transport` rather than
/// re-stating their fields.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    #[error("connection error: {0}")]
    Connection(#[from] TransportError),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid construction parameters: {0}")]
    Config(String),
    #[error("disconnected: {0}")]
    Cancelled(String),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

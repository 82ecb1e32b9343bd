use thiserror::Error;

use crate::validator::Diagnostic;

/// Broker-side error taxonomy (the peer-side kinds live in
/// `hydra-client::error`). Each variant carries structured diagnostic
/// fields rather than a single opaque string, so log lines and callers
/// can extract them without re-parsing a message.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("validation rule `{}` violated", .0.rule)]
    RuleViolation(Box<Diagnostic>),
}

impl ValidationError {
    pub fn diagnostic(&self) -> &Diagnostic {
        let Self::RuleViolation(d) = self;
        d
    }
}

/// Surfaced when a server-category peer is required to route an envelope
/// but none is registered. The router never returns this as a `Result` err
/// from the hot path (see `route()`); it names the condition whose
/// `reason` field lands in the synthesized error reply's `data.reason`.
#[derive(Debug, Error)]
#[error("no server connected: sender={sender_identity} elem={elem}")]
pub struct RoutingError {
    pub sender_identity: String,
    pub elem: String,
    pub request_id: Option<String>,
}

impl RoutingError {
    pub const REASON: &'static str = "no server connected";
}

/// Registry invariant violations. Only raised when the registry is
/// constructed in strict mode (see [`crate::registry::Registry::observe`]);
/// the default "last writer wins" policy never raises this for duplicate
/// server-category peers.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("client_id `{client_id}` is already bound to a different identity ({existing})")]
    DuplicateClientId {
        client_id: String,
        existing: String,
    },
}

/// Invalid construction parameters for `BrokerConfig`/peer-side config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("client_timeout ({timeout}s) must be at least 3x heartbeat_check_interval ({interval}s)")]
    TimeoutTooShort { timeout: f64, interval: f64 },
    #[error("max_message_bytes must be greater than zero")]
    ZeroMaxMessageBytes,
    #[error("address must not be empty")]
    EmptyAddress,
}

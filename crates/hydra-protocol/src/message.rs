use std::time::{SystemTime, UNIX_EPOCH};

use crate::envelope::{Data, Envelope};
use crate::error::FormatError;
use crate::kind::MessageKind;
use crate::peer_type::PeerType;

/// Current wall-clock time in fractional seconds since the Unix epoch, used
/// to fill `Envelope::timestamp`/`Message::timestamp` when the application
/// didn't set one.
pub fn now_unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// The peer-side typed in-process message. The application constructs one
/// of these before sending and receives one after a handler or `request()`
/// resolves; the library owns the wire bytes in between.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    pub client_id: Option<String>,
    pub request_id: Option<String>,
    pub data: Option<Data>,
    /// `None` means "stamp with the current time on send"; once it has gone
    /// through `into_envelope`/`from_envelope` it is always `Some`.
    pub timestamp: Option<f64>,
}

impl Message {
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            client_id: None,
            request_id: None,
            data: None,
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Data) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Converts to a wire `Envelope` sent under `sender`'s label. Fails iff
    /// `self.kind` is `Unknown` -- every registered kind always succeeds.
    pub fn into_envelope(self, sender: PeerType) -> Result<Envelope, FormatError> {
        if let MessageKind::Unknown(label) = &self.kind {
            return Err(FormatError::UnknownKindOnSend {
                label: label.clone(),
            });
        }
        Ok(Envelope {
            sender: sender.to_string(),
            elem: self.kind.as_elem().to_owned(),
            timestamp: self.timestamp.unwrap_or_else(now_unix_seconds),
            client_id: self.client_id,
            request_id: self.request_id,
            data: self.data,
        })
    }

    /// Reconstructs a typed `Message` from an already-validated `Envelope`.
    /// Unrecognized `elem` values become `MessageKind::Unknown` rather than
    /// failing, so label evolution never breaks deserialization.
    pub fn from_envelope(envelope: Envelope) -> Self {
        Self {
            kind: MessageKind::from_elem(&envelope.elem),
            client_id: envelope.client_id,
            request_id: envelope.request_id,
            data: envelope.data,
            timestamp: Some(envelope.timestamp),
        }
    }
}

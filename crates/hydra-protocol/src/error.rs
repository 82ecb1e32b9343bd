use thiserror::Error;

/// Codec failures: a typed message with an `Unknown` kind can never be
/// sent, and a wire envelope missing fields the typed side requires is
/// rejected before conversion.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("cannot send a message of unknown kind {label:?}: no wire elem is registered for it")]
    UnknownKindOnSend { label: String },
    #[error("envelope missing required field `{field}`")]
    MissingField { field: &'static str },
}

//! `hydra-protocol`: the on-wire `Envelope` schema, the peer-side typed
//! `Message`/`MessageKind`, and the codec between them.
//!
//! This is the single source of truth for the kind <-> `elem` mapping; both
//! `hydra-core` (the broker) and `hydra-client` (the peer library) depend on
//! this crate rather than hand-rolling their own copy of the table.

mod envelope;
mod error;
mod kind;
mod message;
mod peer_type;

pub use envelope::{Data, Envelope};
pub use error::FormatError;
pub use kind::MessageKind;
pub use message::{now_unix_seconds, Message};
pub use peer_type::{PeerCategory, PeerType};

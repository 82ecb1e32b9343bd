//! Peer-side session library: a typed `Message` in, a typed `Message` or
//! reply out, with heartbeating, reconnection-free connection management,
//! and request/response correlation handled underneath.

mod client;
mod config;
mod error;

pub use client::MQClient;
pub use config::ClientConfig;
pub use error::ClientError;

pub use hydra_protocol::{Data, Message, MessageKind, PeerType};

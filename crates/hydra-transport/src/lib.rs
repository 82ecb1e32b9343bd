//! `hydra-transport`: the narrow dealer/router transport interfaces
//! consumed by the broker and peer library, plus one concrete
//! implementation over the pure-Rust `zeromq` crate so the system is
//! runnable end-to-end.
//!
//! Neither `hydra-core` nor `hydra-client` depends on `zeromq` types
//! directly -- they depend on the [`RouterTransport`]/[`DealerTransport`]
//! traits in this crate, so `hydra-test-support`'s in-memory transport is a
//! drop-in substitute in tests.

mod error;
mod traits;
mod zmq;

pub use error::TransportError;
pub use traits::{DealerTransport, RouterTransport};
pub use zmq::{ZmqDealerTransport, ZmqRouterTransport};

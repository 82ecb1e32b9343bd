//! Workspace root crate.
//!
//! This crate has no code of its own. It exists so that `tests/integration/*`
//! can run as workspace-level end-to-end tests against `hydra-core` and
//! `hydra-client`, the same way `rusty_timer`'s root crate hosts the
//! `tests/integration` suite for `server`/`forwarder`/`receiver`.

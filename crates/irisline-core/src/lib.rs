//! irisline core: transport-agnostic protocol primitives, error types, and flags.
//!
//! This crate defines the wire-level contracts shared by the push client and
//! its tests: the topic table and capability mask, the compact field reader,
//! the payload parsers that turn inbound packets into [`Message`]s, and the
//! builders for every outbound command. It carries no runtime dependencies so
//! it can be driven from any event loop.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths surface as `PushError`/`Result`, so a malformed packet
//! from the broker never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod command;
pub mod error;
pub mod message;
pub mod parsers;
pub mod protocol;
pub mod qos;
pub mod subscription;

/// Shared result type.
pub use error::{ErrorKind, PushError, Result};
pub use message::Message;
pub use qos::QosLevel;

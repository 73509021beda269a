//! irisline client library entry.
//!
//! This crate wires the strict config, the reconnect supervisor, the
//! transport seam, the parser and handler registries and the event bus into
//! one push client session. Socket setup and framing are supplied by the
//! embedding application through [`transport::Connector`].

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod events;
pub mod handlers;
pub mod logging;
pub mod supervisor;
pub mod transport;
pub mod types;

pub use client::{PushClient, PushHandle};
pub use events::{ClientEvent, EventBus, EventKind};

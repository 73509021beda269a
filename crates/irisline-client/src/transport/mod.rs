//! Transport seam.
//!
//! Socket setup, TLS and byte framing live behind [`Connector`]; the session
//! loop only sees decoded packets. A framing problem that does not kill the
//! socket (for example an unknown packet type) is yielded as a non-transport
//! error and the stream keeps going.

pub mod memory;

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Sink, Stream};

use irisline_core::error::{PushError, Result};
use irisline_core::protocol::packet::{InboundPacket, OutboundPacket};

pub type PacketSink = Pin<Box<dyn Sink<OutboundPacket, Error = PushError> + Send>>;
pub type PacketStream = Pin<Box<dyn Stream<Item = Result<InboundPacket>> + Send>>;

/// One established, authenticated broker connection.
pub struct Connection {
    pub sink: PacketSink,
    pub stream: PacketStream,
}

/// Connect packet contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// JSON connect blob.
    pub username: String,
    pub password: String,
    pub keepalive: Duration,
    pub clean_session: bool,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, params: &ConnectParams) -> Result<Connection>;
}

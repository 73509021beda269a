//! In-process connector. Each successful connect hands the broker side of
//! the connection to whoever holds the [`MemoryBroker`] receiver.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::{sink, stream};
use tokio::sync::mpsc;

use irisline_core::error::{PushError, Result};
use irisline_core::protocol::packet::{InboundPacket, OutboundPacket};

use super::{ConnectParams, Connection, Connector};

/// Broker end of one in-memory connection.
pub struct MemoryPeer {
    pub params: ConnectParams,
    /// Packets (or stream errors) delivered to the client.
    pub to_client: mpsc::UnboundedSender<Result<InboundPacket>>,
    /// Packets written by the client.
    pub from_client: mpsc::UnboundedReceiver<OutboundPacket>,
}

pub type MemoryBroker = mpsc::UnboundedReceiver<MemoryPeer>;

pub struct MemoryConnector {
    peers: mpsc::UnboundedSender<MemoryPeer>,
    refuse: AtomicUsize,
    attempts: AtomicUsize,
}

impl MemoryConnector {
    pub fn new() -> (Self, MemoryBroker) {
        let (peers, broker) = mpsc::unbounded_channel();
        let connector = Self {
            peers,
            refuse: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
        };
        (connector, broker)
    }

    /// Refuse the next `n` connection attempts.
    pub fn refuse_next(&self, n: usize) {
        self.refuse.store(n, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, params: &ConnectParams) -> Result<Connection> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let refused = self
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(PushError::Transport("connection refused".into()));
        }

        let (to_client, client_rx) = mpsc::unbounded_channel::<Result<InboundPacket>>();
        let (client_tx, from_client) = mpsc::unbounded_channel::<OutboundPacket>();

        let peer = MemoryPeer { params: params.clone(), to_client, from_client };
        self.peers
            .send(peer)
            .map_err(|_| PushError::Transport("memory broker is gone".into()))?;

        let stream = stream::unfold(client_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        let sink = sink::unfold(client_tx, |tx, packet: OutboundPacket| async move {
            tx.send(packet)
                .map_err(|_| PushError::Transport("memory peer closed".into()))?;
            Ok::<_, PushError>(tx)
        });

        Ok(Connection { sink: Box::pin(sink), stream: Box::pin(stream) })
    }
}

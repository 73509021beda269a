//! Per-connection session loop.
//!
//! One task owns the connection: outbound commands, inbound packets, the
//! keepalive tick and the stop signal are multiplexed with `select!`, so
//! packets are parsed and dispatched strictly in arrival order.

use std::sync::atomic::Ordering;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use irisline_core::command::{Command, IrisSubscribe, PreparedCommand, UpdateSubscriptions};
use irisline_core::error::{PushError, Result};
use irisline_core::protocol::capabilities::Capability;
use irisline_core::protocol::compress::{deflate, inflate};
use irisline_core::protocol::packet::{InboundPacket, OutboundPacket};
use irisline_core::protocol::topics::TopicRegistry;

use crate::events::{ClientEvent, EventKind};
use crate::transport::{Connection, PacketSink, PacketStream};

use super::{lock, PushClient};

pub(crate) enum SessionEnd {
    Stopped,
    Failed(PushError),
}

impl PushClient {
    pub(super) async fn serve(
        &self,
        conn: Connection,
        out_rx: &mut mpsc::Receiver<PreparedCommand>,
    ) -> SessionEnd {
        let Connection { mut sink, mut stream } = conn;

        // commands queued for a previous connection are stale
        while out_rx.try_recv().is_ok() {}

        // Handles record subscriptions and the iris cursor under the same
        // lock, so each update lands either in this snapshot or, once
        // `connected` is set, in `out_rx`.
        let (subs, iris) = {
            let set = lock(&self.subscriptions);
            self.connected.store(true, Ordering::Release);
            (set.snapshot(), self.iris.resubscribe())
        };
        if let Err(e) = self.resubscribe(&mut sink, &subs, iris.as_ref()).await {
            self.connected.store(false, Ordering::Release);
            return SessionEnd::Failed(e);
        }
        tracing::info!("session established");
        if self.events.has_listeners(EventKind::Connected) {
            self.events.emit(ClientEvent::Connected);
        }

        let end = self.session_loop(&mut sink, &mut stream, out_rx).await;
        self.connected.store(false, Ordering::Release);
        if matches!(end, SessionEnd::Stopped) {
            let _ = sink.send(OutboundPacket::Disconnect).await;
        }
        end
    }

    async fn session_loop(
        &self,
        sink: &mut PacketSink,
        stream: &mut PacketStream,
        out_rx: &mut mpsc::Receiver<PreparedCommand>,
    ) -> SessionEnd {
        let keepalive = self.cfg.connection.keepalive();
        let idle_timeout = keepalive * 2;
        let mut ping_tick = tokio::time::interval_at(Instant::now() + keepalive, keepalive);
        ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_inbound = Instant::now();

        let stopped = self.supervisor.stopped();
        tokio::pin!(stopped);

        loop {
            tokio::select! {
                _ = &mut stopped => return SessionEnd::Stopped,

                // outbound writer
                maybe_out = out_rx.recv() => {
                    let Some(cmd) = maybe_out else { return SessionEnd::Stopped; };
                    if let Err(e) = self.publish(sink, &cmd).await {
                        return SessionEnd::Failed(e);
                    }
                }

                // inbound reader
                incoming = stream.next() => {
                    match incoming {
                        None => {
                            let closed = PushError::Transport("connection closed by broker".into());
                            return SessionEnd::Failed(closed);
                        }
                        Some(Err(e)) if e.is_transport() => return SessionEnd::Failed(e),
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "inbound frame skipped");
                            self.report(&e);
                        }
                        Some(Ok(packet)) => {
                            last_inbound = Instant::now();
                            self.on_packet(packet);
                        }
                    }
                }

                // keepalive
                _ = ping_tick.tick() => {
                    if last_inbound.elapsed() >= idle_timeout {
                        return SessionEnd::Failed(PushError::Transport("keepalive timeout".into()));
                    }
                    if let Err(e) = sink.send(OutboundPacket::PingReq).await {
                        return SessionEnd::Failed(e);
                    }
                }
            }
        }
    }

    /// Replay the subscription set, then the message sync cursor.
    async fn resubscribe(
        &self,
        sink: &mut PacketSink,
        subs: &[UpdateSubscriptions],
        iris: Option<&IrisSubscribe>,
    ) -> Result<()> {
        for cmd in subs {
            self.publish(sink, &cmd.prepare()?).await?;
        }
        if let Some(iris) = iris {
            tracing::debug!(seq_id = iris.seq_id(), "iris resubscribe");
            self.publish(sink, &iris.prepare()?).await?;
        }
        Ok(())
    }

    async fn publish(&self, sink: &mut PacketSink, cmd: &PreparedCommand) -> Result<()> {
        let enum_topics = self.cfg.session.capabilities().contains(Capability::UseEnumTopic);
        let topic = TopicRegistry::to_wire(cmd.topic, enum_topics)?;
        let payload = if self.cfg.connection.compress_payloads {
            Bytes::from(deflate(cmd.payload.as_bytes()))
        } else {
            Bytes::from(cmd.payload.clone().into_bytes())
        };
        tracing::trace!(topic = %cmd.topic, qos = cmd.qos.as_u8(), "publish");
        sink.send(OutboundPacket::Publish { topic, payload, qos: cmd.qos }).await
    }

    fn on_packet(&self, packet: InboundPacket) {
        match packet {
            InboundPacket::Publish { topic, payload, .. } => self.on_publish(&topic, &payload),
            InboundPacket::PubAck { packet_id } => tracing::trace!(packet_id, "puback"),
            InboundPacket::PingResp => tracing::trace!("pingresp"),
            InboundPacket::Other(kind) => tracing::debug!(?kind, "packet ignored"),
        }
    }

    /// Every failure here only drops the packet (or element) that caused it.
    fn on_publish(&self, topic: &str, payload: &[u8]) {
        let path = match TopicRegistry::resolve_inbound(topic) {
            Ok(p) => p,
            Err(e) => return self.drop_packet(topic, &e),
        };
        let inflated;
        let body = if self.cfg.connection.compress_payloads {
            match inflate(payload) {
                Ok(b) => {
                    inflated = b;
                    inflated.as_slice()
                }
                Err(e) => return self.drop_packet(path, &e),
            }
        } else {
            payload
        };
        let messages = match self.parsers.parse(path, body) {
            Ok(m) => m,
            Err(e) => return self.drop_packet(path, &e),
        };
        tracing::debug!(topic = %path, count = messages.len(), "dispatch");
        for msg in messages {
            let module = msg.module;
            if let Err(e) = self.handlers.dispatch(msg, &self.events) {
                if e.is_iris_queue_error() {
                    tracing::warn!("iris queue moved past the stored sequence id, clearing it");
                    self.iris.clear();
                }
                tracing::warn!(module = %module, error = %e, "handler failed");
                self.report(&e);
            }
        }
    }

    fn drop_packet(&self, topic: &str, e: &PushError) {
        tracing::warn!(topic = %topic, error = %e, "packet dropped");
        self.report(e);
    }

    fn report(&self, e: &PushError) {
        if self.events.has_listeners(EventKind::Error) {
            self.events.emit(ClientEvent::Error {
                code: e.kind().as_str(),
                message: e.to_string(),
            });
        }
    }
}

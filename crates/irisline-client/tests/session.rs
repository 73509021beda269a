//! End-to-end session loop against the in-memory connector.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{sink, SinkExt};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::{Notify, Semaphore};

use irisline_client::auth::StaticAuth;
use irisline_client::config::ClientConfig;
use irisline_client::transport::memory::{MemoryBroker, MemoryConnector, MemoryPeer};
use irisline_client::transport::{ConnectParams, Connection, Connector};
use irisline_client::{ClientEvent, PushClient};
use irisline_core::error::PushError;
use irisline_core::protocol::compress::{deflate, inflate};
use irisline_core::protocol::packet::{InboundPacket, OutboundPacket};
use irisline_core::subscription::{queries, Subscription};
use irisline_core::QosLevel;

const CTX: &str = "5b0f6f7c-2d7a-4a3e-9a52-9fb5d8e2c8a1";

struct Harness {
    client: Arc<PushClient>,
    broker: MemoryBroker,
    events: UnboundedReceiver<ClientEvent>,
    runner: tokio::task::JoinHandle<irisline_core::Result<()>>,
}

fn start() -> Harness {
    let (connector, broker) = MemoryConnector::new();
    start_with(ClientConfig::default(), Arc::new(connector), broker)
}

fn start_with(cfg: ClientConfig, connector: Arc<dyn Connector>, broker: MemoryBroker) -> Harness {
    let auth = Arc::new(StaticAuth::new("25025320", "pw", "android-0123456789abcdef"));
    let client = Arc::new(PushClient::new(cfg, auth, connector).unwrap());
    let events = client.events().subscribe();
    let runner = tokio::spawn({
        let client = client.clone();
        async move { client.run().await }
    });
    Harness { client, broker, events, runner }
}

/// Next publish written by the client, body inflated.
async fn next_publish(peer: &mut MemoryPeer) -> (String, QosLevel, String) {
    loop {
        match peer.from_client.recv().await.unwrap() {
            OutboundPacket::Publish { topic, payload, qos } => {
                let body = String::from_utf8(inflate(&payload).unwrap()).unwrap();
                return (topic, qos, body);
            }
            OutboundPacket::PingReq => continue,
            other => panic!("unexpected {other:?}"),
        }
    }
}

async fn next_event(
    events: &mut UnboundedReceiver<ClientEvent>,
    want: fn(&ClientEvent) -> bool,
) -> ClientEvent {
    loop {
        let ev = events.recv().await.unwrap();
        if want(&ev) {
            return ev;
        }
    }
}

fn publish(peer: &MemoryPeer, topic: &str, body: &[u8]) {
    peer.to_client
        .send(Ok(InboundPacket::Publish {
            topic: topic.into(),
            payload: Bytes::from(deflate(body)),
            qos: QosLevel::FireAndForget,
        }))
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn connect_resubscribes_and_publishes_commands() {
    let mut h = start();
    let mut peer = h.broker.recv().await.unwrap();
    assert_eq!(peer.params.client_id, "android-0123456789ab");

    let (topic, qos, body) = next_publish(&mut peer).await;
    assert_eq!(topic, "149");
    assert_eq!(qos, QosLevel::AcknowledgedDelivery);
    let subs: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(subs["sub"].as_array().map(Vec::len), Some(2));

    let (topic, _, body) = next_publish(&mut peer).await;
    assert_eq!(topic, "88");
    assert!(body.contains("ig/u/v1/25025320"));
    assert!(body.contains("ig/live_notification_subscribe/25025320"));

    next_event(&mut h.events, |e| *e == ClientEvent::Connected).await;

    let handle = h.client.handle();
    handle.send_text("123".into(), "hi", Some(CTX)).unwrap();
    let (topic, qos, body) = next_publish(&mut peer).await;
    assert_eq!(topic, "132");
    assert_eq!(qos, QosLevel::FireAndForget);
    assert_eq!(
        body,
        format!(
            concat!(
                r#"{{"thread_id":"123","item_type":"text","text":"hi","#,
                r#""client_context":"{}","action":"send_item"}}"#,
            ),
            CTX
        )
    );

    let err = handle.send_text("abc".into(), "hi", None).unwrap_err();
    assert_eq!(err.kind().as_str(), "INVALID_ARGUMENT");

    handle.stop();
    h.runner.await.unwrap().unwrap();
    assert!(!handle.is_connected());
    assert!(handle.send_like("1".into(), None).is_err());
}

#[tokio::test(start_paused = true)]
async fn inbound_publishes_reach_listeners_and_bad_packets_are_dropped() {
    let mut h = start();
    let mut peer = h.broker.recv().await.unwrap();
    next_event(&mut h.events, |e| *e == ClientEvent::Connected).await;

    // unknown packet type from the framer, then a good region hint
    peer.to_client.send(Err(PushError::UnknownPacketType(15))).unwrap();
    publish(&peer, "150", &[0x18, 0x03, b'A', b'T', b'N', 0x00]);

    let err = next_event(&mut h.events, |e| matches!(e, ClientEvent::Error { .. })).await;
    assert_eq!(
        err,
        ClientEvent::Error {
            code: "UNKNOWN_PACKET_TYPE",
            message: "unknown packet type: 15".into(),
        }
    );
    let hint = next_event(&mut h.events, |e| matches!(e, ClientEvent::RegionHint(_))).await;
    assert_eq!(hint, ClientEvent::RegionHint("ATN".into()));

    // unknown topic id is dropped; the session stays up
    publish(&peer, "999", b"{}");
    let err = next_event(&mut h.events, |e| matches!(e, ClientEvent::Error { .. })).await;
    assert!(matches!(err, ClientEvent::Error { code: "UNKNOWN_TOPIC", .. }));
    assert!(h.client.handle().is_connected());

    // raw (non-zlib) body is dropped too
    peer.to_client
        .send(Ok(InboundPacket::Publish {
            topic: "150".into(),
            payload: Bytes::from_static(b"plain"),
            qos: QosLevel::FireAndForget,
        }))
        .unwrap();
    let err = next_event(&mut h.events, |e| matches!(e, ClientEvent::Error { .. })).await;
    assert!(matches!(err, ClientEvent::Error { code: "INVALID_PAYLOAD", .. }));

    h.client.handle().stop();
    h.runner.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn iris_queue_overflow_clears_cursor_across_reconnect() {
    let mut h = start();
    let mut peer = h.broker.recv().await.unwrap();
    next_publish(&mut peer).await;
    next_publish(&mut peer).await;
    next_event(&mut h.events, |e| *e == ClientEvent::Connected).await;

    let handle = h.client.handle();
    assert_eq!(
        handle.receive_offline_messages(-1, None).unwrap_err().kind().as_str(),
        "INVALID_ARGUMENT"
    );
    handle.receive_offline_messages(500, Some(1_600_000_000_000)).unwrap();
    let (topic, qos, body) = next_publish(&mut peer).await;
    assert_eq!(topic, "134");
    assert_eq!(qos, QosLevel::AcknowledgedDelivery);
    assert_eq!(body, r#"{"seq_id":500,"snapshot_at_ms":1600000000000}"#);

    // drop the connection: the cursor is replayed after the subscriptions
    drop(peer);
    next_event(&mut h.events, |e| matches!(e, ClientEvent::Disconnected { .. })).await;
    let mut peer = h.broker.recv().await.unwrap();
    next_publish(&mut peer).await;
    next_publish(&mut peer).await;
    let (topic, _, body) = next_publish(&mut peer).await;
    assert_eq!(topic, "134");
    assert!(body.starts_with(r#"{"seq_id":500"#));
    next_event(&mut h.events, |e| *e == ClientEvent::Connected).await;

    publish(
        &peer,
        "135",
        br#"{"succeeded":false,"error_type":1,"error_message":"Queue Overflow"}"#,
    );
    let err = next_event(&mut h.events, |e| matches!(e, ClientEvent::Error { .. })).await;
    match err {
        ClientEvent::Error { code, message } => {
            assert_eq!(code, "HANDLER");
            assert!(message.contains("Queue Overflow"));
        }
        other => panic!("unexpected {other:?}"),
    }

    // next connection no longer replays the cursor
    drop(peer);
    let mut peer = h.broker.recv().await.unwrap();
    next_publish(&mut peer).await;
    next_publish(&mut peer).await;
    next_event(&mut h.events, |e| *e == ClientEvent::Connected).await;
    handle.send_like("7".into(), Some(CTX)).unwrap();
    let (topic, _, _) = next_publish(&mut peer).await;
    assert_eq!(topic, "132");

    handle.stop();
    h.runner.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn silent_broker_trips_keepalive() {
    let mut h = start();
    let mut peer = h.broker.recv().await.unwrap();
    next_event(&mut h.events, |e| *e == ClientEvent::Connected).await;

    // pings go out but nothing ever comes back
    let ev = next_event(&mut h.events, |e| matches!(e, ClientEvent::Disconnected { .. })).await;
    assert_eq!(ev, ClientEvent::Disconnected { reason: "transport: keepalive timeout".into() });
    let mut pings = 0;
    while let Ok(pkt) = peer.from_client.try_recv() {
        if pkt == OutboundPacket::PingReq {
            pings += 1;
        }
    }
    assert!(pings >= 1);

    // and the supervisor reconnects
    let _peer = h.broker.recv().await.unwrap();
    h.client.handle().stop();
    h.runner.await.unwrap().unwrap();
}

/// Holds the first packet written on each connection until `release` has a permit.
struct HoldFirstWrite {
    inner: MemoryConnector,
    held: Arc<Notify>,
    release: Arc<Semaphore>,
}

#[async_trait]
impl Connector for HoldFirstWrite {
    async fn connect(&self, params: &ConnectParams) -> irisline_core::Result<Connection> {
        let Connection { sink: inner, stream } = self.inner.connect(params).await?;
        let (held, release) = (self.held.clone(), self.release.clone());
        let sink = sink::unfold((inner, true), move |(mut inner, first), packet: OutboundPacket| {
            let (held, release) = (held.clone(), release.clone());
            async move {
                if first {
                    held.notify_one();
                    release
                        .acquire()
                        .await
                        .map_err(|_| PushError::Transport("release closed".into()))?
                        .forget();
                }
                inner.send(packet).await?;
                Ok::<_, PushError>((inner, false))
            }
        });
        Ok(Connection { sink: Box::pin(sink), stream })
    }
}

#[tokio::test(start_paused = true)]
async fn updates_made_while_resubscribing_reach_the_new_connection() {
    let (inner, broker) = MemoryConnector::new();
    let held = Arc::new(Notify::new());
    let release = Arc::new(Semaphore::new(0));
    let connector = HoldFirstWrite { inner, held: held.clone(), release: release.clone() };

    let mut cfg = ClientConfig::default();
    cfg.session.enable_typing = false;
    let mut h = start_with(cfg, Arc::new(connector), broker);
    let mut peer = h.broker.recv().await.unwrap();

    // the client is now parked inside its first resubscribe publish
    held.notified().await;
    let handle = h.client.handle();
    handle.subscribe(vec![Subscription::direct_typing(42i64.into()).unwrap()]).unwrap();
    handle.receive_offline_messages(7, None).unwrap();
    release.add_permits(1);

    next_event(&mut h.events, |e| *e == ClientEvent::Connected).await;
    handle.send_like("9".into(), Some(CTX)).unwrap();

    let mut typing = false;
    let mut iris = false;
    loop {
        let (topic, _, body) = next_publish(&mut peer).await;
        match topic.as_str() {
            "149" if body.contains(queries::DIRECT_TYPING) => typing = true,
            "134" => {
                assert_eq!(body, r#"{"seq_id":7}"#);
                iris = true;
            }
            "132" => break,
            _ => {}
        }
    }
    assert!(typing, "typing subscription was not published on this connection");
    assert!(iris, "iris cursor was not published on this connection");

    handle.stop();
    h.runner.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn replace_subscriptions_swaps_the_topic_set() {
    let mut h = start();
    let mut peer = h.broker.recv().await.unwrap();
    next_publish(&mut peer).await;
    next_publish(&mut peer).await;
    next_event(&mut h.events, |e| *e == ClientEvent::Connected).await;

    let handle = h.client.handle();
    let direct = Subscription::skywalker_direct(7i64.into()).unwrap();
    handle.replace_subscriptions(vec![direct]).unwrap();
    let (topic, _, body) = next_publish(&mut peer).await;
    assert_eq!(topic, "88");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["sub"], serde_json::json!(["ig/u/v1/7"]));
    let unsub = body["unsub"].as_array().unwrap();
    assert_eq!(unsub.len(), 2);
    assert!(unsub.contains(&Value::from("ig/u/v1/25025320")));
    assert!(unsub.contains(&Value::from("ig/live_notification_subscribe/25025320")));

    // the replaced set is what the next connection gets
    drop(peer);
    let mut peer = h.broker.recv().await.unwrap();
    let (topic, _, _) = next_publish(&mut peer).await;
    assert_eq!(topic, "149");
    let (topic, _, body) = next_publish(&mut peer).await;
    assert_eq!(topic, "88");
    assert_eq!(body, r#"{"sub":["ig/u/v1/7"]}"#);

    handle.stop();
    h.runner.await.unwrap().unwrap();
}

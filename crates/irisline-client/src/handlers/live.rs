use irisline_core::error::{PushError, Result};
use irisline_core::message::modules;
use irisline_core::Message;

use crate::dispatch::Handler;
use crate::events::{ClientEvent, EventBus, EventKind};

use super::patch::{PatchEvent, PatchOp};

/// Broadcast start/stop notifications, delivered as patch batches.
pub struct LiveHandler;

impl Handler for LiveHandler {
    fn module(&self) -> &'static str {
        modules::LIVE
    }

    fn handle(&self, msg: Message, events: &EventBus) -> Result<()> {
        let patch = PatchEvent::from_value(msg.data)?;
        for op in &patch.data {
            let event = match PatchOp::parse(&op.op)? {
                PatchOp::Add => {
                    if !events.has_listeners(EventKind::LiveStarted) {
                        continue;
                    }
                    ClientEvent::LiveStarted(op.decode()?)
                }
                PatchOp::Remove => {
                    if !events.has_listeners(EventKind::LiveStopped) {
                        continue;
                    }
                    let broadcast_id = op
                        .path
                        .rsplit('/')
                        .find(|s| !s.is_empty())
                        .ok_or_else(|| {
                            PushError::Handler(format!("live path {} has no id", op.path))
                        })?;
                    ClientEvent::LiveStopped { broadcast_id: broadcast_id.to_string() }
                }
                _ => {
                    let msg = format!("unsupported live op {} {}", op.op, op.path);
                    return Err(PushError::Handler(msg));
                }
            };
            events.emit(event);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn add_and_remove_map_to_start_and_stop() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let msg = Message::new(
            modules::LIVE,
            json!({"event": "patch", "data": [
                {
                    "op": "add",
                    "path": "/broadcast/17",
                    "value": r#"{"broadcast_id":17,"broadcast_message":"hi"}"#
                },
                {"op": "remove", "path": "/broadcast/17"}
            ]}),
        );
        assert!(LiveHandler.handle(msg, &bus).is_ok());
        match rx.try_recv().ok() {
            Some(ClientEvent::LiveStarted(b)) => assert_eq!(b.broadcast_id, "17"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            rx.try_recv().ok(),
            Some(ClientEvent::LiveStopped { broadcast_id: "17".into() })
        );
    }
}

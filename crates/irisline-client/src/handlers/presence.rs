use serde_json::Value;

use irisline_core::error::{PushError, Result};
use irisline_core::message::modules;
use irisline_core::Message;

use crate::dispatch::Handler;
use crate::events::{ClientEvent, EventBus, EventKind};
use crate::types::UserPresence;

pub struct PresenceHandler;

impl Handler for PresenceHandler {
    fn module(&self) -> &'static str {
        modules::PRESENCE
    }

    fn handle(&self, mut msg: Message, events: &EventBus) -> Result<()> {
        if !events.has_listeners(EventKind::Presence) {
            return Ok(());
        }
        let body = msg
            .data
            .get_mut("presence_event")
            .map(Value::take)
            .ok_or_else(|| PushError::Handler("presence message has no presence_event".into()))?;
        let presence: UserPresence = serde_json::from_value(body)
            .map_err(|e| PushError::Handler(format!("malformed presence event: {e}")))?;
        events.emit(ClientEvent::Presence(presence));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_presence_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let msg = Message::new(
            modules::PRESENCE,
            json!({"presence_event": {
                "user_id": 5,
                "is_active": true,
                "last_activity_at_ms": "1600"
            }}),
        );
        assert!(PresenceHandler.handle(msg, &bus).is_ok());
        match rx.try_recv().ok() {
            Some(ClientEvent::Presence(p)) => {
                assert_eq!(p.user_id, "5");
                assert!(p.is_active);
                assert_eq!(p.last_activity_at_ms, Some(1600));
            }
            other => panic!("unexpected {other:?}"),
        }
        let missing = PresenceHandler.handle(Message::new(modules::PRESENCE, json!({})), &bus);
        assert!(missing.is_err());
    }
}

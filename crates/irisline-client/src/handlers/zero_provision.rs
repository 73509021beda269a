use serde_json::Value;

use irisline_core::error::{PushError, Result};
use irisline_core::message::modules;
use irisline_core::Message;

use crate::dispatch::Handler;
use crate::events::{ClientEvent, EventBus, EventKind};
use crate::types::ZeroProvisionEvent;

pub struct ZeroProvisionHandler;

impl Handler for ZeroProvisionHandler {
    fn module(&self) -> &'static str {
        modules::ZERO_PROVISION
    }

    fn handle(&self, mut msg: Message, events: &EventBus) -> Result<()> {
        if !events.has_listeners(EventKind::ZeroProvision) {
            return Ok(());
        }
        let body = msg
            .data
            .get_mut("zero_product_provisioning_event")
            .map(Value::take)
            .ok_or_else(|| PushError::Handler("zero provision message has no event".into()))?;
        let event: ZeroProvisionEvent = serde_json::from_value(body)
            .map_err(|e| PushError::Handler(format!("malformed zero provision event: {e}")))?;
        events.emit(ClientEvent::ZeroProvision(event));
        Ok(())
    }
}

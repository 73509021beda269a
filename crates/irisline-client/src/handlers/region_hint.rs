use irisline_core::error::{PushError, Result};
use irisline_core::message::modules;
use irisline_core::Message;

use crate::dispatch::Handler;
use crate::events::{ClientEvent, EventBus, EventKind};

pub struct RegionHintHandler;

impl Handler for RegionHintHandler {
    fn module(&self) -> &'static str {
        modules::REGION_HINT
    }

    fn handle(&self, msg: Message, events: &EventBus) -> Result<()> {
        if !events.has_listeners(EventKind::RegionHint) {
            return Ok(());
        }
        match msg.data.as_str() {
            Some(region) if !region.is_empty() => {
                events.emit(ClientEvent::RegionHint(region.to_string()));
                Ok(())
            }
            _ => Err(PushError::Handler("region hint is not a non-empty string".into())),
        }
    }
}

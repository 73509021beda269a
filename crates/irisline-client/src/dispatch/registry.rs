use std::sync::Arc;

use dashmap::DashMap;

use irisline_core::error::{PushError, Result};
use irisline_core::Message;

use crate::events::EventBus;

/// Interprets the messages of one module and emits events.
///
/// Handlers run on the session task, one message at a time, in wire order.
pub trait Handler: Send + Sync {
    fn module(&self) -> &'static str;
    fn handle(&self, msg: Message, events: &EventBus) -> Result<()>;
}

/// Registry and dispatcher keyed by module name.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<&'static str, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    pub fn register(&self, handler: Arc<dyn Handler>) {
        self.handlers.insert(handler.module(), handler);
    }

    pub fn registered_modules(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|e| *e.key()).collect()
    }

    pub fn dispatch(&self, msg: Message, events: &EventBus) -> Result<()> {
        let module = msg.module;
        let handler = self
            .handlers
            .get(module)
            .ok_or_else(|| PushError::Handler(format!("module {module} is not supported")))?
            .value()
            .clone();
        handler.handle(msg, events)
    }
}

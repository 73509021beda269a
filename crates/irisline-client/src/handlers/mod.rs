//! Module handlers.

mod direct;
mod iris;
mod live;
pub mod patch;
mod presence;
mod region_hint;
mod zero_provision;

use std::sync::Arc;

pub use direct::DirectHandler;
pub use iris::{IrisHandler, IrisState};
pub use live::LiveHandler;
pub use presence::PresenceHandler;
pub use region_hint::RegionHintHandler;
pub use zero_provision::ZeroProvisionHandler;

use crate::dispatch::HandlerRegistry;

/// Registry with every built-in handler. `livewith` stays unhandled.
pub fn default_registry(iris: Arc<IrisState>) -> HandlerRegistry {
    let registry = HandlerRegistry::new();
    registry.register(Arc::new(DirectHandler::new(iris.clone())));
    registry.register(Arc::new(IrisHandler::new(iris)));
    registry.register(Arc::new(LiveHandler));
    registry.register(Arc::new(PresenceHandler));
    registry.register(Arc::new(RegionHintHandler));
    registry.register(Arc::new(ZeroProvisionHandler));
    registry
}

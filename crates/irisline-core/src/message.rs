use serde_json::Value;

/// One decoded application message, routed to a handler by `module`.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Logical subsystem (`direct`, `iris`, `live`, ...).
    pub module: &'static str,
    /// Decoded body.
    pub data: Value,
}

impl Message {
    pub fn new(module: &'static str, data: Value) -> Self {
        Self { module, data }
    }
}

/// Module names shared by parsers and handlers.
pub mod modules {
    pub const DIRECT: &str = "direct";
    pub const IRIS: &str = "iris";
    pub const LIVE: &str = "live";
    pub const LIVEWITH: &str = "livewith";
    pub const PRESENCE: &str = "presence_subscribe";
    pub const REGION_HINT: &str = "region_hint";
    pub const ZERO_PROVISION: &str = "zero_provision";
}

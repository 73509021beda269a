//! Topic path <-> numeric id table.
//!
//! The broker only accepts the short ids once `USE_ENUM_TOPIC` is advertised,
//! and publishes inbound traffic under them. The pairs are bit-exact.

use crate::error::{PushError, Result};

pub const PUBSUB: &str = "/pubsub";
pub const SEND_MESSAGE: &str = "/ig_send_message";
pub const SEND_MESSAGE_RESPONSE: &str = "/ig_send_message_response";
pub const IRIS_SUB: &str = "/ig_sub_iris";
pub const IRIS_SUB_RESPONSE: &str = "/ig_sub_iris_response";
pub const MESSAGE_SYNC: &str = "/ig_message_sync";
pub const REALTIME_SUB: &str = "/ig_realtime_sub";
pub const GRAPHQL: &str = "/graphql";
pub const REGION_HINT: &str = "/t_region_hint";

const TABLE: [(&str, u16); 9] = [
    (PUBSUB, 88),
    (SEND_MESSAGE, 132),
    (SEND_MESSAGE_RESPONSE, 133),
    (IRIS_SUB, 134),
    (IRIS_SUB_RESPONSE, 135),
    (MESSAGE_SYNC, 146),
    (REALTIME_SUB, 149),
    (GRAPHQL, 9),
    (REGION_HINT, 150),
];

/// Static bidirectional topic registry.
pub struct TopicRegistry;

impl TopicRegistry {
    pub fn id_for(path: &str) -> Option<u16> {
        TABLE.iter().find(|(p, _)| *p == path).map(|(_, id)| *id)
    }

    pub fn path_for(id: u16) -> Option<&'static str> {
        TABLE.iter().find(|(_, i)| *i == id).map(|(p, _)| *p)
    }

    /// All known topic paths, in table order.
    pub fn paths() -> impl Iterator<Item = &'static str> {
        TABLE.iter().map(|(p, _)| *p)
    }

    /// Resolve an inbound topic, which may be either the numeric id or the path.
    pub fn resolve_inbound(topic: &str) -> Result<&'static str> {
        if let Ok(id) = topic.parse::<u16>() {
            return Self::path_for(id)
                .ok_or_else(|| PushError::UnknownTopic(format!("topic id {id}")));
        }
        TABLE
            .iter()
            .find(|(p, _)| *p == topic)
            .map(|(p, _)| *p)
            .ok_or_else(|| PushError::UnknownTopic(topic.to_string()))
    }

    /// Topic string to put on the wire for `path`.
    pub fn to_wire(path: &str, enum_topics: bool) -> Result<String> {
        if !enum_topics {
            return Ok(path.to_string());
        }
        Self::id_for(path)
            .map(|id| id.to_string())
            .ok_or_else(|| PushError::UnknownTopic(path.to_string()))
    }
}

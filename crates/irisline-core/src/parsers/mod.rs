//! Payload parsers: `(topic, payload) -> Vec<Message>`.
//!
//! Each inbound topic is bound to exactly one parser. Parsers never touch
//! connection state; a failure only drops the offending packet.

mod envelope;
mod graphql;
mod iris;
mod json;
mod region_hint;
mod skywalker;

use std::collections::HashMap;

use crate::error::{PushError, Result};
use crate::message::{modules, Message};
use crate::protocol::topics;

pub use graphql::GraphQlParser;
pub use iris::IrisParser;
pub use json::JsonParser;
pub use region_hint::RegionHintParser;
pub use skywalker::SkywalkerParser;

/// One inbound payload encoding.
pub trait Parser: Send + Sync {
    fn parse(&self, topic: &str, payload: &[u8]) -> Result<Vec<Message>>;
}

/// Topic path -> parser.
pub struct ParserRegistry {
    parsers: HashMap<&'static str, Box<dyn Parser>>,
}

impl ParserRegistry {
    pub fn empty() -> Self {
        Self { parsers: HashMap::new() }
    }

    pub fn register(&mut self, topic: &'static str, parser: Box<dyn Parser>) {
        self.parsers.insert(topic, parser);
    }

    /// Routing used by the push client.
    pub fn with_default_routes() -> Self {
        let mut r = Self::empty();
        r.register(topics::PUBSUB, Box::new(SkywalkerParser));
        r.register(topics::SEND_MESSAGE_RESPONSE, Box::new(JsonParser::new(modules::DIRECT)));
        r.register(topics::IRIS_SUB_RESPONSE, Box::new(JsonParser::new(modules::IRIS)));
        r.register(topics::MESSAGE_SYNC, Box::new(IrisParser));
        r.register(topics::REALTIME_SUB, Box::new(GraphQlParser));
        r.register(topics::GRAPHQL, Box::new(GraphQlParser));
        r.register(topics::REGION_HINT, Box::new(RegionHintParser));
        r
    }

    pub fn parse(&self, topic: &str, payload: &[u8]) -> Result<Vec<Message>> {
        let parser = self
            .parsers
            .get(topic)
            .ok_or_else(|| PushError::UnknownTopic(format!("no parser for {topic}")))?;
        parser.parse(topic, payload)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_default_routes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_routes_cover_every_inbound_topic() {
        let r = ParserRegistry::with_default_routes();
        let msgs = r
            .parse(topics::IRIS_SUB_RESPONSE, br#"{"succeeded":true,"seq_id":5}"#)
            .unwrap_or_default();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].module, modules::IRIS);

        let msgs = r
            .parse(topics::SEND_MESSAGE_RESPONSE, br#"{"action":"ack"}"#)
            .unwrap_or_default();
        assert_eq!(msgs[0].module, modules::DIRECT);
    }

    #[test]
    fn outbound_only_topics_have_no_parser() {
        let r = ParserRegistry::with_default_routes();
        let err = r.parse(topics::SEND_MESSAGE, b"{}").err();
        assert_eq!(err.map(|e| e.kind().as_str()), Some("UNKNOWN_TOPIC"));
    }
}

use crate::error::{PushError, Result};
use crate::message::{modules, Message};
use crate::protocol::body::api_body_decode;
use crate::subscription::queries;

use super::envelope::read_envelope;
use super::Parser;

/// Query id -> module.
const TOPIC_TO_MODULE: [(&str, &str); 3] = [
    (queries::APP_PRESENCE, modules::PRESENCE),
    (queries::ZERO_PROVISION, modules::ZERO_PROVISION),
    (queries::DIRECT_TYPING, modules::DIRECT),
];

/// Realtime subscription envelope with a binary (string) discriminator.
pub struct GraphQlParser;

impl GraphQlParser {
    pub fn module_for(topic: &str) -> Option<&'static str> {
        TOPIC_TO_MODULE.iter().find(|(t, _)| *t == topic).map(|(_, m)| *m)
    }
}

impl Parser for GraphQlParser {
    fn parse(&self, _topic: &str, payload: &[u8]) -> Result<Vec<Message>> {
        let env = read_envelope(payload);
        let (Some(topic), Some(body)) = (env.topic, env.payload) else {
            return Err(PushError::IncompleteMessage("graphql topic or payload missing".into()));
        };
        let topic = topic
            .as_str()
            .ok_or_else(|| PushError::IncompleteMessage("graphql topic is not a string".into()))?;
        let module = Self::module_for(topic)
            .ok_or_else(|| PushError::UnknownTopic(format!("graphql topic {topic}")))?;
        let data = api_body_decode(&body)?;
        Ok(vec![Message::new(module, data)])
    }
}

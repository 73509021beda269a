use crate::error::{PushError, Result};
use crate::message::{modules, Message};
use crate::protocol::body::api_body_decode;

use super::envelope::read_envelope;
use super::Parser;

/// Discriminator -> module. Closed: anything else is `UnknownTopic`.
const TOPIC_TO_MODULE: [(i64, &str); 3] = [
    (1, modules::DIRECT),
    (2, modules::LIVE),
    (3, modules::LIVEWITH),
];

/// Pubsub envelope with an I32 discriminator.
pub struct SkywalkerParser;

impl SkywalkerParser {
    pub fn module_for(topic: i64) -> Option<&'static str> {
        TOPIC_TO_MODULE.iter().find(|(t, _)| *t == topic).map(|(_, m)| *m)
    }
}

impl Parser for SkywalkerParser {
    fn parse(&self, _topic: &str, payload: &[u8]) -> Result<Vec<Message>> {
        let env = read_envelope(payload);
        let (Some(topic), Some(body)) = (env.topic, env.payload) else {
            return Err(PushError::IncompleteMessage("skywalker topic or payload missing".into()));
        };
        let topic = topic.as_i64().ok_or_else(|| {
            PushError::IncompleteMessage("skywalker topic is not an integer".into())
        })?;
        let module = Self::module_for(topic)
            .ok_or_else(|| PushError::UnknownTopic(format!("skywalker topic {topic}")))?;
        let data = api_body_decode(&body)?;
        Ok(vec![Message::new(module, data)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminator_table_is_closed() {
        assert_eq!(SkywalkerParser::module_for(1), Some("direct"));
        assert_eq!(SkywalkerParser::module_for(2), Some("live"));
        assert_eq!(SkywalkerParser::module_for(3), Some("livewith"));
        assert_eq!(SkywalkerParser::module_for(0), None);
        assert_eq!(SkywalkerParser::module_for(4), None);
    }
}

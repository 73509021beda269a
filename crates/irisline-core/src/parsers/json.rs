use crate::error::Result;
use crate::message::Message;
use crate::protocol::body::api_body_decode;

use super::Parser;

/// Whole payload is one JSON body for a fixed module.
pub struct JsonParser {
    module: &'static str,
}

impl JsonParser {
    pub fn new(module: &'static str) -> Self {
        Self { module }
    }
}

impl Parser for JsonParser {
    fn parse(&self, _topic: &str, payload: &[u8]) -> Result<Vec<Message>> {
        let data = api_body_decode(payload)?;
        Ok(vec![Message::new(self.module, data)])
    }
}

use serde_json::Value;

use crate::error::{PushError, Result};
use crate::message::{modules, Message};
use crate::protocol::body::api_body_decode;

use super::Parser;

/// Message sync batches: a JSON array, one direct update per element, in order.
pub struct IrisParser;

impl Parser for IrisParser {
    fn parse(&self, _topic: &str, payload: &[u8]) -> Result<Vec<Message>> {
        match api_body_decode(payload)? {
            Value::Array(items) => Ok(items
                .into_iter()
                .map(|data| Message::new(modules::DIRECT, data))
                .collect()),
            _ => Err(PushError::InvalidPayload("message sync body is not an array".into())),
        }
    }
}

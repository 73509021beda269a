use bytes::Bytes;
use serde_json::Value;

use crate::error::{PushError, Result};
use crate::message::{modules, Message};
use crate::protocol::fields::FieldReader;

use super::Parser;

const FIELD_REGION: i16 = 1;

/// Region hint: field 1 is the raw region string. No JSON involved.
pub struct RegionHintParser;

impl Parser for RegionHintParser {
    fn parse(&self, _topic: &str, payload: &[u8]) -> Result<Vec<Message>> {
        let mut region: Option<String> = None;
        FieldReader::new(Bytes::copy_from_slice(payload)).read(|path, field, value, _| {
            if path.is_empty() && field == FIELD_REGION {
                region = value.as_str().map(str::to_string);
            }
        });
        let region =
            region.ok_or_else(|| PushError::IncompleteMessage("region hint missing".into()))?;
        Ok(vec![Message::new(modules::REGION_HINT, Value::String(region))])
    }
}

//! Two-field binary envelope shared by the Skywalker and GraphQL encodings:
//! field 1 = topic discriminator, field 2 = opaque payload.

use bytes::Bytes;

use crate::protocol::fields::{FieldReader, FieldValue};

pub(crate) const FIELD_TOPIC: i16 = 1;
pub(crate) const FIELD_PAYLOAD: i16 = 2;

#[derive(Debug, Default)]
pub(crate) struct Envelope {
    pub topic: Option<FieldValue>,
    pub payload: Option<Bytes>,
}

pub(crate) fn read_envelope(payload: &[u8]) -> Envelope {
    let mut env = Envelope::default();
    FieldReader::new(Bytes::copy_from_slice(payload)).read(|path, field, value, _wire| {
        if !path.is_empty() {
            return;
        }
        match field {
            FIELD_TOPIC => env.topic = Some(value),
            FIELD_PAYLOAD => {
                if let FieldValue::Binary(b) = value {
                    env.payload = Some(b);
                }
            }
            _ => {}
        }
    });
    env
}

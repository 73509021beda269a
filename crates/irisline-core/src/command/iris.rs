use serde_json::{Map, Value};

use crate::error::{PushError, Result};
use crate::protocol::topics;
use crate::qos::QosLevel;

use super::Command;

/// Sentinel the server uses for "no sequence yet". Never submitted.
pub const INVALID_SEQUENCE_ID: i64 = -1;

/// (Re)subscribe to the message sync queue from a sequence id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrisSubscribe {
    seq_id: i64,
    snapshot_at_ms: Option<i64>,
}

impl IrisSubscribe {
    pub fn new(seq_id: i64, snapshot_at_ms: Option<i64>) -> Result<Self> {
        if seq_id == INVALID_SEQUENCE_ID {
            return Err(PushError::InvalidArgument("invalid iris sequence id".into()));
        }
        if seq_id < 0 {
            return Err(PushError::InvalidArgument(format!(
                "\"{seq_id}\" is not a valid iris sequence id"
            )));
        }
        Ok(Self { seq_id, snapshot_at_ms })
    }

    pub fn seq_id(&self) -> i64 {
        self.seq_id
    }
}

impl Command for IrisSubscribe {
    fn topic(&self) -> &'static str {
        topics::IRIS_SUB
    }

    fn qos(&self) -> QosLevel {
        QosLevel::AcknowledgedDelivery
    }

    fn to_json(&self) -> Result<String> {
        let mut map = Map::new();
        map.insert("seq_id".into(), Value::from(self.seq_id));
        if let Some(ts) = self.snapshot_at_ms {
            map.insert("snapshot_at_ms".into(), Value::from(ts));
        }
        serde_json::to_string(&Value::Object(map))
            .map_err(|e| PushError::Internal(format!("json encode failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_rejected() {
        let err = IrisSubscribe::new(INVALID_SEQUENCE_ID, None).err();
        assert_eq!(err.map(|e| e.kind().as_str()), Some("INVALID_ARGUMENT"));
    }

    #[test]
    fn body_and_qos() {
        let cmd = IrisSubscribe::new(1234, Some(1_600_000_000_000)).ok();
        let body = cmd.and_then(|c| c.to_json().ok());
        assert_eq!(body.as_deref(), Some(r#"{"seq_id":1234,"snapshot_at_ms":1600000000000}"#));
        let plain = IrisSubscribe::new(5, None).ok();
        assert_eq!(plain.and_then(|c| c.to_json().ok()).as_deref(), Some(r#"{"seq_id":5}"#));
        assert_eq!(plain.map(|c| c.qos()), Some(QosLevel::AcknowledgedDelivery));
    }
}

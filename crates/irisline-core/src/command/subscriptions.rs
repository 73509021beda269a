use serde_json::{Map, Value};

use crate::error::{PushError, Result};
use crate::qos::QosLevel;

use super::Command;

/// 32-bit string hash over UTF-16 units (`h = 31 * h + unit`, wrapping).
/// Subscription lists are ordered by it; the broker expects that order.
pub fn java_string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

fn hash_sorted(mut topics: Vec<String>) -> Vec<String> {
    topics.sort_by_key(|t| java_string_hash(t));
    topics
}

/// Subscribe/unsubscribe request for one broker topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSubscriptions {
    topic: &'static str,
    sub: Vec<String>,
    unsub: Vec<String>,
}

impl UpdateSubscriptions {
    pub fn new(topic: &'static str, sub: Vec<String>, unsub: Vec<String>) -> Result<Self> {
        if sub.is_empty() && unsub.is_empty() {
            return Err(PushError::InvalidArgument(format!(
                "subscription update for {topic} has nothing to (un)subscribe"
            )));
        }
        if let Some(bad) = sub.iter().chain(unsub.iter()).find(|s| s.is_empty()) {
            return Err(PushError::InvalidArgument(format!(
                "\"{bad}\" is not a valid subscription"
            )));
        }
        Ok(Self {
            topic,
            sub: hash_sorted(sub),
            unsub: hash_sorted(unsub),
        })
    }

    pub fn sub(&self) -> &[String] {
        &self.sub
    }

    pub fn unsub(&self) -> &[String] {
        &self.unsub
    }
}

impl Command for UpdateSubscriptions {
    fn topic(&self) -> &'static str {
        self.topic
    }

    fn qos(&self) -> QosLevel {
        QosLevel::AcknowledgedDelivery
    }

    fn to_json(&self) -> Result<String> {
        let mut map = Map::new();
        if !self.sub.is_empty() {
            map.insert("sub".into(), Value::from(self.sub.clone()));
        }
        if !self.unsub.is_empty() {
            map.insert("unsub".into(), Value::from(self.unsub.clone()));
        }
        serde_json::to_string(&Value::Object(map))
            .map_err(|e| PushError::Internal(format!("json encode failed: {e}")))
    }
}

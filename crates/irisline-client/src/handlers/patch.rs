//! Patch batches and path templates shared by the direct and live handlers.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use irisline_core::error::{PushError, Result};
use irisline_core::protocol::body::decode_as;

use crate::types::opt_i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
    Notify,
}

impl PatchOp {
    pub fn parse(op: &str) -> Result<Self> {
        match op {
            "add" => Ok(PatchOp::Add),
            "replace" => Ok(PatchOp::Replace),
            "remove" => Ok(PatchOp::Remove),
            "notify" => Ok(PatchOp::Notify),
            other => Err(PushError::Handler(format!("unknown patch op \"{other}\""))),
        }
    }
}

/// One incremental mutation of server-side inbox state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PatchEventOp {
    pub op: String,
    pub path: String,
    /// JSON text; occasionally delivered already decoded.
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub ts: Option<i64>,
}

impl PatchEventOp {
    pub fn value_text(&self) -> String {
        match &self.value {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// Decode `value` into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        decode_as(self.value_text().as_bytes()).map_err(|e| {
            PushError::Handler(format!("cannot decode value at {} ({}): {e}", self.path, self.op))
        })
    }
}

/// `{"event":"patch","data":[..]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PatchEvent {
    #[serde(default)]
    pub data: Vec<PatchEventOp>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub seq_id: Option<i64>,
}

impl PatchEvent {
    pub fn from_value(data: Value) -> Result<Self> {
        serde_json::from_value(data)
            .map_err(|e| PushError::Handler(format!("malformed patch event: {e}")))
    }
}

/// Identifiers captured by a [`PathTemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures<'p> {
    pairs: Vec<(&'static str, &'p str)>,
}

impl<'p> Captures<'p> {
    pub fn get(&self, name: &str) -> Result<String> {
        self.pairs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.to_string())
            .ok_or_else(|| PushError::Internal(format!("template has no {{{name}}} segment")))
    }
}

/// Anchored segment pattern: literal segments match exactly, `{name}`
/// captures one non-empty segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathTemplate(pub &'static str);

impl PathTemplate {
    pub fn capture<'p>(&self, path: &'p str) -> Option<Captures<'p>> {
        let mut want = self.0.split('/');
        let mut got = path.split('/');
        let mut pairs = Vec::new();
        loop {
            match (want.next(), got.next()) {
                (None, None) => return Some(Captures { pairs }),
                (Some(w), Some(g)) => {
                    match w.strip_prefix('{').and_then(|w| w.strip_suffix('}')) {
                        Some(name) if !g.is_empty() => pairs.push((name, g)),
                        Some(_) => return None,
                        None if w == g => {}
                        None => return None,
                    }
                }
                _ => return None,
            }
        }
    }

    pub fn require<'p>(&self, path: &'p str) -> Result<Captures<'p>> {
        self.capture(path)
            .ok_or_else(|| PushError::Handler(format!("path {path} does not match {}", self.0)))
    }
}

pub const THREAD: PathTemplate = PathTemplate("/direct_v2/inbox/threads/{thread_id}");
pub const ITEM: PathTemplate = PathTemplate("/direct_v2/threads/{thread_id}/items/{item_id}");
pub const ACTIVITY: PathTemplate =
    PathTemplate("/direct_v2/threads/{thread_id}/activity_indicator_id/{context}");
pub const STORY: PathTemplate =
    PathTemplate("/direct_v2/visual_threads/{thread_id}/items/{item_id}");
pub const SEEN: PathTemplate =
    PathTemplate("/direct_v2/threads/{thread_id}/participants/{user_id}/has_seen");
pub const SCREENSHOT: PathTemplate =
    PathTemplate("/direct_v2/visual_thread/{thread_id}/screenshot");
pub const BADGE: PathTemplate = PathTemplate("/direct_v2/visual_action_badge/{thread_id}");
pub const VISUAL_THREAD: PathTemplate = PathTemplate("/direct_v2/visual_thread/{thread_id}");

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn templates_are_anchored() {
        let c = ITEM.capture("/direct_v2/threads/T/items/I");
        assert_eq!(c.as_ref().and_then(|c| c.get("thread_id").ok()).as_deref(), Some("T"));
        assert_eq!(c.and_then(|c| c.get("item_id").ok()).as_deref(), Some("I"));

        assert!(ITEM.capture("/direct_v2/threads/T/items/I/extra").is_none());
        assert!(ITEM.capture("/direct_v2/threads/T/items").is_none());
        assert!(ITEM.capture("/direct_v2/threads//items/I").is_none());
        assert!(VISUAL_THREAD.capture("/direct_v2/visual_thread/T/screenshot").is_none());
        assert!(SCREENSHOT.capture("/direct_v2/visual_thread/T/screenshot").is_some());
    }

    #[test]
    fn op_values_decode_from_text_or_json() {
        let op: PatchEventOp = serde_json::from_str(
            r#"{"op":"add","path":"/x","value":"{\"text\":\"hi\"}","ts":"1600000000000"}"#,
        )
        .unwrap();
        assert_eq!(op.ts, Some(1_600_000_000_000));
        assert_eq!(op.value_text(), r#"{"text":"hi"}"#);

        let err = PatchOp::parse("upsert").err();
        assert_eq!(
            err.map(|e| e.to_string()),
            Some("handler error: unknown patch op \"upsert\"".into())
        );
    }
}

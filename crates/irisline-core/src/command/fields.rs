use serde_json::{Map, Value};

use crate::error::{PushError, Result};

/// Emission order of direct command keys. Part of the wire contract.
const FIELD_WEIGHTS: [(&str, u32); 14] = [
    ("thread_id", 10),
    ("item_type", 15),
    ("text", 20),
    ("client_context", 25),
    ("activity_status", 30),
    ("reaction_type", 35),
    ("reaction_status", 40),
    ("item_id", 45),
    ("node_type", 50),
    ("action", 55),
    ("profile_user_id", 60),
    ("hashtag", 65),
    ("venue_id", 70),
    ("media_id", 75),
];

/// Weight of a key; unknown keys sort after every weighted key.
pub fn field_weight(key: &str) -> u32 {
    FIELD_WEIGHTS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, w)| *w)
        .unwrap_or(u32::MAX)
}

/// String fields of a direct command. Insertion order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandFields {
    entries: Vec<(String, String)>,
}

impl CommandFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Entries in wire order (weight, then name).
    pub fn ordered(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        out.sort_by(|a, b| field_weight(a.0).cmp(&field_weight(b.0)).then_with(|| a.0.cmp(b.0)));
        out
    }

    pub fn to_json(&self) -> Result<String> {
        let mut map = Map::new();
        for (k, v) in self.ordered() {
            map.insert(k.to_string(), Value::String(v.to_string()));
        }
        serde_json::to_string(&Value::Object(map))
            .map_err(|e| PushError::Internal(format!("json encode failed: {e}")))
    }
}

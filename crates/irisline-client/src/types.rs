//! Typed payload records decoded from patch values and module bodies.
//!
//! Unknown keys are ignored; a missing required key is a decode error.
//! Identifiers arrive as either JSON strings or numbers and are normalized
//! to strings.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrInt {
    Str(String),
    Int(i64),
}

impl StrOrInt {
    fn into_string(self) -> String {
        match self {
            StrOrInt::Str(s) => s,
            StrOrInt::Int(i) => i.to_string(),
        }
    }
}

pub(crate) fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<StrOrInt>::deserialize(d)?.map(StrOrInt::into_string))
}

pub(crate) fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    StrOrInt::deserialize(d).map(StrOrInt::into_string)
}

pub(crate) fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    match Option::<StrOrInt>::deserialize(d)? {
        None => Ok(None),
        Some(StrOrInt::Int(i)) => Ok(Some(i)),
        Some(StrOrInt::Str(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("\"{s}\" is not an integer"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThreadUser {
    #[serde(deserialize_with = "id")]
    pub pk: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectThread {
    #[serde(default, deserialize_with = "opt_id")]
    pub thread_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub thread_v2_id: Option<String>,
    #[serde(default)]
    pub thread_title: Option<String>,
    #[serde(default)]
    pub users: Vec<ThreadUser>,
    #[serde(default)]
    pub muted: Option<bool>,
    #[serde(default)]
    pub is_group: Option<bool>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub last_activity_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectThreadItem {
    #[serde(default, deserialize_with = "opt_id")]
    pub item_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub client_context: Option<String>,
}

/// Typing indicator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThreadActivity {
    #[serde(deserialize_with = "id")]
    pub activity_status: String,
    #[serde(default, deserialize_with = "opt_id")]
    pub sender_id: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub ttl: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeenPayload {
    #[serde(default, deserialize_with = "opt_id")]
    pub item_id: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnseenCount {
    pub count: i64,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThreadNotify {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionBadge {
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub action_count: Option<i64>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub action_timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoryScreenshot {
    #[serde(default)]
    pub action_user_dict: Option<ThreadUser>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub media_type: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AckPayload {
    #[serde(default)]
    pub client_context: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub item_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id")]
    pub thread_id: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub timestamp: Option<i64>,
}

/// Server acknowledgement of a send; correlates via `client_context`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AckAction {
    pub status: String,
    #[serde(default, deserialize_with = "opt_id")]
    pub status_code: Option<String>,
    #[serde(default)]
    pub payload: Option<AckPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IrisSubscribeAck {
    pub succeeded: bool,
    #[serde(default, deserialize_with = "opt_i64")]
    pub seq_id: Option<i64>,
    #[serde(default, deserialize_with = "opt_id")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LiveBroadcast {
    #[serde(deserialize_with = "id")]
    pub broadcast_id: String,
    #[serde(default)]
    pub user: Option<ThreadUser>,
    #[serde(default)]
    pub broadcast_message: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub published_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserPresence {
    #[serde(deserialize_with = "id")]
    pub user_id: String,
    pub is_active: bool,
    #[serde(default, deserialize_with = "opt_i64")]
    pub last_activity_at_ms: Option<i64>,
    #[serde(default)]
    pub in_threads: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZeroProvisionEvent {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub zero_provisioned_time: Option<i64>,
}

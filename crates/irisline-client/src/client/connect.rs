//! Connect packet assembly.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

use irisline_core::subscription::queries;

use crate::auth::AuthProvider;
use crate::config::ClientConfig;
use crate::transport::ConnectParams;

const APP_ID: &str = "567067343352427";

/// GraphQL subscriptions the broker attaches to the session on connect.
const EVERCLEAR_SUBSCRIPTIONS: [(&str, &str); 4] = [
    ("inapp_notification_subscribe_comment", "17899377895239777"),
    ("inapp_notification_subscribe_comment_mention_and_reply", "17899377895239777"),
    ("video_call_participant_state_delivery", "17977239895057311"),
    ("presence_subscribe", queries::APP_PRESENCE),
];

fn everclear_subscriptions() -> String {
    let map: serde_json::Map<String, Value> = EVERCLEAR_SUBSCRIPTIONS
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    Value::Object(map).to_string()
}

/// Numeric ids go out as numbers, anything else verbatim.
fn user_id_value(user_id: &str) -> Value {
    user_id.parse::<u64>().map(Value::from).unwrap_or_else(|_| Value::from(user_id))
}

fn session_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64 & 0x7fff_ffff)
        .unwrap_or(0)
}

pub(crate) fn connect_params(cfg: &ClientConfig, auth: &dyn AuthProvider) -> ConnectParams {
    let session = &cfg.session;
    let user_agent = session.user_agent();
    let username = json!({
        "u": user_id_value(&auth.user_id()),
        "s": session_id(),
        "cp": session.capabilities().bits(),
        "ecp": session.endpoint_capabilities,
        "chat_on": true,
        "fg": false,
        "d": auth.device_id(),
        "ct": auth.client_type(),
        "mqtt_sid": "",
        "aid": APP_ID,
        "st": session.subscribe_topic_ids(),
        "pm": [],
        "dc": "",
        "no_auto_fg": true,
        "a": user_agent,
        "app_specific_info": {
            "platform": session.platform,
            "app_version": session.app_version,
            "capabilities": session.capabilities().bits().to_string(),
            "everclear_subscriptions": everclear_subscriptions(),
            "User-Agent": user_agent,
            "Accept-Language": session.accept_language,
            "ig_mqtt_route": "django",
        }
    });

    ConnectParams {
        host: cfg.connection.host.clone(),
        port: cfg.connection.port,
        client_id: auth.client_id(),
        username: username.to_string(),
        password: auth.password(),
        keepalive: cfg.connection.keepalive(),
        clean_session: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticAuth;

    #[test]
    fn username_blob_carries_session_fields() {
        let cfg = ClientConfig::default();
        let auth = StaticAuth::new("25025320", "sessionid=abc", "android-0123456789abcdef0123");
        let params = connect_params(&cfg, &auth);
        assert_eq!(params.client_id, "android-0123456789ab");
        assert_eq!(params.password, "sessionid=abc");
        assert_eq!(params.port, 443);

        let blob: Value = serde_json::from_str(&params.username).unwrap_or(Value::Null);
        assert_eq!(blob["u"], json!(25025320u64));
        assert_eq!(blob["cp"], json!(439));
        assert_eq!(blob["st"], json!([88, 135, 149, 150, 133, 146]));
        assert_eq!(blob["d"], json!("android-0123456789abcdef0123"));
        let everclear = blob["app_specific_info"]["everclear_subscriptions"].as_str().unwrap_or("");
        assert!(everclear.contains("\"presence_subscribe\":\"17846944882223835\""));
    }
}

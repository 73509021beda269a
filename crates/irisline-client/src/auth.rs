//! Credentials consumed at connect time. The client never persists them.

use serde::{Deserialize, Serialize};

use irisline_core::error::{PushError, Result};

pub trait AuthProvider: Send + Sync {
    fn user_id(&self) -> String;
    fn password(&self) -> String;
    fn device_id(&self) -> String;
    fn device_secret(&self) -> String;
    fn client_type(&self) -> String;

    /// First 20 characters of the device id.
    fn client_id(&self) -> String {
        self.device_id().chars().take(20).collect()
    }

    /// Opaque form suitable for the application's own credential store.
    fn serialize_state(&self) -> Result<String>;
}

/// Fixed credentials, typically restored from a settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticAuth {
    pub user_id: String,
    pub password: String,
    pub device_id: String,
    #[serde(default)]
    pub device_secret: String,
    #[serde(default = "default_client_type")]
    pub client_type: String,
}

fn default_client_type() -> String {
    "cookie_auth".into()
}

impl StaticAuth {
    pub fn new(
        user_id: impl Into<String>,
        password: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            password: password.into(),
            device_id: device_id.into(),
            device_secret: String::new(),
            client_type: default_client_type(),
        }
    }

    pub fn from_state(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| PushError::Config(format!("invalid credentials: {e}")))
    }
}

impl AuthProvider for StaticAuth {
    fn user_id(&self) -> String {
        self.user_id.clone()
    }

    fn password(&self) -> String {
        self.password.clone()
    }

    fn device_id(&self) -> String {
        self.device_id.clone()
    }

    fn device_secret(&self) -> String {
        self.device_secret.clone()
    }

    fn client_type(&self) -> String {
        self.client_type.clone()
    }

    fn serialize_state(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| PushError::Internal(format!("json encode failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_is_device_prefix_and_serialization_survives() {
        let auth = StaticAuth::new("25025320", "sessionid=abc", "android-0123456789abcdef0123");
        assert_eq!(auth.client_id(), "android-0123456789ab");
        let restored = auth.serialize_state().and_then(|s| StaticAuth::from_state(&s)).ok();
        assert_eq!(restored, Some(auth));
    }
}

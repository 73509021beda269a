use std::time::Duration;

use serde::Deserialize;

use irisline_core::error::{PushError, Result};
use irisline_core::protocol::capabilities::Capabilities;
use irisline_core::protocol::topics::{self, TopicRegistry};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub connection: ConnectionSection,

    #[serde(default)]
    pub reconnect: ReconnectSection,

    #[serde(default)]
    pub session: SessionSection,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PushError::Config(format!("unsupported config version {}", self.version)));
        }
        self.connection.validate()?;
        self.reconnect.validate()?;
        self.session.validate()?;
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            connection: ConnectionSection::default(),
            reconnect: ReconnectSection::default(),
            session: SessionSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    #[serde(default = "default_true")]
    pub compress_payloads: bool,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            keepalive_secs: default_keepalive_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            outbound_queue: default_outbound_queue(),
            compress_payloads: true,
        }
    }
}

impl ConnectionSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(PushError::Config("connection.host must not be empty".into()));
        }
        if !(10..=900).contains(&self.keepalive_secs) {
            return Err(PushError::Config(
                "connection.keepalive_secs must be between 10 and 900".into(),
            ));
        }
        if !(1..=120).contains(&self.connect_timeout_secs) {
            return Err(PushError::Config(
                "connection.connect_timeout_secs must be between 1 and 120".into(),
            ));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(PushError::Config(
                "connection.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_host() -> String {
    "edge-mqtt.facebook.com".into()
}
fn default_port() -> u16 {
    443
}
fn default_keepalive_secs() -> u64 {
    60
}
fn default_connect_timeout_secs() -> u64 {
    20
}
fn default_outbound_queue() -> usize {
    1024
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectSection {
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,

    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval_secs(),
            max_interval_secs: default_max_interval_secs(),
        }
    }
}

impl ReconnectSection {
    pub fn validate(&self) -> Result<()> {
        if self.min_interval_secs < 1 {
            return Err(PushError::Config("reconnect.min_interval_secs must be at least 1".into()));
        }
        if self.max_interval_secs < self.min_interval_secs {
            return Err(PushError::Config(
                "reconnect.max_interval_secs must not be below min_interval_secs".into(),
            ));
        }
        Ok(())
    }
}

fn default_min_interval_secs() -> u64 {
    1
}
fn default_max_interval_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    /// Overrides the advertised capability mask.
    #[serde(default)]
    pub capabilities: Option<u64>,

    #[serde(default)]
    pub endpoint_capabilities: u64,

    #[serde(default = "default_app_version")]
    pub app_version: String,

    /// Derived from `app_version` and `platform` when unset.
    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    #[serde(default = "default_platform")]
    pub platform: String,

    #[serde(default = "default_subscribe_topics")]
    pub subscribe_topics: Vec<String>,

    #[serde(default = "default_true")]
    pub enable_presence: bool,

    #[serde(default = "default_true")]
    pub enable_typing: bool,

    #[serde(default)]
    pub enable_zero_provision: bool,

    #[serde(default = "default_true")]
    pub enable_live: bool,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            capabilities: None,
            endpoint_capabilities: 0,
            app_version: default_app_version(),
            user_agent: None,
            accept_language: default_accept_language(),
            platform: default_platform(),
            subscribe_topics: default_subscribe_topics(),
            enable_presence: true,
            enable_typing: true,
            enable_zero_provision: false,
            enable_live: true,
        }
    }
}

impl SessionSection {
    pub fn validate(&self) -> Result<()> {
        if self.app_version.trim().is_empty() {
            return Err(PushError::Config("session.app_version must not be empty".into()));
        }
        if self.subscribe_topics.is_empty() {
            return Err(PushError::Config("session.subscribe_topics must not be empty".into()));
        }
        if let Some(bad) = self
            .subscribe_topics
            .iter()
            .find(|t| TopicRegistry::id_for(t).is_none())
        {
            return Err(PushError::Config(format!("session.subscribe_topics: unknown topic {bad}")));
        }
        Ok(())
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities.map(Capabilities::from_bits).unwrap_or_default()
    }

    pub fn user_agent(&self) -> String {
        match &self.user_agent {
            Some(ua) => ua.clone(),
            None => format!(
                "Instagram {} {} ({})",
                self.app_version, self.platform, self.accept_language
            ),
        }
    }

    /// Numeric ids of the topics subscribed at connect time.
    pub fn subscribe_topic_ids(&self) -> Vec<u16> {
        self.subscribe_topics
            .iter()
            .filter_map(|t| TopicRegistry::id_for(t))
            .collect()
    }
}

fn default_app_version() -> String {
    "222.0.0.13.114".into()
}
fn default_accept_language() -> String {
    "en-US".into()
}
fn default_platform() -> String {
    "android".into()
}
fn default_subscribe_topics() -> Vec<String> {
    [
        topics::PUBSUB,
        topics::IRIS_SUB_RESPONSE,
        topics::REALTIME_SUB,
        topics::REGION_HINT,
        topics::SEND_MESSAGE_RESPONSE,
        topics::MESSAGE_SYNC,
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

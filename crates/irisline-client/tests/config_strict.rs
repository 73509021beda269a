#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use irisline_client::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
connection:
  host: "edge-mqtt.facebook.com"
  keepalive_sec: 30 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.connection.host, "edge-mqtt.facebook.com");
    assert_eq!(cfg.connection.port, 443);
    assert_eq!(cfg.connection.keepalive_secs, 60);
    assert!(cfg.connection.compress_payloads);
    assert_eq!(cfg.reconnect.min_interval_secs, 1);
    assert_eq!(cfg.reconnect.max_interval_secs, 300);
    assert_eq!(cfg.session.capabilities().bits(), 439);
    assert!(cfg.session.enable_presence);
    assert!(!cfg.session.enable_zero_provision);
    assert_eq!(cfg.session.subscribe_topic_ids(), vec![88, 135, 149, 150, 133, 146]);
}

#[test]
fn version_and_ranges_are_enforced() {
    let cases = [
        "version: 2\n",
        "version: 1\nconnection:\n  keepalive_secs: 5\n",
        "version: 1\nconnection:\n  connect_timeout_secs: 0\n",
        "version: 1\nconnection:\n  outbound_queue: 0\n",
        "version: 1\nreconnect:\n  min_interval_secs: 10\n  max_interval_secs: 5\n",
        "version: 1\nreconnect:\n  min_interval_secs: 0\n",
        "version: 1\nsession:\n  subscribe_topics: [\"/nope\"]\n",
    ];
    for yaml in cases {
        let err = config::load_from_str(yaml).expect_err(yaml);
        assert_eq!(err.kind().as_str(), "CONFIG", "{yaml}");
    }
}

#[test]
fn session_overrides() {
    let yaml = r#"
version: 1
session:
  capabilities: 0
  user_agent: "Custom UA"
  subscribe_topics: ["/ig_message_sync", "/pubsub"]
"#;
    let cfg = config::load_from_str(yaml).expect("must parse");
    assert_eq!(cfg.session.capabilities().bits(), 0);
    assert_eq!(cfg.session.user_agent(), "Custom UA");
    assert_eq!(cfg.session.subscribe_topic_ids(), vec![146, 88]);
}

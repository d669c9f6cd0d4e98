use std::collections::BTreeSet;
use std::sync::Arc;

use super::{JoinAttributes, SessionManager};
use crate::broker::{Event, TopicKey, TopicRegistry};
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

fn setup() -> (Arc<TopicRegistry>, SessionManager) {
    let registry = Arc::new(TopicRegistry::new());
    let manager = SessionManager::new(registry.clone());
    (registry, manager)
}

fn attrs(role: Option<&str>, driver: Option<&str>, teacher: Option<&str>) -> JoinAttributes {
    JoinAttributes {
        role: role.map(str::to_string),
        driver_id: driver.map(str::to_string),
        class_teacher_id: teacher.map(str::to_string),
        global: false,
    }
}

#[test]
fn test_connect_allocates_session_without_topics() {
    let (registry, manager) = setup();
    let (tx, _rx) = mpsc::unbounded_channel::<WsMessage>();
    let session = manager.connect(tx);

    assert!(session.id().starts_with("session-"));
    assert_eq!(session.topics().count(), 0);
    assert_eq!(registry.session_count(), 1);
}

#[test]
fn test_join_subscribes_to_each_present_attribute() {
    let (registry, manager) = setup();
    let (tx, _rx) = mpsc::unbounded_channel::<WsMessage>();
    let mut session = manager.connect(tx);

    let topics = session.join(&attrs(Some("student"), Some("D123"), Some("T7")));

    let expected: BTreeSet<TopicKey> = [
        TopicKey::role("student"),
        TopicKey::class("T7"),
        TopicKey::trip("D123"),
    ]
    .into_iter()
    .collect();
    assert_eq!(topics.into_iter().collect::<BTreeSet<_>>(), expected);
    for topic in &expected {
        assert_eq!(registry.members(topic), vec![session.id().clone()]);
    }
}

#[test]
fn test_join_is_additive_and_idempotent() {
    let (_registry, manager) = setup();
    let (tx, _rx) = mpsc::unbounded_channel::<WsMessage>();
    let mut session = manager.connect(tx);

    session.join(&attrs(Some("driver"), None, None));
    session.join(&attrs(Some("driver"), Some("D1"), None));
    let topics = session.join(&attrs(None, Some("D1"), None));

    assert_eq!(topics, vec![TopicKey::role("driver"), TopicKey::trip("D1")]);
}

#[test]
fn test_blank_attributes_are_ignored() {
    let (_registry, manager) = setup();
    let (tx, _rx) = mpsc::unbounded_channel::<WsMessage>();
    let mut session = manager.connect(tx);

    let topics = session.join(&attrs(Some("  "), Some(""), None));
    assert!(topics.is_empty());
}

#[test]
fn test_global_flag_joins_global_topic() {
    let attributes = JoinAttributes {
        role: Some("admin".to_string()),
        global: true,
        ..JoinAttributes::default()
    };
    assert_eq!(
        attributes.topics(),
        vec![TopicKey::role("admin"), TopicKey::Global]
    );
}

#[test]
fn test_drop_prunes_memberships() {
    let (registry, manager) = setup();
    let (tx, _rx) = mpsc::unbounded_channel::<WsMessage>();
    let mut session = manager.connect(tx);
    session.join(&attrs(Some("student"), Some("D5"), None));

    session.disconnect();

    assert_eq!(registry.session_count(), 0);
    assert!(registry.members(&TopicKey::role("student")).is_empty());
    assert!(registry.members(&TopicKey::trip("D5")).is_empty());
}

#[test]
fn test_reconnect_does_not_inherit_old_memberships() {
    let (registry, manager) = setup();
    let (tx, _rx) = mpsc::unbounded_channel::<WsMessage>();
    let mut first = manager.connect(tx.clone());
    first.join(&attrs(None, Some("D5"), None));
    drop(first);

    let second = manager.connect(tx);
    assert_eq!(second.topics().count(), 0);
    assert!(registry.members(&TopicKey::trip("D5")).is_empty());
}

#[test]
fn test_reply_reaches_only_this_session() {
    let (_registry, manager) = setup();
    let (tx_a, mut rx_a) = mpsc::unbounded_channel::<WsMessage>();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel::<WsMessage>();
    let session_a = manager.connect(tx_a);
    let _session_b = manager.connect(tx_b);

    session_a.reply(&Event::FleetLocation {
        driver_id: "D1".to_string(),
        lat: 0.0,
        lng: 0.0,
    });

    assert!(rx_a.try_recv().is_ok());
    assert!(rx_b.try_recv().is_err());
}

#[test]
fn test_join_attributes_wire_format() {
    let parsed: JoinAttributes =
        serde_json::from_str(r#"{"role":"student","driverId":"D1","classTeacherId":"T1"}"#)
            .unwrap();
    assert_eq!(parsed, attrs(Some("student"), Some("D1"), Some("T1")));
}

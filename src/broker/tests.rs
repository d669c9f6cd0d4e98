use super::TopicRegistry;
use super::message::{AlertKind, Event};
use super::topic::{Topic, TopicKey};
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

fn recv_event(rx: &mut mpsc::UnboundedReceiver<WsMessage>) -> Event {
    match rx.try_recv().expect("expected a frame") {
        WsMessage::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("Expected a text message, got {other:?}"),
    }
}

fn notice(title: &str) -> Event {
    Event::Notice {
        title: title.to_string(),
        message: "body".to_string(),
        sender: "admin".to_string(),
        timestamp: 0,
    }
}

#[test]
fn test_topic_key_wire_names() {
    assert_eq!(TopicKey::role("student").to_string(), "role-student");
    assert_eq!(TopicKey::class("T1").to_string(), "class-T1");
    assert_eq!(TopicKey::trip("D123").to_string(), "trip-D123");
    assert_eq!(TopicKey::Global.to_string(), "global");
}

#[test]
fn test_topic_subscribe_is_set_like() {
    let mut topic = Topic::new(TopicKey::Global);
    assert!(topic.subscribe("s1".to_string()));
    assert!(!topic.subscribe("s1".to_string()));
    assert_eq!(topic.subscribers.len(), 1);
    assert!(topic.unsubscribe(&"s1".to_string()));
    assert!(topic.is_empty());
}

#[test]
fn test_registry_subscribe_and_members() {
    let registry = TopicRegistry::new();
    registry.subscribe(TopicKey::trip("D1"), "s2".to_string());
    registry.subscribe(TopicKey::trip("D1"), "s1".to_string());

    assert_eq!(registry.members(&TopicKey::trip("D1")), vec!["s1", "s2"]);
    assert!(registry.members(&TopicKey::trip("D2")).is_empty());
}

#[test]
fn test_unsubscribe_drops_empty_topic() {
    let registry = TopicRegistry::new();
    registry.subscribe(TopicKey::Global, "s1".to_string());
    assert!(registry.unsubscribe(&TopicKey::Global, &"s1".to_string()));
    assert!(!registry.unsubscribe(&TopicKey::Global, &"s1".to_string()));
    assert!(registry.members(&TopicKey::Global).is_empty());
}

#[test]
fn test_publish_reaches_only_topic_members() {
    let registry = TopicRegistry::new();
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    registry.register_session("a".to_string(), tx_a);
    registry.register_session("b".to_string(), tx_b);
    registry.subscribe(TopicKey::role("teacher"), "a".to_string());
    registry.subscribe(TopicKey::role("student"), "b".to_string());

    let delivered = registry.publish(&TopicKey::role("teacher"), &notice("Staff meeting"));

    assert_eq!(delivered, 1);
    assert_eq!(recv_event(&mut rx_a), notice("Staff meeting"));
    assert!(rx_b.try_recv().is_err());
}

#[test]
fn test_publish_to_topic_without_subscribers() {
    let registry = TopicRegistry::new();
    assert_eq!(registry.publish(&TopicKey::Global, &notice("nobody")), 0);
}

#[test]
fn test_publish_skips_closed_channel() {
    let registry = TopicRegistry::new();
    let (tx_dead, rx_dead) = mpsc::unbounded_channel();
    let (tx_live, mut rx_live) = mpsc::unbounded_channel();
    registry.register_session("dead".to_string(), tx_dead);
    registry.register_session("live".to_string(), tx_live);
    registry.subscribe(TopicKey::Global, "dead".to_string());
    registry.subscribe(TopicKey::Global, "live".to_string());
    drop(rx_dead);

    assert_eq!(registry.publish(&TopicKey::Global, &notice("hi")), 1);
    assert_eq!(recv_event(&mut rx_live), notice("hi"));
}

#[test]
fn test_remove_session_prunes_every_topic() {
    let registry = TopicRegistry::new();
    let (tx, _rx) = mpsc::unbounded_channel();
    registry.register_session("s1".to_string(), tx);
    registry.subscribe(TopicKey::role("driver"), "s1".to_string());
    registry.subscribe(TopicKey::trip("D1"), "s1".to_string());
    registry.subscribe(TopicKey::trip("D1"), "s2".to_string());

    registry.remove_session(&"s1".to_string());

    assert_eq!(registry.session_count(), 0);
    assert!(registry.members(&TopicKey::role("driver")).is_empty());
    assert_eq!(registry.members(&TopicKey::trip("D1")), vec!["s2"]);
}

#[test]
fn test_alert_event_wire_format() {
    let event = Event::AlertBroadcast {
        driver_id: "D9".to_string(),
        kind: AlertKind::Emergency,
        message: "Flat tyre".to_string(),
        lat: 1.0,
        lng: 2.0,
        timestamp: 42,
    };
    let json: serde_json::Value = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "alertBroadcast");
    assert_eq!(json["driverId"], "D9");
    assert_eq!(json["kind"], "emergency");
    assert_eq!(json["timestamp"], 42);
}

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::{SessionId, TopicKey, TopicRegistry};

/// Identity attributes supplied by a client in its `join` frame.
///
/// Blank strings are treated the same as absent attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinAttributes {
    pub role: Option<String>,
    pub driver_id: Option<String>,
    pub class_teacher_id: Option<String>,
    /// Opt in to the global topic (fleet map, emergency alerts, `all` notices).
    #[serde(default)]
    pub global: bool,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl JoinAttributes {
    /// The topics these attributes map to.
    pub fn topics(&self) -> Vec<TopicKey> {
        let mut topics = Vec::new();
        if let Some(role) = present(&self.role) {
            topics.push(TopicKey::role(role));
        }
        if let Some(teacher) = present(&self.class_teacher_id) {
            topics.push(TopicKey::class(teacher));
        }
        if let Some(driver) = present(&self.driver_id) {
            topics.push(TopicKey::trip(driver));
        }
        if self.global {
            topics.push(TopicKey::Global);
        }
        topics
    }
}

/// Creates sessions bound to a shared registry.
#[derive(Debug, Clone)]
pub struct SessionManager {
    registry: Arc<TopicRegistry>,
}

impl SessionManager {
    pub fn new(registry: Arc<TopicRegistry>) -> Self {
        Self { registry }
    }

    /// Allocates a session with no topic memberships and registers its
    /// outbound channel.
    pub fn connect(&self, sender: UnboundedSender<WsMessage>) -> Session {
        let id = format!("session-{}", uuid::Uuid::new_v4());
        self.registry.register_session(id.clone(), sender.clone());
        info!(session = %id, "session connected");

        Session {
            id,
            sender,
            registry: self.registry.clone(),
            topics: BTreeSet::new(),
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.registry.session_count()
    }
}

/// One live connection.
///
/// Dropping a `Session` is the only way it leaves its topics, so a
/// disconnected session can never linger in a subscriber set.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    sender: UnboundedSender<WsMessage>,
    registry: Arc<TopicRegistry>,
    topics: BTreeSet<TopicKey>,
}

impl Session {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Subscribes the session to the topics derived from `attributes`.
    ///
    /// Repeated calls are additive. Returns the complete membership after the
    /// call.
    pub fn join(&mut self, attributes: &JoinAttributes) -> Vec<TopicKey> {
        for topic in attributes.topics() {
            if self.registry.subscribe(topic.clone(), self.id.clone()) {
                debug!(session = %self.id, topic = %topic, "subscribed");
            }
            self.topics.insert(topic);
        }
        self.topics.iter().cloned().collect()
    }

    pub fn topics(&self) -> impl Iterator<Item = &TopicKey> {
        self.topics.iter()
    }

    /// Sends a frame to this session only.
    pub fn reply<T: Serialize>(&self, message: &T) {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Err(e) = self.sender.send(WsMessage::text(json)) {
                    warn!(session = %self.id, error = %e, "failed to enqueue reply");
                }
            }
            Err(e) => warn!(session = %self.id, error = %e, "failed to serialize reply"),
        }
    }

    pub fn disconnect(self) {}
}

impl Drop for Session {
    fn drop(&mut self) {
        self.registry.remove_session(&self.id);
        info!(session = %self.id, topics = self.topics.len(), "session disconnected");
    }
}

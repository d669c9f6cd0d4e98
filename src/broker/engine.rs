//! Topic registry
//!
//! This module contains the in-memory registry responsible for:
//! - tracking the outbound channel of every connected session
//! - managing topics and their subscriber sets
//! - fanning an event out to every current subscriber of a topic
//!
//! Concurrency and usage notes:
//! - The registry is shared as `Arc<TopicRegistry>` and guards its state with
//!   a `RwLock`. `publish` and `members` take the read side; subscribe,
//!   unsubscribe and session teardown take the write side.
//! - The lock is never held across an `.await`. Delivery only enqueues onto
//!   unbounded channels, so `publish` never suspends.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::topic::{SessionId, Topic, TopicKey};

#[derive(Debug, Default)]
struct Inner {
    topics: HashMap<TopicKey, Topic>,
    sessions: HashMap<SessionId, UnboundedSender<WsMessage>>,
}

#[derive(Debug, Default)]
pub struct TopicRegistry {
    inner: RwLock<Inner>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the outbound channel for a newly connected session.
    pub fn register_session(&self, id: SessionId, sender: UnboundedSender<WsMessage>) {
        self.write().sessions.insert(id, sender);
    }

    /// Drops the session's channel and removes it from every topic. Topics
    /// left without subscribers are removed as well.
    pub fn remove_session(&self, id: &SessionId) {
        let mut inner = self.write();
        inner.sessions.remove(id);

        inner.topics.retain(|key, topic| {
            if topic.unsubscribe(id) {
                debug!(session = %id, topic = %key, "unsubscribed");
            }
            !topic.is_empty()
        });
    }

    pub fn session_count(&self) -> usize {
        self.read().sessions.len()
    }

    /// Subscribes a session to a topic, creating the topic on first use.
    /// Returns false if the session was already a member.
    pub fn subscribe(&self, topic: TopicKey, session: SessionId) -> bool {
        self.write()
            .topics
            .entry(topic.clone())
            .or_insert_with(|| Topic::new(topic))
            .subscribe(session)
    }

    pub fn unsubscribe(&self, topic: &TopicKey, session: &SessionId) -> bool {
        let mut inner = self.write();
        let Some(t) = inner.topics.get_mut(topic) else {
            return false;
        };
        let removed = t.unsubscribe(session);
        if t.is_empty() {
            inner.topics.remove(topic);
        }
        removed
    }

    /// Current subscribers of a topic, sorted for stable output.
    pub fn members(&self, topic: &TopicKey) -> Vec<SessionId> {
        let mut members: Vec<SessionId> = self
            .read()
            .topics
            .get(topic)
            .map(|t| t.subscribers.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    /// Enqueues `event` for every current subscriber of `topic` and returns how
    /// many channels accepted it.
    ///
    /// The event is serialized once. A subscriber whose channel has closed is
    /// skipped; its teardown will remove it shortly.
    pub fn publish<E: Serialize>(&self, topic: &TopicKey, event: &E) -> usize {
        let text = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                error!(topic = %topic, error = %e, "failed to serialize event");
                return 0;
            }
        };
        let ws_msg = WsMessage::text(text);

        let inner = self.read();
        let Some(t) = inner.topics.get(topic) else {
            debug!(topic = %topic, "no subscribers");
            return 0;
        };

        let mut delivered = 0;
        for sub_id in &t.subscribers {
            match inner.sessions.get(sub_id) {
                Some(sender) => match sender.send(ws_msg.clone()) {
                    Ok(()) => delivered += 1,
                    Err(e) => warn!(session = %sub_id, error = %e, "failed to enqueue event"),
                },
                None => warn!(session = %sub_id, topic = %topic, "no session registered"),
            }
        }
        delivered
    }
}

use std::collections::HashSet;
use std::fmt;

pub type SessionId = String;

/// Identifies a fan-out destination.
///
/// The wire name (`Display`) is what clients see in the `joined` reply:
/// `role-<role>`, `class-<teacher>`, `trip-<driver>` or `global`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TopicKey {
    Role(String),
    Class(String),
    Trip(String),
    Global,
}

impl TopicKey {
    pub fn role(role: impl Into<String>) -> Self {
        Self::Role(role.into())
    }

    pub fn class(teacher_id: impl Into<String>) -> Self {
        Self::Class(teacher_id.into())
    }

    pub fn trip(driver_id: impl Into<String>) -> Self {
        Self::Trip(driver_id.into())
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicKey::Role(role) => write!(f, "role-{role}"),
            TopicKey::Class(teacher) => write!(f, "class-{teacher}"),
            TopicKey::Trip(driver) => write!(f, "trip-{driver}"),
            TopicKey::Global => f.write_str("global"),
        }
    }
}

/// A topic and the sessions currently subscribed to it.
#[derive(Debug)]
pub struct Topic {
    pub key: TopicKey,
    pub subscribers: HashSet<SessionId>,
}

impl Topic {
    pub fn new(key: TopicKey) -> Self {
        Self {
            key,
            subscribers: HashSet::new(),
        }
    }

    /// Adds the session. Subscribing twice has no effect.
    pub fn subscribe(&mut self, id: SessionId) -> bool {
        self.subscribers.insert(id)
    }

    pub fn unsubscribe(&mut self, id: &SessionId) -> bool {
        self.subscribers.remove(id)
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

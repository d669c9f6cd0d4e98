//! The `broker` module is the topic registry: the only shared mutable state on
//! the live delivery path.
//!
//! - `topic`: topic keys and per-topic subscriber sets
//! - `engine`: `TopicRegistry`, which maps topics to sessions and fans events out
//! - `message`: the outbound `Event` frames

pub mod engine;
pub mod message;
pub mod topic;

pub use engine::TopicRegistry;
pub use message::{AlertKind, Event};
pub use topic::{SessionId, TopicKey};

#[cfg(test)]
mod tests;

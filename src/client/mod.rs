//! The `client` module is the session manager.
//!
//! Each live WebSocket connection owns exactly one `Session`. A session is
//! registered with the topic registry when it is created, joins topics from the
//! attributes the client supplies, and is removed from every topic when it is
//! dropped.

pub mod session;
pub use session::{JoinAttributes, Session, SessionManager};

#[cfg(test)]
mod tests;

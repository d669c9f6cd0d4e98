//! The `transport` module is responsible for handling network communication
//! with clients via WebSockets.
//!
//! It defines the socket protocol and implements the server itself: accepting
//! connections, parsing frames and routing them to the relay's dispatchers.

pub mod message;
pub mod websocket;
